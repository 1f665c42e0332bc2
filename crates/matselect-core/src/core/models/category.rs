use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};

static STANDARD_TIER_RANKS: Map<&'static str, usize> = phf_map! {
    "poor" => 0,
    "fair" => 1,
    "good" => 2,
    "very good" => 3,
    "excellent" => 4,
};

/// An ordered scale of category tiers, lowest first.
///
/// A candidate satisfies a tier threshold when its own tier ranks at or above it, so
/// "Good" satisfies a "Fair" or "Good" threshold but not "Excellent". Tier names are
/// compared case-insensitively with `_`, `-` and repeated spaces folded to one space.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryScale {
    /// poor < fair < good < very good < excellent
    #[default]
    Standard,
    Custom(Vec<String>),
}

impl CategoryScale {
    pub fn custom<I, S>(tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Custom(
            tiers
                .into_iter()
                .map(|t| canonical_tier(t.as_ref()))
                .collect(),
        )
    }

    pub fn rank(&self, tier: &str) -> Option<usize> {
        let key = canonical_tier(tier);
        match self {
            Self::Standard => STANDARD_TIER_RANKS.get(key.as_str()).copied(),
            Self::Custom(tiers) => tiers.iter().position(|t| canonical_tier(t) == key),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Standard => STANDARD_TIER_RANKS.len(),
            Self::Custom(tiers) => tiers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn canonical_tier(tier: &str) -> String {
    tier.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
