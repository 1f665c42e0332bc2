use crate::error::{CliError, Result};
use matselect::core::models::objective::ObjectiveSpec;
use matselect::core::models::requirement::FlatValue;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileNormalizationConfig {
    pub missing_penalty: Option<f64>,
    pub min_confidence: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileStabilityConfig {
    /// `linear`, `exponential` or `none`.
    pub curve: Option<String>,
    /// Cutoff of the linear curve or scale of the exponential one, in eV/atom.
    pub cutoff: Option<f64>,
    pub floor: Option<f64>,
    pub highly_stable_threshold: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileExplanationConfig {
    pub comfortable_margin: Option<f64>,
    pub max_tradeoffs: Option<usize>,
    pub lightweight_density: Option<f64>,
}

/// The `--config` TOML file. Every section and key is optional.
///
/// ```toml
/// optimize = ["weight", "cost"]
/// top-n = 10
///
/// [requirements]
/// max_density = 3.0
/// corrosion_resistance = "good"
///
/// [weights]
/// weight = 2.0
///
/// [[objectives]]
/// name = "toughness"
/// direction = "maximize"
/// properties = ["fracture_toughness"]
/// ```
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub top_n: Option<usize>,
    pub exploration_size: Option<usize>,
    pub optimize: Option<Vec<String>>,
    pub weights: Option<BTreeMap<String, f64>>,
    pub requirements: Option<BTreeMap<String, FlatValue>>,
    pub objectives: Option<Vec<ObjectiveSpec>>,
    pub normalization: Option<FileNormalizationConfig>,
    pub stability: Option<FileStabilityConfig>,
    pub explanation: Option<FileExplanationConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
