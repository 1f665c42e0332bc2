use super::candidate::Candidate;
use super::category::CategoryScale;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_EQUALS_TOLERANCE: f64 = 1e-9;
pub const ELEMENTS_KEY: &str = "elements";

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Invalid requirement on '{property}': {reason}")]
pub struct RequirementError {
    pub property: String,
    pub reason: String,
}

impl RequirementError {
    fn new(property: &str, reason: impl Into<String>) -> Self {
        Self {
            property: property.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operator {
    Min,
    Max,
    Equals,
    Category,
    Elements,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Equals => "equals",
            Self::Category => "category",
            Self::Elements => "elements",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", rename_all = "kebab-case")]
pub enum Constraint {
    Min {
        threshold: f64,
    },
    Max {
        threshold: f64,
    },
    Equals {
        value: f64,
        tolerance: f64,
    },
    AtLeastTier {
        tier: String,
        #[serde(default)]
        scale: CategoryScale,
    },
    IncludesElements {
        elements: BTreeSet<String>,
    },
}

impl Constraint {
    pub fn operator(&self) -> Operator {
        match self {
            Self::Min { .. } => Operator::Min,
            Self::Max { .. } => Operator::Max,
            Self::Equals { .. } => Operator::Equals,
            Self::AtLeastTier { .. } => Operator::Category,
            Self::IncludesElements { .. } => Operator::Elements,
        }
    }
}

/// Why a candidate failed a requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FailureReason {
    MissingValue,
    BelowMinimum { value: f64, threshold: f64 },
    AboveMaximum { value: f64, threshold: f64 },
    NotEqual { value: f64, expected: f64 },
    TierTooLow { tier: String, required: String },
    UnknownTier { tier: String },
    MissingElements { missing: Vec<String> },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue => write!(f, "no data"),
            Self::BelowMinimum { value, threshold } => {
                write!(f, "{value} is below the minimum of {threshold}")
            }
            Self::AboveMaximum { value, threshold } => {
                write!(f, "{value} is above the maximum of {threshold}")
            }
            Self::NotEqual { value, expected } => write!(f, "{value} is not {expected}"),
            Self::TierTooLow { tier, required } => {
                write!(f, "tier '{tier}' is below the required '{required}'")
            }
            Self::UnknownTier { tier } => write!(f, "tier '{tier}' is not on the scale"),
            Self::MissingElements { missing } => {
                write!(f, "composition lacks {}", missing.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub property: String,
    #[serde(flatten)]
    pub constraint: Constraint,
}

impl Requirement {
    pub fn new(property: &str, constraint: Constraint) -> Self {
        Self {
            property: property.to_string(),
            constraint,
        }
    }

    pub fn operator(&self) -> Operator {
        self.constraint.operator()
    }

    /// Checks the candidate against this requirement. Missing data always fails.
    pub fn evaluate(&self, candidate: &Candidate) -> Result<(), FailureReason> {
        match &self.constraint {
            Constraint::Min { threshold } => {
                let value = self.numeric_value(candidate)?;
                if value >= *threshold {
                    Ok(())
                } else {
                    Err(FailureReason::BelowMinimum {
                        value,
                        threshold: *threshold,
                    })
                }
            }
            Constraint::Max { threshold } => {
                let value = self.numeric_value(candidate)?;
                if value <= *threshold {
                    Ok(())
                } else {
                    Err(FailureReason::AboveMaximum {
                        value,
                        threshold: *threshold,
                    })
                }
            }
            Constraint::Equals { value: expected, tolerance } => {
                let value = self.numeric_value(candidate)?;
                if (value - expected).abs() <= *tolerance {
                    Ok(())
                } else {
                    Err(FailureReason::NotEqual {
                        value,
                        expected: *expected,
                    })
                }
            }
            Constraint::AtLeastTier { tier: required, scale } => {
                let tier = candidate
                    .category(&self.property)
                    .ok_or(FailureReason::MissingValue)?;
                let rank = scale.rank(tier).ok_or_else(|| FailureReason::UnknownTier {
                    tier: tier.to_string(),
                })?;
                let required_rank =
                    scale
                        .rank(required)
                        .ok_or_else(|| FailureReason::UnknownTier {
                            tier: required.clone(),
                        })?;
                if rank >= required_rank {
                    Ok(())
                } else {
                    Err(FailureReason::TierTooLow {
                        tier: tier.to_string(),
                        required: required.clone(),
                    })
                }
            }
            Constraint::IncludesElements { elements } => {
                let present = candidate
                    .elements
                    .as_ref()
                    .ok_or(FailureReason::MissingValue)?;
                let missing: Vec<String> = elements.difference(present).cloned().collect();
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(FailureReason::MissingElements { missing })
                }
            }
        }
    }

    /// Relative distance by which `value` clears a min or max bound, as a fraction of the
    /// threshold. `None` for other operators or a zero threshold.
    pub fn relative_margin(&self, value: f64) -> Option<f64> {
        match self.constraint {
            Constraint::Min { threshold } if threshold != 0.0 => {
                Some((value - threshold) / threshold.abs())
            }
            Constraint::Max { threshold } if threshold != 0.0 => {
                Some((threshold - value) / threshold.abs())
            }
            _ => None,
        }
    }

    fn numeric_value(&self, candidate: &Candidate) -> Result<f64, FailureReason> {
        candidate
            .measurement(&self.property)
            .map(|m| m.value)
            .ok_or(FailureReason::MissingValue)
    }

    fn validate(&self) -> Result<(), RequirementError> {
        if self.property.trim().is_empty() {
            return Err(RequirementError::new(
                &self.property,
                "property name is empty",
            ));
        }
        match &self.constraint {
            Constraint::Min { threshold } | Constraint::Max { threshold } => {
                if !threshold.is_finite() {
                    return Err(RequirementError::new(
                        &self.property,
                        format!("{} threshold must be finite", self.operator()),
                    ));
                }
            }
            Constraint::Equals { value, tolerance } => {
                if !value.is_finite() || !tolerance.is_finite() || *tolerance < 0.0 {
                    return Err(RequirementError::new(
                        &self.property,
                        "equals requires a finite value and a non-negative tolerance",
                    ));
                }
            }
            Constraint::AtLeastTier { tier, scale } => {
                if scale.rank(tier).is_none() {
                    return Err(RequirementError::new(
                        &self.property,
                        format!("tier '{tier}' is not on the category scale"),
                    ));
                }
            }
            Constraint::IncludesElements { elements } => {
                if elements.is_empty() {
                    return Err(RequirementError::new(
                        &self.property,
                        "element list is empty",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A value in a loosely-typed requirement dictionary such as
/// `{ max_density = 3.0, corrosion_resistance = "Good", elements = ["Fe"] }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementSet {
    requirements: Vec<Requirement>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn min(self, property: &str, threshold: f64) -> Self {
        self.with(Requirement::new(property, Constraint::Min { threshold }))
    }

    pub fn max(self, property: &str, threshold: f64) -> Self {
        self.with(Requirement::new(property, Constraint::Max { threshold }))
    }

    pub fn equals(self, property: &str, value: f64) -> Self {
        self.with(Requirement::new(
            property,
            Constraint::Equals {
                value,
                tolerance: DEFAULT_EQUALS_TOLERANCE,
            },
        ))
    }

    pub fn at_least_tier(self, property: &str, tier: &str) -> Self {
        self.with(Requirement::new(
            property,
            Constraint::AtLeastTier {
                tier: tier.to_string(),
                scale: CategoryScale::Standard,
            },
        ))
    }

    pub fn includes_elements<I, S>(self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Requirement::new(
            ELEMENTS_KEY,
            Constraint::IncludesElements {
                elements: elements.into_iter().map(Into::into).collect(),
            },
        ))
    }

    /// Parses the dictionary style used by the original selection interface.
    ///
    /// `min_<p>`/`max_<p>` become bounds on `<p>`, a bare number becomes an equality,
    /// a bare string a category threshold on the standard scale and `elements` an
    /// element-inclusion requirement. The result is not yet validated.
    pub fn from_flat<I, K>(entries: I) -> Result<Self, RequirementError>
    where
        I: IntoIterator<Item = (K, FlatValue)>,
        K: AsRef<str>,
    {
        let mut set = Self::new();
        for (key, value) in entries {
            let key = key.as_ref().trim();
            set = match (key, value) {
                (ELEMENTS_KEY, FlatValue::List(symbols)) => set.includes_elements(symbols),
                (ELEMENTS_KEY, FlatValue::Text(symbols)) => set.includes_elements(
                    symbols
                        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                ),
                (key, FlatValue::Number(threshold)) => {
                    if let Some(property) = key.strip_prefix("min_") {
                        set.min(non_empty(property, key)?, threshold)
                    } else if let Some(property) = key.strip_prefix("max_") {
                        set.max(non_empty(property, key)?, threshold)
                    } else {
                        set.equals(key, threshold)
                    }
                }
                (key, FlatValue::Text(tier)) => {
                    if key.starts_with("min_") || key.starts_with("max_") {
                        return Err(RequirementError::new(
                            key,
                            format!("bound expects a number, got '{tier}'"),
                        ));
                    }
                    set.at_least_tier(key, &tier)
                }
                (key, FlatValue::List(_)) => {
                    return Err(RequirementError::new(
                        key,
                        "lists are only accepted for 'elements'",
                    ));
                }
            };
        }
        Ok(set)
    }

    /// Rejects malformed or self-contradictory sets before any candidate is examined.
    pub fn validate(&self) -> Result<(), RequirementError> {
        let mut seen: HashMap<(&str, Operator), &Requirement> = HashMap::new();
        for requirement in &self.requirements {
            requirement.validate()?;
            let key = (requirement.property.as_str(), requirement.operator());
            if seen.insert(key, requirement).is_some() {
                return Err(RequirementError::new(
                    &requirement.property,
                    format!("duplicate {} requirement", requirement.operator()),
                ));
            }
        }

        for requirement in &self.requirements {
            let property = requirement.property.as_str();
            let bound = |op| {
                seen.get(&(property, op)).and_then(|r| match r.constraint {
                    Constraint::Min { threshold } | Constraint::Max { threshold } => {
                        Some(threshold)
                    }
                    _ => None,
                })
            };
            let (min, max) = (bound(Operator::Min), bound(Operator::Max));
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(RequirementError::new(
                        property,
                        format!("minimum {min} exceeds maximum {max}"),
                    ));
                }
            }
            if let Constraint::Equals { value, tolerance } = requirement.constraint {
                let below_min = min.is_some_and(|min| value + tolerance < min);
                let above_max = max.is_some_and(|max| value - tolerance > max);
                if below_min || above_max {
                    return Err(RequirementError::new(
                        property,
                        format!("required value {value} lies outside its own bounds"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// The first requirement the candidate fails, in declaration order.
    pub fn first_failure(&self, candidate: &Candidate) -> Option<(&Requirement, FailureReason)> {
        self.requirements
            .iter()
            .find_map(|r| r.evaluate(candidate).err().map(|reason| (r, reason)))
    }

    pub fn is_satisfied_by(&self, candidate: &Candidate) -> bool {
        self.first_failure(candidate).is_none()
    }

    pub fn for_property<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a Requirement> {
        self.requirements
            .iter()
            .filter(move |r| r.property == property)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Requirement> {
        self.requirements.iter()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl<'a> IntoIterator for &'a RequirementSet {
    type Item = &'a Requirement;
    type IntoIter = std::slice::Iter<'a, Requirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.requirements.iter()
    }
}

fn non_empty<'a>(property: &'a str, key: &str) -> Result<&'a str, RequirementError> {
    if property.is_empty() {
        Err(RequirementError::new(key, "bound has no property name"))
    } else {
        Ok(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::property::PropertyVector;

    fn candidate(props: PropertyVector) -> Candidate {
        Candidate::new("mp-1", "Test", props)
    }

    #[test]
    fn min_and_max_bounds_are_inclusive() {
        let c = candidate(PropertyVector::builder().numeric("density", 3.0).build());
        let set = RequirementSet::new()
            .min("density", 3.0)
            .max("density", 3.0);
        assert!(set.is_satisfied_by(&c));
    }

    #[test]
    fn equality_holds_within_tolerance_only() {
        let set = RequirementSet::new().equals("band_gap", 1.1);
        let close = candidate(
            PropertyVector::builder()
                .numeric("band_gap", 1.1 + DEFAULT_EQUALS_TOLERANCE / 2.0)
                .build(),
        );
        assert!(set.is_satisfied_by(&close));

        let far = candidate(PropertyVector::builder().numeric("band_gap", 1.3).build());
        let (requirement, reason) = set.first_failure(&far).unwrap();
        assert_eq!(requirement.operator(), Operator::Equals);
        assert_eq!(
            reason,
            FailureReason::NotEqual {
                value: 1.3,
                expected: 1.1
            }
        );
    }

    #[test]
    fn missing_value_fails_closed() {
        let c = candidate(PropertyVector::builder().missing("strength").build());
        let set = RequirementSet::new().min("strength", 100.0);
        let (_, reason) = set.first_failure(&c).unwrap();
        assert_eq!(reason, FailureReason::MissingValue);

        let absent = candidate(PropertyVector::default());
        assert!(!set.is_satisfied_by(&absent));
    }

    #[test]
    fn category_threshold_respects_scale_order() {
        let good = candidate(
            PropertyVector::builder()
                .category("corrosion_resistance", "Good")
                .build(),
        );
        assert!(
            RequirementSet::new()
                .at_least_tier("corrosion_resistance", "Good")
                .is_satisfied_by(&good)
        );
        assert!(
            RequirementSet::new()
                .at_least_tier("corrosion_resistance", "Fair")
                .is_satisfied_by(&good)
        );
        let (_, reason) = RequirementSet::new()
            .at_least_tier("corrosion_resistance", "Excellent")
            .first_failure(&good)
            .unwrap();
        assert!(matches!(reason, FailureReason::TierTooLow { .. }));
    }

    #[test]
    fn unknown_candidate_tier_fails() {
        let odd = candidate(
            PropertyVector::builder()
                .category("corrosion_resistance", "Superb")
                .build(),
        );
        let (_, reason) = RequirementSet::new()
            .at_least_tier("corrosion_resistance", "Poor")
            .first_failure(&odd)
            .unwrap();
        assert_eq!(
            reason,
            FailureReason::UnknownTier {
                tier: "Superb".to_string()
            }
        );
    }

    #[test]
    fn numeric_requirement_on_category_value_fails() {
        let c = candidate(PropertyVector::builder().category("strength", "high").build());
        assert!(!RequirementSet::new().min("strength", 1.0).is_satisfied_by(&c));
    }

    #[test]
    fn element_requirement_needs_known_composition() {
        let unknown = candidate(PropertyVector::default());
        let set = RequirementSet::new().includes_elements(["Fe", "O"]);
        assert_eq!(
            set.first_failure(&unknown).map(|(_, r)| r),
            Some(FailureReason::MissingValue)
        );

        let hematite = candidate(PropertyVector::default()).with_elements(["Fe", "O"]);
        assert!(set.is_satisfied_by(&hematite));

        let iron = candidate(PropertyVector::default()).with_elements(["Fe"]);
        assert_eq!(
            set.first_failure(&iron).map(|(_, r)| r),
            Some(FailureReason::MissingElements {
                missing: vec!["O".to_string()]
            })
        );
    }

    #[test]
    fn validate_rejects_min_above_max() {
        let set = RequirementSet::new()
            .min("strength", 500.0)
            .max("strength", 100.0);
        let err = set.validate().unwrap_err();
        assert_eq!(err.property, "strength");
        assert!(err.reason.contains("exceeds"));
    }

    #[test]
    fn validate_rejects_duplicate_keys() {
        let set = RequirementSet::new()
            .max("density", 3.0)
            .max("density", 4.0);
        assert!(set.validate().unwrap_err().reason.contains("duplicate"));
    }

    #[test]
    fn validate_rejects_equality_outside_bounds() {
        let set = RequirementSet::new()
            .min("band_gap", 1.0)
            .equals("band_gap", 0.5);
        assert!(set.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_requirement_tier_and_non_finite_bounds() {
        assert!(
            RequirementSet::new()
                .at_least_tier("corrosion_resistance", "Legendary")
                .validate()
                .is_err()
        );
        assert!(
            RequirementSet::new()
                .max("density", f64::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn validate_accepts_consistent_set() {
        let set = RequirementSet::new()
            .max("density", 3.0)
            .min("band_gap", 0.0)
            .max("band_gap", 0.5)
            .at_least_tier("corrosion_resistance", "Good");
        assert!(set.validate().is_ok());
    }

    #[test]
    fn from_flat_maps_dictionary_keys() {
        let set = RequirementSet::from_flat([
            ("max_density", FlatValue::Number(3.0)),
            ("min_band_gap", FlatValue::Number(0.0)),
            ("corrosion_resistance", FlatValue::Text("Good".to_string())),
            ("elements", FlatValue::Text("Al, Mg".to_string())),
            ("melting_point", FlatValue::Number(933.0)),
        ])
        .unwrap();

        let ops: Vec<_> = set
            .iter()
            .map(|r| (r.property.as_str(), r.operator()))
            .collect();
        assert_eq!(
            ops,
            vec![
                ("density", Operator::Max),
                ("band_gap", Operator::Min),
                ("corrosion_resistance", Operator::Category),
                ("elements", Operator::Elements),
                ("melting_point", Operator::Equals),
            ]
        );
    }

    #[test]
    fn from_flat_rejects_text_bounds_and_stray_lists() {
        assert!(
            RequirementSet::from_flat([("max_density", FlatValue::Text("low".to_string()))])
                .is_err()
        );
        assert!(
            RequirementSet::from_flat([("density", FlatValue::List(vec!["x".to_string()]))])
                .is_err()
        );
        assert!(RequirementSet::from_flat([("min_", FlatValue::Number(1.0))]).is_err());
    }

    #[test]
    fn relative_margin_is_measured_from_the_threshold() {
        let min = Requirement::new("strength", Constraint::Min { threshold: 100.0 });
        assert!((min.relative_margin(150.0).unwrap() - 0.5).abs() < 1e-12);
        let max = Requirement::new("density", Constraint::Max { threshold: 4.0 });
        assert!((max.relative_margin(3.0).unwrap() - 0.25).abs() < 1e-12);
        let zero = Requirement::new("band_gap", Constraint::Min { threshold: 0.0 });
        assert_eq!(zero.relative_margin(1.0), None);
    }
}
