use super::candidate::{Candidate, STABILITY_PROPERTY};
use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Invalid objective '{objective}': {reason}")]
pub struct ObjectiveError {
    pub objective: String,
    pub reason: String,
}

impl ObjectiveError {
    pub(crate) fn new(objective: &str, reason: impl Into<String>) -> Self {
        Self {
            objective: objective.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Minimize,
    Maximize,
}

/// How several underlying properties are folded into one raw objective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Combination {
    #[default]
    Mean,
    Sum,
    Min,
    Max,
}

impl Combination {
    fn combine(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let combined = match self {
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Self::Sum => values.iter().sum(),
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Some(combined)
    }
}

struct Preset {
    direction: Direction,
    properties: &'static [&'static str],
    combination: Combination,
}

static PRESETS: Map<&'static str, Preset> = phf_map! {
    "weight" => Preset {
        direction: Direction::Minimize,
        properties: &["density"],
        combination: Combination::Mean,
    },
    "cost" => Preset {
        direction: Direction::Minimize,
        properties: &["cost_per_kg"],
        combination: Combination::Mean,
    },
    "strength" => Preset {
        direction: Direction::Maximize,
        properties: &["strength"],
        combination: Combination::Mean,
    },
    "stiffness" => Preset {
        direction: Direction::Maximize,
        properties: &["youngs_modulus"],
        combination: Combination::Mean,
    },
    "stability" => Preset {
        direction: Direction::Minimize,
        properties: &[STABILITY_PROPERTY],
        combination: Combination::Mean,
    },
    "tco" => Preset {
        direction: Direction::Minimize,
        properties: &["material_cost", "processing_cost", "lifecycle_cost"],
        combination: Combination::Sum,
    },
};

/// The raw (un-normalized) value of an objective for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    Present(f64),
    /// At least one feeding property has no value.
    Missing,
    /// A feeding property is a prediction below the confidence threshold.
    LowConfidence,
}

impl RawValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Present(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObjectiveSpec {
    pub name: String,
    pub direction: Direction,
    pub properties: Vec<String>,
    #[serde(default)]
    pub combination: Combination,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl ObjectiveSpec {
    pub fn new(name: &str, direction: Direction, property: &str) -> Self {
        Self {
            name: name.to_string(),
            direction,
            properties: vec![property.to_string()],
            combination: Combination::default(),
            weight: default_weight(),
        }
    }

    pub fn minimize(name: &str, property: &str) -> Self {
        Self::new(name, Direction::Minimize, property)
    }

    pub fn maximize(name: &str, property: &str) -> Self {
        Self::new(name, Direction::Maximize, property)
    }

    pub fn combined(
        name: &str,
        direction: Direction,
        properties: &[&str],
        combination: Combination,
    ) -> Self {
        Self {
            name: name.to_string(),
            direction,
            properties: properties.iter().map(|p| p.to_string()).collect(),
            combination,
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Built-in objective by name: weight, cost, strength, stiffness, stability or tco.
    pub fn preset(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase();
        PRESETS.get(key.as_str()).map(|p| Self {
            name: key.clone(),
            direction: p.direction,
            properties: p.properties.iter().map(|s| s.to_string()).collect(),
            combination: p.combination,
            weight: default_weight(),
        })
    }

    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        PRESETS.keys().copied()
    }

    pub fn raw_value(&self, candidate: &Candidate, min_confidence: f64) -> RawValue {
        let mut values = Vec::with_capacity(self.properties.len());
        for property in &self.properties {
            match candidate.measurement(property) {
                None => return RawValue::Missing,
                Some(m) if m.is_low_confidence(min_confidence) => return RawValue::LowConfidence,
                Some(m) => values.push(m.value),
            }
        }
        self.combination
            .combine(&values)
            .map_or(RawValue::Missing, RawValue::Present)
    }

    pub fn validate(&self) -> Result<(), ObjectiveError> {
        if self.name.trim().is_empty() {
            return Err(ObjectiveError::new(&self.name, "name is empty"));
        }
        if self.properties.is_empty() {
            return Err(ObjectiveError::new(
                &self.name,
                "no underlying property is mapped",
            ));
        }
        if self.properties.iter().any(|p| p.trim().is_empty()) {
            return Err(ObjectiveError::new(&self.name, "empty property name"));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ObjectiveError::new(
                &self.name,
                format!("weight {} must be finite and non-negative", self.weight),
            ));
        }
        Ok(())
    }
}

/// Validates a list of objectives as a whole: unique names and a positive total weight.
pub fn validate_objectives(objectives: &[ObjectiveSpec]) -> Result<(), ObjectiveError> {
    let mut names = HashSet::new();
    for objective in objectives {
        objective.validate()?;
        if !names.insert(objective.name.as_str()) {
            return Err(ObjectiveError::new(&objective.name, "duplicate objective"));
        }
    }
    if !objectives.is_empty() && objectives.iter().all(|o| o.weight == 0.0) {
        let names: Vec<_> = objectives.iter().map(|o| o.name.as_str()).collect();
        return Err(ObjectiveError::new(
            &names.join(", "),
            "all objective weights are zero",
        ));
    }
    Ok(())
}
