use crate::core::models::objective::{ObjectiveError, ObjectiveSpec};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationConfig {
    /// Score assigned to a candidate whose objective data is missing. 0.0 is worst case.
    pub missing_penalty: f64,
    /// Predictions with a confidence below this are scored as missing.
    pub min_confidence: f64,
}

/// Shape of the multiplier applied to the aggregate score from energy above hull.
///
/// Every curve is monotonically non-increasing in `energy_above_hull`, equals 1.0 for a
/// stable material and never drops below its `floor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StabilityCurve {
    None,
    Linear { cutoff: f64, floor: f64 },
    Exponential { scale: f64, floor: f64 },
}

impl StabilityCurve {
    pub fn multiplier(&self, energy_above_hull: f64) -> f64 {
        if !energy_above_hull.is_finite() {
            return f64::NAN;
        }
        let e = energy_above_hull.max(0.0);
        match *self {
            Self::None => 1.0,
            Self::Linear { cutoff, floor } => {
                let fraction = (e / cutoff).min(1.0);
                1.0 - (1.0 - floor) * fraction
            }
            Self::Exponential { scale, floor } => floor + (1.0 - floor) * (-e / scale).exp(),
        }
    }

    /// Energy above hull beyond which a material is flagged as metastable.
    pub fn cutoff(&self) -> Option<f64> {
        match *self {
            Self::None => None,
            Self::Linear { cutoff, .. } => Some(cutoff),
            Self::Exponential { scale, .. } => Some(scale),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let (width, floor) = match *self {
            Self::None => return Ok(()),
            Self::Linear { cutoff, floor } => (cutoff, floor),
            Self::Exponential { scale, floor } => (scale, floor),
        };
        if !width.is_finite() || width <= 0.0 {
            return Err(invalid(
                "stability.curve",
                format!("cutoff/scale must be positive, got {width}"),
            ));
        }
        if !(0.0..=1.0).contains(&floor) {
            return Err(invalid(
                "stability.floor",
                format!("must lie in [0, 1], got {floor}"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StabilityConfig {
    pub curve: StabilityCurve,
    /// Energy above hull (eV/atom) under which a material is described as highly stable.
    pub highly_stable_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationConfig {
    /// Fractional margin past a bound that counts as comfortable (0.2 = 20%).
    pub comfortable_margin: f64,
    pub max_tradeoffs: usize,
    /// Density (g/cm³) under which a material is described as lightweight.
    pub lightweight_density: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub normalization: NormalizationConfig,
    pub stability: StabilityConfig,
    pub explanation: ExplanationConfig,
    pub objective_weights: BTreeMap<String, f64>,
    pub default_top_n: usize,
    pub exploration_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationConfig {
                missing_penalty: 0.0,
                min_confidence: 0.5,
            },
            stability: StabilityConfig {
                curve: StabilityCurve::Linear {
                    cutoff: 0.1,
                    floor: 0.5,
                },
                highly_stable_threshold: 0.02,
            },
            explanation: ExplanationConfig {
                comfortable_margin: 0.2,
                max_tradeoffs: 2,
                lightweight_density: 5.0,
            },
            objective_weights: BTreeMap::new(),
            default_top_n: 5,
            exploration_size: 20,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let penalty = self.normalization.missing_penalty;
        if !(0.0..=1.0).contains(&penalty) {
            return Err(invalid(
                "normalization.missing_penalty",
                format!("must lie in [0, 1], got {penalty}"),
            ));
        }
        let confidence = self.normalization.min_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(invalid(
                "normalization.min_confidence",
                format!("must lie in [0, 1], got {confidence}"),
            ));
        }
        self.stability.curve.validate()?;
        let threshold = self.stability.highly_stable_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid(
                "stability.highly_stable_threshold",
                format!("must be finite and non-negative, got {threshold}"),
            ));
        }
        let margin = self.explanation.comfortable_margin;
        if !margin.is_finite() || margin < 0.0 {
            return Err(invalid(
                "explanation.comfortable_margin",
                format!("must be finite and non-negative, got {margin}"),
            ));
        }
        if !self.explanation.lightweight_density.is_finite() {
            return Err(invalid("explanation.lightweight_density", "must be finite"));
        }
        for (name, weight) in &self.objective_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(invalid(
                    "objective_weights",
                    format!("weight for '{name}' must be finite and non-negative, got {weight}"),
                ));
            }
        }
        if self.default_top_n == 0 {
            return Err(invalid("default_top_n", "must be at least 1"));
        }
        if self.exploration_size == 0 {
            return Err(invalid("exploration_size", "must be at least 1"));
        }
        Ok(())
    }

    /// Resolves a preset objective by name, weighted with the configured default weight.
    pub fn objective(&self, name: &str) -> Result<ObjectiveSpec, ObjectiveError> {
        let spec = ObjectiveSpec::preset(name).ok_or_else(|| {
            let known: Vec<_> = ObjectiveSpec::preset_names().collect();
            ObjectiveError::new(
                name,
                format!("unknown objective, expected one of: {}", known.join(", ")),
            )
        })?;
        let weight = self.objective_weights.get(&spec.name).copied().unwrap_or(1.0);
        Ok(spec.with_weight(weight))
    }
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    missing_penalty: Option<f64>,
    min_confidence: Option<f64>,
    stability_curve: Option<StabilityCurve>,
    highly_stable_threshold: Option<f64>,
    comfortable_margin: Option<f64>,
    max_tradeoffs: Option<usize>,
    lightweight_density: Option<f64>,
    objective_weights: BTreeMap<String, f64>,
    default_top_n: Option<usize>,
    exploration_size: Option<usize>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing_penalty(mut self, penalty: f64) -> Self {
        self.missing_penalty = Some(penalty);
        self
    }
    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = Some(confidence);
        self
    }
    pub fn stability_curve(mut self, curve: StabilityCurve) -> Self {
        self.stability_curve = Some(curve);
        self
    }
    pub fn highly_stable_threshold(mut self, threshold: f64) -> Self {
        self.highly_stable_threshold = Some(threshold);
        self
    }
    pub fn comfortable_margin(mut self, margin: f64) -> Self {
        self.comfortable_margin = Some(margin);
        self
    }
    pub fn max_tradeoffs(mut self, n: usize) -> Self {
        self.max_tradeoffs = Some(n);
        self
    }
    pub fn lightweight_density(mut self, density: f64) -> Self {
        self.lightweight_density = Some(density);
        self
    }
    pub fn objective_weight(mut self, objective: &str, weight: f64) -> Self {
        self.objective_weights
            .insert(objective.trim().to_lowercase(), weight);
        self
    }
    pub fn default_top_n(mut self, n: usize) -> Self {
        self.default_top_n = Some(n);
        self
    }
    pub fn exploration_size(mut self, n: usize) -> Self {
        self.exploration_size = Some(n);
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            normalization: NormalizationConfig {
                missing_penalty: self
                    .missing_penalty
                    .unwrap_or(defaults.normalization.missing_penalty),
                min_confidence: self
                    .min_confidence
                    .unwrap_or(defaults.normalization.min_confidence),
            },
            stability: StabilityConfig {
                curve: self.stability_curve.unwrap_or(defaults.stability.curve),
                highly_stable_threshold: self
                    .highly_stable_threshold
                    .unwrap_or(defaults.stability.highly_stable_threshold),
            },
            explanation: ExplanationConfig {
                comfortable_margin: self
                    .comfortable_margin
                    .unwrap_or(defaults.explanation.comfortable_margin),
                max_tradeoffs: self
                    .max_tradeoffs
                    .unwrap_or(defaults.explanation.max_tradeoffs),
                lightweight_density: self
                    .lightweight_density
                    .unwrap_or(defaults.explanation.lightweight_density),
            },
            objective_weights: self.objective_weights,
            default_top_n: self.default_top_n.unwrap_or(defaults.default_top_n),
            exploration_size: self.exploration_size.unwrap_or(defaults.exploration_size),
        };
        config.validate()?;
        Ok(config)
    }
}
