use matselect::engine::config::{EngineConfig, StabilityCurve};

/// Front-end defaults for settings the TOML file may leave out.
pub struct DefaultsConfig {
    pub curve: String,
    pub curve_width: f64,
    pub curve_floor: f64,
    pub top_n: usize,
    pub objectives: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        let (curve_width, curve_floor) = match engine.stability.curve {
            StabilityCurve::Linear { cutoff, floor } => (cutoff, floor),
            StabilityCurve::Exponential { scale, floor } => (scale, floor),
            StabilityCurve::None => (0.1, 0.5),
        };
        Self {
            curve: "linear".to_string(),
            curve_width,
            curve_floor,
            top_n: engine.default_top_n,
            objectives: Vec::new(),
        }
    }
}
