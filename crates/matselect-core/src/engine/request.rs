use super::config::EngineConfig;
use super::error::EngineError;
use crate::core::models::objective::{ObjectiveSpec, validate_objectives};
use crate::core::models::requirement::RequirementSet;

/// What to recommend: hard requirements, the objectives to optimize and how many
/// candidates to return.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub requirements: RequirementSet,
    pub objectives: Vec<ObjectiveSpec>,
    /// Falls back to [`EngineConfig::default_top_n`] when unset.
    pub top_n: Option<usize>,
}

impl RecommendationRequest {
    pub fn new(requirements: RequirementSet) -> Self {
        Self {
            requirements,
            objectives: Vec::new(),
            top_n: None,
        }
    }

    pub fn objective(mut self, objective: ObjectiveSpec) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn objectives(mut self, objectives: impl IntoIterator<Item = ObjectiveSpec>) -> Self {
        self.objectives.extend(objectives);
        self
    }

    /// Adds preset objectives by name, weighted from the configuration defaults.
    pub fn optimize<I, S>(mut self, names: I, config: &EngineConfig) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.objectives.push(config.objective(name.as_ref())?);
        }
        Ok(self)
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// The number of candidates to return under `config`.
    pub fn resolved_top_n(&self, config: &EngineConfig) -> usize {
        self.top_n.unwrap_or(config.default_top_n)
    }

    /// Eager validation at the orchestration boundary, before any candidate is touched.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.requirements.validate()?;
        validate_objectives(&self.objectives)?;
        if self.top_n == Some(0) {
            return Err(EngineError::InvalidRequest(
                "top_n must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimize_resolves_presets_with_configured_weights() {
        let config = EngineConfig::builder()
            .objective_weight("weight", 2.0)
            .build()
            .unwrap();
        let request = RecommendationRequest::new(RequirementSet::new())
            .optimize(["weight", "cost"], &config)
            .unwrap();
        let weights: Vec<_> = request
            .objectives
            .iter()
            .map(|o| (o.name.as_str(), o.weight))
            .collect();
        assert_eq!(weights, vec![("weight", 2.0), ("cost", 1.0)]);
    }

    #[test]
    fn optimize_rejects_unknown_preset() {
        let result = RecommendationRequest::new(RequirementSet::new())
            .optimize(["charisma"], &EngineConfig::default());
        assert!(matches!(
            result,
            Err(EngineError::InvalidObjectiveSpec { .. })
        ));
    }

    #[test]
    fn validate_checks_requirements_before_objectives() {
        let request = RecommendationRequest::new(
            RequirementSet::new()
                .min("strength", 500.0)
                .max("strength", 100.0),
        )
        .objective(ObjectiveSpec::minimize("weight", "density").with_weight(0.0));
        assert!(matches!(
            request.validate(),
            Err(EngineError::InvalidRequirement { .. })
        ));
    }

    #[test]
    fn unset_top_n_follows_the_engine_configuration() {
        let config = EngineConfig::builder().default_top_n(1).build().unwrap();
        let request = RecommendationRequest::new(RequirementSet::new());
        assert_eq!(request.top_n, None);
        assert_eq!(request.resolved_top_n(&config), 1);
        assert_eq!(request.top_n(3).resolved_top_n(&config), 3);
    }

    #[test]
    fn validate_rejects_zero_top_n() {
        let request = RecommendationRequest::new(RequirementSet::new()).top_n(0);
        assert!(matches!(
            request.validate(),
            Err(EngineError::InvalidRequest(_))
        ));
    }
}
