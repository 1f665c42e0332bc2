use super::config::ConfigError;
use crate::core::models::objective::ObjectiveError;
use crate::core::models::requirement::RequirementError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid requirement on '{property}': {reason}")]
    InvalidRequirement { property: String, reason: String },

    #[error("Invalid objective specification '{objective}': {reason}")]
    InvalidObjectiveSpec { objective: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid engine configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Computation error during {stage}: {detail}")]
    Computation { stage: &'static str, detail: String },
}

impl From<RequirementError> for EngineError {
    fn from(err: RequirementError) -> Self {
        Self::InvalidRequirement {
            property: err.property,
            reason: err.reason,
        }
    }
}

impl From<ObjectiveError> for EngineError {
    fn from(err: ObjectiveError) -> Self {
        Self::InvalidObjectiveSpec {
            objective: err.objective,
            reason: err.reason,
        }
    }
}
