use crate::core::models::candidate::Candidate;
use crate::core::models::objective::{Direction, ObjectiveSpec, RawValue};
use crate::engine::config::NormalizationConfig;
use crate::engine::error::EngineError;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const STAGE: &str = "normalization";

/// One objective's raw and normalized values across the surviving candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveColumn {
    pub name: String,
    pub direction: Direction,
    pub raw: Vec<RawValue>,
    /// Normalized scores in `[0, 1]`, 1.0 being best, indexed like the candidates.
    pub scores: Vec<f64>,
    /// Whether the score at the same index came from the missing-data penalty.
    pub penalized: Vec<bool>,
}

impl ObjectiveColumn {
    /// The best raw value any candidate reached for this objective.
    pub fn best_raw(&self) -> Option<f64> {
        let present = self.raw.iter().filter_map(RawValue::value);
        match self.direction {
            Direction::Minimize => present.reduce(f64::min),
            Direction::Maximize => present.reduce(f64::max),
        }
    }

    /// True when candidates exist but none of them has a usable value.
    pub fn has_no_data(&self) -> bool {
        !self.raw.is_empty() && self.raw.iter().all(|r| r.value().is_none())
    }
}

/// Normalized objective scores for a candidate set, stored column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedScores {
    candidates: usize,
    columns: Vec<ObjectiveColumn>,
}

impl NormalizedScores {
    pub fn candidate_count(&self) -> usize {
        self.candidates
    }

    pub fn columns(&self) -> &[ObjectiveColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ObjectiveColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The objective score vector of one candidate, in objective order.
    pub fn row(&self, index: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c.scores[index]).collect()
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.candidates).map(|i| self.row(i)).collect()
    }
}

/// Maps every objective onto `[0, 1]` across `candidates` with min-max scaling.
///
/// Minimized objectives are inverted so that 1.0 is always best. Missing or
/// low-confidence values get `config.missing_penalty`. When every present value is
/// identical they all score 1.0.
#[instrument(skip_all, name = "normalization_task")]
pub fn run(
    candidates: &[Candidate],
    objectives: &[ObjectiveSpec],
    config: &NormalizationConfig,
) -> Result<NormalizedScores, EngineError> {
    info!(
        candidates = candidates.len(),
        objectives = objectives.len(),
        "Normalizing objective values."
    );

    let mut columns = Vec::with_capacity(objectives.len());
    for objective in objectives {
        columns.push(normalize_objective(candidates, objective, config)?);
    }

    Ok(NormalizedScores {
        candidates: candidates.len(),
        columns,
    })
}

fn normalize_objective(
    candidates: &[Candidate],
    objective: &ObjectiveSpec,
    config: &NormalizationConfig,
) -> Result<ObjectiveColumn, EngineError> {
    #[cfg(not(feature = "parallel"))]
    let iter = candidates.iter();
    #[cfg(feature = "parallel")]
    let iter = candidates.par_iter();

    let raw: Vec<RawValue> = iter
        .map(|c| objective.raw_value(c, config.min_confidence))
        .collect();

    if let Some(bad) = raw
        .iter()
        .filter_map(RawValue::value)
        .find(|v| !v.is_finite())
    {
        return Err(EngineError::Computation {
            stage: STAGE,
            detail: format!("objective '{}' has non-finite value {bad}", objective.name),
        });
    }

    let missing = raw.iter().filter(|r| r.value().is_none()).count();
    if !candidates.is_empty() && missing == candidates.len() {
        warn!(
            objective = %objective.name,
            "No candidate has data for this objective; every candidate gets the missing-data penalty."
        );
    }

    let scores = normalize_column(&raw, objective.direction, config.missing_penalty);
    if let Some(bad) = scores
        .iter()
        .find(|s| !s.is_finite() || !(0.0..=1.0).contains(*s))
    {
        return Err(EngineError::Computation {
            stage: STAGE,
            detail: format!(
                "objective '{}' produced out-of-range score {bad}",
                objective.name
            ),
        });
    }

    Ok(ObjectiveColumn {
        name: objective.name.clone(),
        direction: objective.direction,
        penalized: raw.iter().map(|r| r.value().is_none()).collect(),
        raw,
        scores,
    })
}

/// Min-max normalizes one objective column.
pub fn normalize_column(raw: &[RawValue], direction: Direction, missing_penalty: f64) -> Vec<f64> {
    let present = raw.iter().filter_map(RawValue::value);
    let (lo, hi) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let span = hi - lo;

    raw.iter()
        .map(|r| match r.value() {
            None => missing_penalty,
            Some(_) if span <= 0.0 => 1.0,
            Some(v) => {
                let scaled = (v - lo) / span;
                let oriented = match direction {
                    Direction::Maximize => scaled,
                    Direction::Minimize => 1.0 - scaled,
                };
                oriented.clamp(0.0, 1.0)
            }
        })
        .collect()
}
