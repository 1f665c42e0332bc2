use super::normalize::NormalizedScores;
use super::pareto::Dominance;
use crate::core::models::candidate::Candidate;
use crate::core::models::ids::MaterialId;
use crate::core::models::objective::{ObjectiveSpec, RawValue};
use crate::core::models::property::ValueOrigin;
use crate::core::models::requirement::{Constraint, Requirement, RequirementSet};
use crate::engine::config::EngineConfig;
use serde::Serialize;
use tracing::{info, instrument, trace};

pub const FRONTIER_REASON: &str = "Pareto-optimal for the requested objectives.";
pub const FALLBACK_REASON: &str = "meets all requirements";

const GAP_EPSILON: f64 = 1e-9;
const DENSITY_PROPERTY: &str = "density";

/// A named deficiency: another survivor scores better on this objective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeOff {
    pub objective: String,
    /// Normalized score difference to the leader, in `(0, 1]`.
    pub gap: f64,
    pub leader: MaterialId,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Explanation {
    pub reasons: Vec<String>,
    pub tradeoffs: Vec<TradeOff>,
    pub risks: Vec<String>,
}

/// Everything the explainer looks at, indexed like `candidates`.
pub struct ExplainInput<'a> {
    pub candidates: &'a [Candidate],
    pub normalized: &'a NormalizedScores,
    pub objectives: &'a [ObjectiveSpec],
    pub dominance: &'a Dominance,
    pub requirements: &'a RequirementSet,
    pub config: &'a EngineConfig,
}

#[instrument(skip_all, name = "explanation_task")]
pub fn run(input: &ExplainInput) -> Vec<Explanation> {
    info!(
        candidates = input.candidates.len(),
        "Generating explanations."
    );
    (0..input.candidates.len())
        .map(|index| explain(input, index))
        .collect()
}

/// Builds the explanation of one candidate. Output depends only on the input, never
/// on iteration or thread order.
pub fn explain(input: &ExplainInput, index: usize) -> Explanation {
    let candidate = &input.candidates[index];
    let explanation = Explanation {
        reasons: reasons(input, index),
        tradeoffs: tradeoffs(input, index),
        risks: risks(input, index),
    };
    trace!(
        material = %candidate.id,
        reasons = explanation.reasons.len(),
        tradeoffs = explanation.tradeoffs.len(),
        risks = explanation.risks.len(),
        "Candidate explained."
    );
    explanation
}

fn reasons(input: &ExplainInput, index: usize) -> Vec<String> {
    let candidate = &input.candidates[index];
    let settings = &input.config.explanation;
    let mut reasons: Vec<String> = input
        .requirements
        .iter()
        .filter_map(|r| requirement_reason(r, candidate, settings.comfortable_margin))
        .collect();

    if candidate.provenance.is_stable == Some(true) {
        reasons.push("thermodynamically stable".to_string());
    }
    if candidate
        .stability_indicator()
        .is_some_and(|e| e < input.config.stability.highly_stable_threshold)
    {
        reasons.push("highly stable".to_string());
    }
    if candidate
        .measurement(DENSITY_PROPERTY)
        .is_some_and(|m| m.value < settings.lightweight_density)
    {
        reasons.push("lightweight".to_string());
    }
    if input.dominance.on_frontier[index] {
        reasons.push(FRONTIER_REASON.to_string());
    }
    if reasons.is_empty() {
        reasons.push(FALLBACK_REASON.to_string());
    }
    reasons
}

fn requirement_reason(
    requirement: &Requirement,
    candidate: &Candidate,
    comfortable_margin: f64,
) -> Option<String> {
    let property = &requirement.property;
    match &requirement.constraint {
        Constraint::Min { .. } | Constraint::Max { .. } => {
            let value = candidate.measurement(property)?.value;
            let margin = requirement.relative_margin(value)?;
            if margin < comfortable_margin {
                return None;
            }
            let percent = (margin * 100.0).round();
            let phrase = match requirement.constraint {
                Constraint::Min { .. } => "above requirement",
                _ => "below limit",
            };
            Some(format!("{property} {percent}% {phrase}"))
        }
        Constraint::AtLeastTier { tier: required, scale } => {
            let tier = candidate.category(property)?;
            let exceeds = scale.rank(tier)? > scale.rank(required)?;
            exceeds.then(|| format!("{property} rated {tier}, above the required {required}"))
        }
        Constraint::Equals { .. } | Constraint::IncludesElements { .. } => None,
    }
}

fn tradeoffs(input: &ExplainInput, index: usize) -> Vec<TradeOff> {
    let candidates = input.candidates;
    let mut found: Vec<TradeOff> = input
        .normalized
        .columns()
        .iter()
        .filter_map(|column| {
            let own = column.scores[index];
            let (leader, best) = column
                .scores
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != index)
                .min_by(|&(a, sa), &(b, sb)| {
                    sb.total_cmp(sa)
                        .then_with(|| candidates[a].id.cmp(&candidates[b].id))
                })?;
            let gap = best - own;
            (gap > GAP_EPSILON).then(|| {
                let leader = candidates[leader].id.clone();
                TradeOff {
                    description: format!(
                        "trails {leader} on {} (normalized gap {gap:.2})",
                        column.name
                    ),
                    objective: column.name.clone(),
                    gap,
                    leader,
                }
            })
        })
        .collect();

    found.sort_by(|a, b| b.gap.total_cmp(&a.gap));
    found.truncate(input.config.explanation.max_tradeoffs);
    found
}

fn risks(input: &ExplainInput, index: usize) -> Vec<String> {
    let candidate = &input.candidates[index];
    let mut risks = Vec::new();

    match candidate.stability_indicator() {
        None => risks.push("stability unknown: no energy above hull reported".to_string()),
        Some(e) => {
            if input.config.stability.curve.cutoff().is_some_and(|c| e > c) {
                risks.push(format!("metastable: {e:.3} eV/atom above hull"));
            }
        }
    }
    if candidate.provenance.is_theoretical == Some(true) {
        risks.push("theoretical: not yet experimentally synthesized".to_string());
    }

    for (column, objective) in input.normalized.columns().iter().zip(input.objectives) {
        match column.raw[index] {
            RawValue::Missing => risks.push(format!(
                "no data for {}; scored with the missing-data penalty",
                column.name
            )),
            RawValue::LowConfidence => risks.push(format!(
                "{} rests on a low-confidence prediction; scored with the missing-data penalty",
                column.name
            )),
            RawValue::Present(_) => {
                let predicted = objective.properties.iter().any(|p| {
                    candidate
                        .measurement(p)
                        .is_some_and(|m| m.origin == ValueOrigin::Predicted)
                });
                if predicted {
                    risks.push(format!("{} uses predicted values", column.name));
                }
            }
        }
    }
    risks
}
