use super::normalize::NormalizedScores;
use crate::core::models::candidate::Candidate;
use crate::core::models::objective::ObjectiveSpec;
use crate::engine::config::StabilityCurve;
use crate::engine::error::EngineError;
use std::cmp::Ordering;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const STAGE: &str = "scoring";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    /// Weighted objective score times the stability multiplier, in `[0, 1]`.
    pub match_score: f64,
    pub stability_multiplier: f64,
}

/// Scores every candidate: renormalized weighted mean of its objective scores,
/// multiplied by the stability multiplier when a stability indicator is known.
#[instrument(skip_all, name = "scoring_task")]
pub fn run(
    candidates: &[Candidate],
    normalized: &NormalizedScores,
    objectives: &[ObjectiveSpec],
    curve: &StabilityCurve,
) -> Result<Vec<CandidateScore>, EngineError> {
    info!(candidates = candidates.len(), "Aggregating match scores.");

    let weights: Vec<f64> = objectives.iter().map(|o| o.weight).collect();

    #[cfg(not(feature = "parallel"))]
    let iter = candidates.iter().enumerate();
    #[cfg(feature = "parallel")]
    let iter = candidates.par_iter().enumerate();

    iter.map(|(index, candidate)| {
        let base = weighted_mean(&normalized.row(index), &weights);
        let stability_multiplier = candidate
            .stability_indicator()
            .map_or(1.0, |e| curve.multiplier(e));
        let score = base * stability_multiplier;
        if !score.is_finite() {
            return Err(EngineError::Computation {
                stage: STAGE,
                detail: format!("non-finite match score for '{}'", candidate.id),
            });
        }
        Ok(CandidateScore {
            match_score: score.clamp(0.0, 1.0),
            stability_multiplier,
        })
    })
    .collect()
}

/// Weighted mean with the weights renormalized to sum to one.
///
/// An empty score vector (no objectives) is a perfect match. A zero total weight
/// falls back to the plain mean.
pub fn weighted_mean(scores: &[f64], weights: &[f64]) -> f64 {
    if scores.is_empty() {
        return 1.0;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return scores.iter().sum::<f64>() / scores.len() as f64;
    }
    scores
        .iter()
        .zip(weights)
        .map(|(s, w)| s * w / total)
        .sum()
}

/// Candidate indices ordered by descending match score, ties broken by ascending id.
pub fn ranking_order(candidates: &[Candidate], scores: &[CandidateScore]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| compare_ranked(candidates, scores, a, b));
    order
}

fn compare_ranked(
    candidates: &[Candidate],
    scores: &[CandidateScore],
    a: usize,
    b: usize,
) -> Ordering {
    scores[b]
        .match_score
        .total_cmp(&scores[a].match_score)
        .then_with(|| candidates[a].id.cmp(&candidates[b].id))
}
