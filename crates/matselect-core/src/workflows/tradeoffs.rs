use super::recommend::{self, ScoredCandidate};
use crate::core::models::candidate::Candidate;
use crate::core::models::ids::MaterialId;
use crate::core::models::objective::Direction;
use crate::engine::config::EngineConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::request::RecommendationRequest;
use itertools::Itertools;
use serde::Serialize;
use tracing::{info, instrument};

/// The survivor with the best raw value on one objective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveLeader {
    pub objective: String,
    pub material_id: MaterialId,
    pub value: f64,
}

/// Pearson correlation between two objectives' normalized scores across survivors.
///
/// A negative coefficient means the objectives compete. `None` when either objective
/// has no variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveCorrelation {
    pub first: String,
    pub second: String,
    pub coefficient: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeoffReport {
    /// The best `exploration_size` survivors in rank order.
    pub explored: Vec<ScoredCandidate>,
    /// Every non-dominated survivor in rank order.
    pub frontier: Vec<ScoredCandidate>,
    pub survivors: usize,
    pub dominated: usize,
    pub leaders: Vec<ObjectiveLeader>,
    pub correlations: Vec<ObjectiveCorrelation>,
}

#[instrument(skip_all, name = "tradeoff_workflow")]
pub fn run(
    pool: Vec<Candidate>,
    request: &RecommendationRequest,
    config: &EngineConfig,
    reporter: &ProgressReporter,
) -> Result<TradeoffReport, EngineError> {
    if request.objectives.is_empty() {
        return Err(EngineError::InvalidRequest(
            "trade-off exploration needs at least one objective".to_string(),
        ));
    }
    let request = request.clone().top_n(config.exploration_size);
    let analysis = recommend::analyze(pool, &request, config, reporter)?;

    let scored = analysis.scored();
    let survivors = scored.len();
    let frontier: Vec<ScoredCandidate> = scored
        .iter()
        .filter(|s| s.on_frontier())
        .cloned()
        .collect();
    let dominated = survivors - frontier.len();

    let leaders = analysis
        .normalized
        .columns()
        .iter()
        .filter_map(|column| {
            let best = column
                .raw
                .iter()
                .enumerate()
                .filter_map(|(i, raw)| raw.value().map(|v| (i, v)))
                .min_by(|&(a, va), &(b, vb)| {
                    let by_value = match column.direction {
                        Direction::Minimize => va.total_cmp(&vb),
                        Direction::Maximize => vb.total_cmp(&va),
                    };
                    by_value.then_with(|| {
                        analysis.survivors[a].id.cmp(&analysis.survivors[b].id)
                    })
                })?;
            Some(ObjectiveLeader {
                objective: column.name.clone(),
                material_id: analysis.survivors[best.0].id.clone(),
                value: best.1,
            })
        })
        .collect();

    let correlations = analysis
        .normalized
        .columns()
        .iter()
        .tuple_combinations()
        .map(|(a, b)| ObjectiveCorrelation {
            first: a.name.clone(),
            second: b.name.clone(),
            coefficient: pearson(&a.scores, &b.scores),
        })
        .collect();

    info!(
        survivors,
        frontier = frontier.len(),
        dominated,
        "Trade-off exploration complete."
    );

    Ok(TradeoffReport {
        explored: scored.into_iter().take(config.exploration_size).collect(),
        frontier,
        survivors,
        dominated,
        leaders,
        correlations,
    })
}

/// Sample Pearson correlation coefficient, `None` for fewer than two points or zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    Some(r.clamp(-1.0, 1.0))
}
