use crate::core::models::candidate::Candidate;
use crate::core::models::ids::MaterialId;
use crate::core::models::objective::ObjectiveSpec;
use crate::engine::config::EngineConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter, Stage};
use crate::engine::request::RecommendationRequest;
use crate::engine::tasks::explain::{ExplainInput, Explanation};
use crate::engine::tasks::filter::Rejection;
use crate::engine::tasks::normalize::NormalizedScores;
use crate::engine::tasks::pareto::Dominance;
use crate::engine::tasks::score::CandidateScore;
use crate::engine::tasks::{explain, filter, normalize, pareto, score};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// One objective's contribution to a candidate's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveScore {
    pub objective: String,
    /// Normalized score in `[0, 1]`, 1.0 being best.
    pub score: f64,
    pub raw: Option<f64>,
    /// The score is the missing-data penalty rather than a normalized value.
    pub penalized: bool,
}

/// A surviving candidate with its scores, frontier flag and explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    rank: usize,
    candidate: Candidate,
    objective_scores: Vec<ObjectiveScore>,
    match_score: f64,
    stability_multiplier: f64,
    on_frontier: bool,
    explanation: Explanation,
}

impl ScoredCandidate {
    /// 1-based position among all survivors.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn id(&self) -> &MaterialId {
        &self.candidate.id
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn objective_scores(&self) -> &[ObjectiveScore] {
        &self.objective_scores
    }

    pub fn objective_score(&self, objective: &str) -> Option<&ObjectiveScore> {
        self.objective_scores
            .iter()
            .find(|s| s.objective == objective)
    }

    pub fn match_score(&self) -> f64 {
        self.match_score
    }

    pub fn stability_multiplier(&self) -> f64 {
        self.stability_multiplier
    }

    pub fn on_frontier(&self) -> bool {
        self.on_frontier
    }

    pub fn explanation(&self) -> &Explanation {
        &self.explanation
    }
}

/// Non-dominated survivors ordered by match score descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrontierSet {
    members: Vec<ScoredCandidate>,
}

impl FrontierSet {
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredCandidate> {
        self.members.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &MaterialId> {
        self.members.iter().map(ScoredCandidate::id)
    }

    pub fn contains(&self, id: &MaterialId) -> bool {
        self.ids().any(|m| m == id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<'a> IntoIterator for &'a FrontierSet {
    type Item = &'a ScoredCandidate;
    type IntoIter = std::slice::Iter<'a, ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub pool_size: usize,
    pub survivors: usize,
    pub returned: usize,
    pub objectives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub ranked: Vec<ScoredCandidate>,
    pub frontier: FrontierSet,
    pub rejected: Vec<Rejection>,
    pub summary: Summary,
}

impl Recommendation {
    /// True when the requirements removed every candidate from the pool.
    pub fn no_candidates_passed(&self) -> bool {
        self.summary.survivors == 0
    }
}

/// Recommendation entry point holding an immutable, validated configuration.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn recommend(
        &self,
        pool: Vec<Candidate>,
        request: &RecommendationRequest,
    ) -> Result<Recommendation, EngineError> {
        run(pool, request, &self.config, &ProgressReporter::new())
    }

    pub fn recommend_with_progress(
        &self,
        pool: Vec<Candidate>,
        request: &RecommendationRequest,
        reporter: &ProgressReporter,
    ) -> Result<Recommendation, EngineError> {
        run(pool, request, &self.config, reporter)
    }
}

#[instrument(skip_all, name = "recommendation_workflow")]
pub fn run(
    pool: Vec<Candidate>,
    request: &RecommendationRequest,
    config: &EngineConfig,
    reporter: &ProgressReporter,
) -> Result<Recommendation, EngineError> {
    let pool_size = pool.len();
    let analysis = analyze(pool, request, config, reporter)?;
    let scored = analysis.scored();

    let frontier = FrontierSet {
        members: scored.iter().filter(|s| s.on_frontier).cloned().collect(),
    };
    let survivors = scored.len();
    let ranked: Vec<ScoredCandidate> = scored
        .into_iter()
        .take(request.resolved_top_n(config))
        .collect();

    if survivors == 0 {
        warn!("Zero candidates passed filters.");
    }
    info!(
        "Recommendation complete. Returning {} of {} survivor(s), {} on the frontier.",
        ranked.len(),
        survivors,
        frontier.len()
    );

    Ok(Recommendation {
        summary: Summary {
            pool_size,
            survivors,
            returned: ranked.len(),
            objectives: request.objectives.iter().map(|o| o.name.clone()).collect(),
        },
        ranked,
        frontier,
        rejected: analysis.rejected,
    })
}

/// Intermediate state of a full pipeline run over every survivor.
pub(crate) struct Analysis {
    pub survivors: Vec<Candidate>,
    pub rejected: Vec<Rejection>,
    pub normalized: NormalizedScores,
    pub scores: Vec<CandidateScore>,
    pub dominance: Dominance,
    pub explanations: Vec<Explanation>,
    /// Survivor indices in rank order.
    pub order: Vec<usize>,
}

impl Analysis {
    fn scored_at(&self, position: usize, index: usize) -> ScoredCandidate {
        let objective_scores = self
            .normalized
            .columns()
            .iter()
            .map(|column| ObjectiveScore {
                objective: column.name.clone(),
                score: column.scores[index],
                raw: column.raw[index].value(),
                penalized: column.penalized[index],
            })
            .collect();
        ScoredCandidate {
            rank: position + 1,
            candidate: self.survivors[index].clone(),
            objective_scores,
            match_score: self.scores[index].match_score,
            stability_multiplier: self.scores[index].stability_multiplier,
            on_frontier: self.dominance.on_frontier[index],
            explanation: self.explanations[index].clone(),
        }
    }

    /// Every survivor as a [`ScoredCandidate`], in rank order.
    pub fn scored(&self) -> Vec<ScoredCandidate> {
        self.order
            .iter()
            .enumerate()
            .map(|(position, &index)| self.scored_at(position, index))
            .collect()
    }
}

/// Validates the request and runs every pipeline stage over the whole survivor set.
pub(crate) fn analyze(
    pool: Vec<Candidate>,
    request: &RecommendationRequest,
    config: &EngineConfig,
    reporter: &ProgressReporter,
) -> Result<Analysis, EngineError> {
    request.validate()?;
    config.validate()?;
    check_objective_properties(&pool, &request.objectives)?;
    info!(
        pool_size = pool.len(),
        requirements = request.requirements.len(),
        objectives = request.objectives.len(),
        top_n = request.resolved_top_n(config),
        "Request validated."
    );

    reporter.report(Progress::StageStart {
        stage: Stage::Filtering,
    });
    let filtered = filter::run(pool, &request.requirements);
    reporter.report(Progress::StageFinish {
        stage: Stage::Filtering,
        survivors: filtered.survivors.len(),
    });
    let survivors = filtered.survivors;

    reporter.report(Progress::StageStart {
        stage: Stage::Normalization,
    });
    let normalized = normalize::run(&survivors, &request.objectives, &config.normalization)?;
    for column in normalized.columns().iter().filter(|c| c.has_no_data()) {
        reporter.report(Progress::Message(format!(
            "No candidate has data for '{}'; scoring it with the missing-data penalty.",
            column.name
        )));
    }
    reporter.report(Progress::StageFinish {
        stage: Stage::Normalization,
        survivors: survivors.len(),
    });

    reporter.report(Progress::StageStart {
        stage: Stage::Scoring,
    });
    let scores = score::run(
        &survivors,
        &normalized,
        &request.objectives,
        &config.stability.curve,
    )?;
    let order = score::ranking_order(&survivors, &scores);
    reporter.report(Progress::StageFinish {
        stage: Stage::Scoring,
        survivors: survivors.len(),
    });

    reporter.report(Progress::StageStart {
        stage: Stage::Frontier,
    });
    let dominance = pareto::run(&normalized);
    reporter.report(Progress::StageFinish {
        stage: Stage::Frontier,
        survivors: survivors.len(),
    });

    reporter.report(Progress::StageStart {
        stage: Stage::Explanation,
    });
    let explanations = explain::run(&ExplainInput {
        candidates: &survivors,
        normalized: &normalized,
        objectives: &request.objectives,
        dominance: &dominance,
        requirements: &request.requirements,
        config,
    });
    reporter.report(Progress::StageFinish {
        stage: Stage::Explanation,
        survivors: survivors.len(),
    });

    Ok(Analysis {
        survivors,
        rejected: filtered.rejected,
        normalized,
        scores,
        dominance,
        explanations,
        order,
    })
}

/// An objective whose properties no candidate in the pool knows cannot be scored.
fn check_objective_properties(
    pool: &[Candidate],
    objectives: &[ObjectiveSpec],
) -> Result<(), EngineError> {
    if pool.is_empty() {
        return Ok(());
    }
    for objective in objectives {
        if let Some(unknown) = objective
            .properties
            .iter()
            .find(|p| !pool.iter().any(|c| c.knows_property(p)))
        {
            return Err(EngineError::InvalidObjectiveSpec {
                objective: objective.name.clone(),
                reason: format!("no candidate in the pool has property '{unknown}'"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::candidate::Provenance;
    use crate::core::models::property::PropertyVector;
    use crate::core::models::requirement::{FailureReason, RequirementSet};
    use crate::engine::tasks::explain::FRONTIER_REASON;
    use crate::engine::tasks::pareto::dominates;
    use std::sync::Mutex;

    fn metal(id: &str, density: f64, band_gap: f64) -> Candidate {
        Candidate::new(
            id,
            id,
            PropertyVector::builder()
                .numeric("density", density)
                .numeric("band_gap", band_gap)
                .build(),
        )
        .with_provenance(Provenance::new("test").with_energy_above_hull(0.0))
    }

    fn light_metals() -> Vec<Candidate> {
        vec![
            metal("Al", 2.70, 0.0),
            metal("Mg", 1.74, 0.0),
            metal("W", 19.3, 0.0),
        ]
    }

    fn conductor_request(engine: &RecommendationEngine) -> RecommendationRequest {
        RecommendationRequest::new(
            RequirementSet::new()
                .max("density", 3.0)
                .min("band_gap", 0.0)
                .max("band_gap", 0.5),
        )
        .optimize(["weight"], engine.config())
        .unwrap()
        .top_n(5)
    }

    fn ids(candidates: &[ScoredCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id().as_str()).collect()
    }

    #[test]
    fn lightweight_conductor_scenario_ranks_magnesium_first() {
        let engine = RecommendationEngine::default();
        let request = conductor_request(&engine);

        let result = engine.recommend(light_metals(), &request).unwrap();

        assert_eq!(ids(&result.ranked), vec!["Mg", "Al"]);
        assert_eq!(result.ranked[0].rank(), 1);
        assert!(result.ranked[0].match_score() > result.ranked[1].match_score());
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].material_id.as_str(), "W");
        assert!(matches!(
            result.rejected[0].reason,
            FailureReason::AboveMaximum { .. }
        ));
        assert!(!result.no_candidates_passed());
    }

    #[test]
    fn single_objective_frontier_holds_only_the_top_scorer() {
        let engine = RecommendationEngine::default();
        let result = engine
            .recommend(light_metals(), &conductor_request(&engine))
            .unwrap();

        let frontier: Vec<_> = result.frontier.ids().map(|id| id.as_str()).collect();
        assert_eq!(frontier, vec!["Mg"]);
        assert!(result.ranked[0].on_frontier());
        assert!(!result.ranked[1].on_frontier());
        assert!(
            result.ranked[0]
                .explanation()
                .reasons
                .contains(&FRONTIER_REASON.to_string())
        );
    }

    #[test]
    fn contradictory_requirements_fail_before_filtering() {
        let engine = RecommendationEngine::default();
        let request = RecommendationRequest::new(
            RequirementSet::new()
                .min("strength", 500.0)
                .max("strength", 100.0),
        );
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            events.lock().unwrap().push(e);
        }));

        let err = engine
            .recommend_with_progress(light_metals(), &request, &reporter)
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::InvalidRequirement { ref property, .. } if property == "strength"
        ));
        drop(reporter);
        assert!(events.into_inner().unwrap().is_empty());
    }

    #[test]
    fn all_zero_weights_are_rejected() {
        let engine = RecommendationEngine::default();
        let request = RecommendationRequest::new(RequirementSet::new())
            .objective(ObjectiveSpec::minimize("weight", "density").with_weight(0.0));
        let err = engine.recommend(light_metals(), &request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidObjectiveSpec { .. }));
    }

    #[test]
    fn objective_on_unknown_property_is_rejected() {
        let engine = RecommendationEngine::default();
        let request = RecommendationRequest::new(RequirementSet::new())
            .objective(ObjectiveSpec::maximize("toughness", "fracture_toughness"));
        let err = engine.recommend(light_metals(), &request).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidObjectiveSpec { ref objective, .. } if objective == "toughness"
        ));
    }

    #[test]
    fn empty_survivor_set_is_a_valid_result() {
        let engine = RecommendationEngine::default();
        let request = RecommendationRequest::new(RequirementSet::new().max("density", 1.0))
            .optimize(["weight"], engine.config())
            .unwrap();

        let result = engine.recommend(light_metals(), &request).unwrap();

        assert!(result.ranked.is_empty());
        assert!(result.frontier.is_empty());
        assert!(result.no_candidates_passed());
        assert_eq!(result.summary.pool_size, 3);
        assert_eq!(result.rejected.len(), 3);
    }

    #[test]
    fn empty_pool_is_a_valid_result() {
        let engine = RecommendationEngine::default();
        let request = RecommendationRequest::new(RequirementSet::new())
            .optimize(["weight"], engine.config())
            .unwrap();
        let result = engine.recommend(Vec::new(), &request).unwrap();
        assert!(result.no_candidates_passed());
    }

    #[test]
    fn ranking_is_truncated_but_frontier_is_not() {
        let engine = RecommendationEngine::default();
        let pool = vec![
            metal("A", 1.0, 1.0),
            metal("B", 2.0, 2.0),
            metal("C", 3.0, 3.0),
        ];
        let request = RecommendationRequest::new(RequirementSet::new())
            .objective(ObjectiveSpec::minimize("weight", "density"))
            .objective(ObjectiveSpec::maximize("gap", "band_gap"))
            .top_n(1);

        let result = engine.recommend(pool, &request).unwrap();

        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.summary.survivors, 3);
        assert_eq!(result.frontier.len(), 3);
    }

    #[test]
    fn configured_default_top_n_applies_when_request_leaves_it_unset() {
        let engine =
            RecommendationEngine::new(EngineConfig::builder().default_top_n(1).build().unwrap())
                .unwrap();
        let pool = vec![
            metal("A", 1.0, 0.0),
            metal("B", 2.0, 0.0),
            metal("C", 3.0, 0.0),
        ];
        let request = RecommendationRequest::new(RequirementSet::new())
            .optimize(["weight"], engine.config())
            .unwrap();

        let result = engine.recommend(pool.clone(), &request).unwrap();
        assert_eq!(ids(&result.ranked), vec!["A"]);
        assert_eq!(result.summary.survivors, 3);

        let wider = engine.recommend(pool, &request.top_n(2)).unwrap();
        assert_eq!(ids(&wider.ranked), vec!["A", "B"]);
    }

    #[test]
    fn frontier_members_are_mutually_non_dominated() {
        let engine = RecommendationEngine::default();
        let pool = vec![
            metal("A", 1.0, 0.5),
            metal("B", 2.0, 2.0),
            metal("C", 3.0, 1.0),
            metal("D", 1.5, 1.5),
        ];
        let request = RecommendationRequest::new(RequirementSet::new())
            .objective(ObjectiveSpec::minimize("weight", "density"))
            .objective(ObjectiveSpec::maximize("gap", "band_gap"));

        let result = engine.recommend(pool, &request).unwrap();
        let vectors: Vec<Vec<f64>> = result
            .frontier
            .iter()
            .map(|s| s.objective_scores().iter().map(|o| o.score).collect())
            .collect();

        assert!(!result.frontier.contains(&MaterialId::new("C")));
        for a in &vectors {
            for b in &vectors {
                assert!(!dominates(a, b));
            }
        }
        let scores: Vec<f64> = result.frontier.iter().map(|s| s.match_score()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn identical_candidates_receive_identical_scores() {
        let engine = RecommendationEngine::default();
        let pool = vec![metal("Y", 2.0, 1.0), metal("X", 2.0, 1.0), metal("Z", 4.0, 1.0)];
        let request = RecommendationRequest::new(RequirementSet::new())
            .optimize(["weight"], engine.config())
            .unwrap();

        let result = engine.recommend(pool, &request).unwrap();

        assert_eq!(ids(&result.ranked), vec!["X", "Y", "Z"]);
        assert_eq!(result.ranked[0].match_score(), result.ranked[1].match_score());
    }

    #[test]
    fn missing_objective_data_scores_the_penalty() {
        let engine = RecommendationEngine::default();
        let unknown = Candidate::new(
            "U",
            "U",
            PropertyVector::builder().missing("density").build(),
        );
        let pool = vec![metal("A", 2.0, 0.0), metal("B", 4.0, 0.0), unknown];
        let request = RecommendationRequest::new(RequirementSet::new())
            .optimize(["weight"], engine.config())
            .unwrap();

        let result = engine.recommend(pool, &request).unwrap();
        let u = result
            .ranked
            .iter()
            .find(|s| s.id().as_str() == "U")
            .unwrap();
        let weight = u.objective_score("weight").unwrap();

        assert_eq!(weight.score, 0.0);
        assert!(weight.penalized);
        assert_eq!(weight.raw, None);
    }

    #[test]
    fn objective_without_any_data_is_reported_as_a_message() {
        let engine = RecommendationEngine::default();
        let pool = vec![
            Candidate::new("P", "P", PropertyVector::builder().missing("density").build()),
            Candidate::new("Q", "Q", PropertyVector::builder().missing("density").build()),
        ];
        let request = RecommendationRequest::new(RequirementSet::new())
            .optimize(["weight"], engine.config())
            .unwrap();
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            events.lock().unwrap().push(e);
        }));

        engine
            .recommend_with_progress(pool, &request, &reporter)
            .unwrap();
        drop(reporter);

        let messages: Vec<String> = events
            .into_inner()
            .unwrap()
            .into_iter()
            .filter_map(|e| match e {
                Progress::Message(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("'weight'"));
    }

    #[test]
    fn no_objectives_rank_by_stability_then_id() {
        let engine = RecommendationEngine::default();
        let shaky = metal("A", 2.0, 0.0)
            .with_provenance(Provenance::new("test").with_energy_above_hull(0.05));
        let pool = vec![shaky, metal("C", 2.0, 0.0), metal("B", 2.0, 0.0)];
        let request = RecommendationRequest::new(RequirementSet::new());

        let result = engine.recommend(pool, &request).unwrap();

        assert_eq!(ids(&result.ranked), vec!["B", "C", "A"]);
        assert_eq!(result.frontier.len(), 3);
    }

    #[test]
    fn progress_reports_every_stage_in_order() {
        let engine = RecommendationEngine::default();
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            events.lock().unwrap().push(e);
        }));

        engine
            .recommend_with_progress(light_metals(), &conductor_request(&engine), &reporter)
            .unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 10);
        assert_eq!(
            events[1],
            Progress::StageFinish {
                stage: Stage::Filtering,
                survivors: 2
            }
        );
        assert_eq!(
            events[9],
            Progress::StageFinish {
                stage: Stage::Explanation,
                survivors: 2
            }
        );
    }

    #[test]
    fn concurrent_invocations_are_independent() {
        let engine = RecommendationEngine::default();
        let request = conductor_request(&engine);
        let expected = engine.recommend(light_metals(), &request).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| engine.recommend(light_metals(), &request).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = EngineConfig::default();
        config.normalization.missing_penalty = 2.0;
        assert!(matches!(
            RecommendationEngine::new(config),
            Err(EngineError::Config { .. })
        ));
    }
}
