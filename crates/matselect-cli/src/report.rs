use matselect::workflows::compare::Comparison;
use matselect::workflows::recommend::{Recommendation, ScoredCandidate};
use matselect::workflows::tradeoffs::TradeoffReport;
use std::collections::BTreeMap;
use std::fmt::Write;

pub const NO_CANDIDATES_NOTICE: &str = "Zero candidates passed filters.";

pub fn render_recommendation(result: &Recommendation) -> String {
    let mut out = String::new();
    if result.no_candidates_passed() {
        render_empty(&mut out, result);
        return out;
    }

    let _ = writeln!(
        out,
        "{} of {} candidate(s) passed filters; showing top {}.",
        result.summary.survivors, result.summary.pool_size, result.summary.returned
    );
    if !result.summary.objectives.is_empty() {
        let _ = writeln!(out, "Objectives: {}", result.summary.objectives.join(", "));
    }
    for scored in &result.ranked {
        out.push('\n');
        render_scored(&mut out, scored);
    }
    out
}

fn render_empty(out: &mut String, result: &Recommendation) {
    let _ = writeln!(out, "{NO_CANDIDATES_NOTICE}");
    if result.summary.pool_size == 0 {
        let _ = writeln!(out, "  The candidate pool is empty.");
        return;
    }

    let mut by_property: BTreeMap<&str, usize> = BTreeMap::new();
    for rejection in &result.rejected {
        *by_property.entry(rejection.property.as_str()).or_default() += 1;
    }
    let _ = writeln!(
        out,
        "  All {} candidate(s) were rejected. Consider relaxing:",
        result.summary.pool_size
    );
    for (property, count) in by_property {
        let _ = writeln!(out, "    - {property} ({count} rejection(s))");
    }
}

fn render_scored(out: &mut String, scored: &ScoredCandidate) {
    let candidate = scored.candidate();
    let frontier = if scored.on_frontier() {
        " [frontier]"
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "#{} {} ({}) score {:.3}{}",
        scored.rank(),
        candidate.id,
        candidate.name,
        scored.match_score(),
        frontier
    );

    let explanation = scored.explanation();
    for reason in &explanation.reasons {
        let _ = writeln!(out, "  + {reason}");
    }
    for tradeoff in &explanation.tradeoffs {
        let _ = writeln!(out, "  ~ {}", tradeoff.description);
    }
    for risk in &explanation.risks {
        let _ = writeln!(out, "  ! {risk}");
    }
}

pub fn render_tradeoffs(report: &TradeoffReport) -> String {
    let mut out = String::new();
    if report.survivors == 0 {
        let _ = writeln!(out, "{NO_CANDIDATES_NOTICE}");
        return out;
    }

    let _ = writeln!(
        out,
        "Pareto frontier: {} of {} survivor(s) ({} dominated).",
        report.frontier.len(),
        report.survivors,
        report.dominated
    );
    for scored in &report.frontier {
        let scores: Vec<String> = scored
            .objective_scores()
            .iter()
            .map(|s| format!("{}={:.2}", s.objective, s.score))
            .collect();
        let _ = writeln!(
            out,
            "  {} ({}) score {:.3}  {}",
            scored.id(),
            scored.candidate().name,
            scored.match_score(),
            scores.join(" ")
        );
    }

    let _ = writeln!(out, "\nBest per objective:");
    for leader in &report.leaders {
        let _ = writeln!(
            out,
            "  {}: {} ({})",
            leader.objective, leader.material_id, leader.value
        );
    }

    if !report.correlations.is_empty() {
        let _ = writeln!(out, "\nObjective correlations:");
        for correlation in &report.correlations {
            let verdict = match correlation.coefficient {
                Some(r) if r < 0.0 => format!("{r:+.2} (competing)"),
                Some(r) => format!("{r:+.2}"),
                None => "undefined (no variance)".to_string(),
            };
            let _ = writeln!(
                out,
                "  {} vs {}: {}",
                correlation.first, correlation.second, verdict
            );
        }
    }
    out
}

pub fn render_comparison(comparison: &Comparison) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Baseline: {}", comparison.baseline);
    for alternative in &comparison.alternatives {
        let _ = writeln!(
            out,
            "\n{} ({})",
            alternative.material_id, alternative.name
        );
        for delta in &alternative.deltas {
            let value = delta
                .value
                .map_or_else(|| "n/a".to_string(), |v| v.to_string());
            let change = delta
                .percent_change
                .map_or_else(String::new, |p| format!(" ({p:+.1}%)"));
            let _ = writeln!(out, "  {}: {}{}", delta.property, value, change);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use matselect::core::models::candidate::{Candidate, Provenance};
    use matselect::core::models::ids::MaterialId;
    use matselect::core::models::property::PropertyVector;
    use matselect::core::models::requirement::RequirementSet;
    use matselect::engine::request::RecommendationRequest;
    use matselect::workflows::compare;
    use matselect::workflows::recommend::RecommendationEngine;

    fn pool() -> Vec<Candidate> {
        ["Al:2.70", "Mg:1.74", "W:19.3"]
            .iter()
            .map(|spec| {
                let (id, density) = spec.split_once(':').unwrap();
                Candidate::new(
                    id,
                    id,
                    PropertyVector::builder()
                        .numeric("density", density.parse().unwrap())
                        .build(),
                )
                .with_provenance(Provenance::new("test").with_energy_above_hull(0.0))
            })
            .collect()
    }

    fn recommend(requirements: RequirementSet) -> Recommendation {
        let engine = RecommendationEngine::default();
        let request = RecommendationRequest::new(requirements)
            .optimize(["weight"], engine.config())
            .unwrap();
        engine.recommend(pool(), &request).unwrap()
    }

    #[test]
    fn ranked_output_lists_scores_and_reasons() {
        let text = render_recommendation(&recommend(RequirementSet::new().max("density", 3.0)));

        assert!(text.starts_with("2 of 3 candidate(s) passed filters"));
        assert!(text.contains("#1 Mg (Mg) score 1.000 [frontier]"));
        assert!(text.contains("#2 Al (Al)"));
        assert!(text.contains("  + density 42% below limit"));
        assert!(text.contains("  ~ trails Mg on weight"));
    }

    #[test]
    fn empty_result_prints_notice_with_hints() {
        let text = render_recommendation(&recommend(RequirementSet::new().max("density", 1.0)));

        assert!(text.starts_with(NO_CANDIDATES_NOTICE));
        assert!(text.contains("Consider relaxing"));
        assert!(text.contains("- density (3 rejection(s))"));
    }

    #[test]
    fn comparison_shows_signed_percentages() {
        let comparison = compare::run(
            &pool(),
            &MaterialId::new("Al"),
            &[MaterialId::new("Mg")],
            None,
        )
        .unwrap();

        let text = render_comparison(&comparison);
        assert!(text.contains("Baseline: Al"));
        assert!(text.contains("  density: 1.74 (-35.6%)"));
    }
}
