use crate::core::models::candidate::Candidate;
use crate::core::models::ids::MaterialId;
use crate::core::models::requirement::{FailureReason, Operator, RequirementSet};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// A candidate removed by the constraint filter and the first requirement it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub material_id: MaterialId,
    pub property: String,
    pub operator: Operator,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub survivors: Vec<Candidate>,
    pub rejected: Vec<Rejection>,
}

/// Keeps the candidates that satisfy every requirement, in pool order.
///
/// A candidate without data for a required property is rejected. An empty outcome is
/// a valid result, not an error.
#[instrument(skip_all, name = "constraint_filter_task")]
pub fn run(pool: Vec<Candidate>, requirements: &RequirementSet) -> FilterOutcome {
    info!(
        pool_size = pool.len(),
        requirements = requirements.len(),
        "Applying hard constraints."
    );

    let mut outcome = FilterOutcome::default();
    for candidate in pool {
        match requirements.first_failure(&candidate) {
            None => outcome.survivors.push(candidate),
            Some((requirement, reason)) => {
                if let FailureReason::UnknownTier { tier } = &reason {
                    warn!(
                        material = %candidate.id,
                        property = %requirement.property,
                        tier = %tier,
                        "Candidate reports a category tier that is not on the requirement scale."
                    );
                }
                debug!(
                    material = %candidate.id,
                    property = %requirement.property,
                    reason = %reason,
                    "Candidate rejected."
                );
                outcome.rejected.push(Rejection {
                    material_id: candidate.id,
                    property: requirement.property.clone(),
                    operator: requirement.operator(),
                    reason,
                });
            }
        }
    }

    info!(
        survivors = outcome.survivors.len(),
        rejected = outcome.rejected.len(),
        "Constraint filtering complete."
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::property::PropertyVector;

    fn material(id: &str, density: Option<f64>, band_gap: f64) -> Candidate {
        let mut props = PropertyVector::builder().numeric("band_gap", band_gap);
        props = match density {
            Some(d) => props.numeric("density", d),
            None => props.missing("density"),
        };
        Candidate::new(id, id, props.build())
    }

    #[test]
    fn every_survivor_satisfies_every_requirement() {
        let requirements = RequirementSet::new()
            .max("density", 3.0)
            .min("band_gap", 0.0)
            .max("band_gap", 0.5);
        let pool = vec![
            material("Al", Some(2.70), 0.0),
            material("Mg", Some(1.74), 0.0),
            material("W", Some(19.3), 0.0),
            material("Si", Some(2.33), 1.1),
        ];

        let outcome = run(pool, &requirements);

        let ids: Vec<_> = outcome.survivors.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Al", "Mg"]);
        assert!(
            outcome
                .survivors
                .iter()
                .all(|c| requirements.is_satisfied_by(c))
        );
        assert_eq!(outcome.rejected.len(), 2);
    }

    #[test]
    fn candidate_without_required_property_is_rejected() {
        let requirements = RequirementSet::new().max("density", 3.0);
        let outcome = run(vec![material("X", None, 0.0)], &requirements);

        assert!(outcome.survivors.is_empty());
        assert_eq!(outcome.rejected[0].reason, FailureReason::MissingValue);
        assert_eq!(outcome.rejected[0].property, "density");
        assert_eq!(outcome.rejected[0].operator, Operator::Max);
    }

    #[test]
    fn rejection_records_first_failing_requirement() {
        let requirements = RequirementSet::new()
            .max("density", 3.0)
            .max("band_gap", 0.5);
        let outcome = run(vec![material("W", Some(19.3), 2.0)], &requirements);

        assert_eq!(outcome.rejected[0].property, "density");
        assert!(matches!(
            outcome.rejected[0].reason,
            FailureReason::AboveMaximum { .. }
        ));
    }

    #[test]
    fn empty_requirement_set_keeps_whole_pool() {
        let outcome = run(
            vec![material("A", None, 0.0), material("B", Some(1.0), 0.0)],
            &RequirementSet::new(),
        );
        assert_eq!(outcome.survivors.len(), 2);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn no_survivors_is_an_empty_outcome() {
        let requirements = RequirementSet::new().max("density", 0.1);
        let outcome = run(vec![material("Al", Some(2.7), 0.0)], &requirements);
        assert!(outcome.survivors.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
    }
}
