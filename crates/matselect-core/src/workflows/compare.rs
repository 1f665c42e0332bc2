use crate::core::models::candidate::Candidate;
use crate::core::models::ids::MaterialId;
use crate::engine::error::EngineError;
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDelta {
    pub property: String,
    pub baseline: Option<f64>,
    pub value: Option<f64>,
    /// Change from the baseline in percent, rounded to one decimal. `None` when
    /// either value is missing or the baseline is zero.
    pub percent_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeComparison {
    pub material_id: MaterialId,
    pub name: String,
    pub deltas: Vec<PropertyDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub baseline: MaterialId,
    pub properties: Vec<String>,
    pub alternatives: Vec<AlternativeComparison>,
}

/// Compares `alternatives` against `baseline` property by property.
///
/// Without an explicit property list the baseline's numeric properties are used, in
/// name order.
#[instrument(skip_all, name = "comparison_workflow")]
pub fn run(
    pool: &[Candidate],
    baseline: &MaterialId,
    alternatives: &[MaterialId],
    properties: Option<&[String]>,
) -> Result<Comparison, EngineError> {
    if alternatives.is_empty() {
        return Err(EngineError::InvalidRequest(
            "comparison needs at least one alternative".to_string(),
        ));
    }
    let base = find(pool, baseline)?;
    let properties: Vec<String> = match properties {
        Some(list) => list.to_vec(),
        None => base
            .properties()
            .names()
            .filter(|name| base.properties().numeric(name).is_some())
            .map(str::to_string)
            .collect(),
    };
    debug!(
        baseline = %baseline,
        alternatives = alternatives.len(),
        properties = properties.len(),
        "Comparing against baseline."
    );

    let alternatives = alternatives
        .iter()
        .map(|id| {
            let alternative = find(pool, id)?;
            let deltas = properties
                .iter()
                .map(|property| {
                    let reference = base.measurement(property).map(|m| m.value);
                    let value = alternative.measurement(property).map(|m| m.value);
                    PropertyDelta {
                        property: property.clone(),
                        baseline: reference,
                        value,
                        percent_change: reference
                            .zip(value)
                            .and_then(|(b, v)| percent_change(b, v)),
                    }
                })
                .collect();
            Ok(AlternativeComparison {
                material_id: alternative.id.clone(),
                name: alternative.name.clone(),
                deltas,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    Ok(Comparison {
        baseline: baseline.clone(),
        properties,
        alternatives,
    })
}

/// Percentage change from `baseline` to `value`, rounded to one decimal place.
pub fn percent_change(baseline: f64, value: f64) -> Option<f64> {
    if baseline == 0.0 || !baseline.is_finite() || !value.is_finite() {
        return None;
    }
    let percent = (value - baseline) / baseline.abs() * 100.0;
    Some((percent * 10.0).round() / 10.0)
}

fn find<'a>(pool: &'a [Candidate], id: &MaterialId) -> Result<&'a Candidate, EngineError> {
    pool.iter()
        .find(|c| &c.id == id)
        .ok_or_else(|| EngineError::InvalidRequest(format!("material '{id}' is not in the pool")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::property::PropertyVector;

    fn pool() -> Vec<Candidate> {
        vec![
            Candidate::new(
                "steel",
                "Steel",
                PropertyVector::builder()
                    .numeric("density", 7.85)
                    .numeric("cost_per_kg", 1.0)
                    .numeric("thermal_expansion", 0.0)
                    .category("corrosion_resistance", "fair")
                    .build(),
            ),
            Candidate::new(
                "al6061",
                "Aluminium 6061",
                PropertyVector::builder()
                    .numeric("density", 2.70)
                    .numeric("cost_per_kg", 3.0)
                    .numeric("thermal_expansion", 23.6)
                    .build(),
            ),
            Candidate::new(
                "cfrp",
                "Carbon fibre",
                PropertyVector::builder()
                    .numeric("density", 1.6)
                    .missing("cost_per_kg")
                    .build(),
            ),
        ]
    }

    #[test]
    fn percent_change_is_rounded_to_one_decimal() {
        assert_eq!(percent_change(7.85, 2.70), Some(-65.6));
        assert_eq!(percent_change(1.0, 3.0), Some(200.0));
        assert_eq!(percent_change(0.0, 3.0), None);
    }

    #[test]
    fn default_properties_are_the_baseline_numeric_properties() {
        let comparison = run(
            &pool(),
            &MaterialId::new("steel"),
            &[MaterialId::new("al6061")],
            None,
        )
        .unwrap();

        assert_eq!(
            comparison.properties,
            vec!["cost_per_kg", "density", "thermal_expansion"]
        );
        let deltas = &comparison.alternatives[0].deltas;
        assert_eq!(deltas[0].percent_change, Some(200.0));
        assert_eq!(deltas[1].percent_change, Some(-65.6));
        assert_eq!(deltas[2].baseline, Some(0.0));
        assert_eq!(deltas[2].percent_change, None);
    }

    #[test]
    fn missing_alternative_value_has_no_percentage() {
        let properties = vec!["cost_per_kg".to_string()];
        let comparison = run(
            &pool(),
            &MaterialId::new("steel"),
            &[MaterialId::new("cfrp")],
            Some(&properties),
        )
        .unwrap();

        let delta = &comparison.alternatives[0].deltas[0];
        assert_eq!(delta.value, None);
        assert_eq!(delta.percent_change, None);
    }

    #[test]
    fn unknown_material_is_rejected() {
        let err = run(
            &pool(),
            &MaterialId::new("steel"),
            &[MaterialId::new("unobtainium")],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(msg) if msg.contains("unobtainium")));
    }
}
