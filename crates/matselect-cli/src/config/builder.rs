use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileStabilityConfig};
use super::models::AppConfig;
use crate::cli::SelectionArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use matselect::core::models::requirement::{FlatValue, RequirementSet};
use matselect::engine::config::{EngineConfig, StabilityCurve};
use matselect::engine::error::EngineError;
use matselect::engine::request::RecommendationRequest;
use std::collections::BTreeMap;
use tracing::debug;

pub fn build_config(args: &SelectionArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let normalization = file_config.normalization.take().unwrap_or_default();
    let stability = file_config.stability.take().unwrap_or_default();
    let explanation = file_config.explanation.take().unwrap_or_default();

    let top_n = args.top_n.or(file_config.top_n).unwrap_or(defaults.top_n);

    let mut builder = EngineConfig::builder()
        .stability_curve(merge_stability_curve(&stability, &defaults)?)
        .default_top_n(top_n);
    if let Some(penalty) = args.missing_penalty.or(normalization.missing_penalty) {
        builder = builder.missing_penalty(penalty);
    }
    if let Some(confidence) = args.min_confidence.or(normalization.min_confidence) {
        builder = builder.min_confidence(confidence);
    }
    if let Some(threshold) = stability.highly_stable_threshold {
        builder = builder.highly_stable_threshold(threshold);
    }
    if let Some(margin) = explanation.comfortable_margin {
        builder = builder.comfortable_margin(margin);
    }
    if let Some(n) = explanation.max_tradeoffs {
        builder = builder.max_tradeoffs(n);
    }
    if let Some(density) = explanation.lightweight_density {
        builder = builder.lightweight_density(density);
    }
    if let Some(n) = file_config.exploration_size {
        builder = builder.exploration_size(n);
    }
    for (objective, weight) in file_config.weights.take().unwrap_or_default() {
        builder = builder.objective_weight(&objective, weight);
    }
    let engine = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let requirements = merge_requirements(
        file_config.requirements.take().unwrap_or_default(),
        &args.requirements,
    )?;

    let objective_names = if args.objectives.is_empty() {
        file_config.optimize.take().unwrap_or(defaults.objectives)
    } else {
        args.objectives.clone()
    };
    let request = RecommendationRequest::new(requirements)
        .optimize(&objective_names, &engine)?
        .objectives(file_config.objectives.take().unwrap_or_default())
        .top_n(top_n);

    debug!(
        requirements = request.requirements.len(),
        objectives = request.objectives.len(),
        top_n,
        "Configuration merged."
    );

    Ok(AppConfig {
        candidates: args.candidates.clone(),
        engine,
        request,
        json: args.json,
    })
}

/// `-r` entries override file requirements with the same key.
fn merge_requirements(
    mut entries: BTreeMap<String, FlatValue>,
    cli_requirements: &[String],
) -> Result<RequirementSet> {
    for raw in cli_requirements {
        let (key, value) = parser::parse_requirement(raw)?;
        entries.insert(key, value);
    }
    RequirementSet::from_flat(entries)
        .map_err(EngineError::from)
        .map_err(CliError::from)
}

fn merge_stability_curve(
    file_val: &FileStabilityConfig,
    defaults: &DefaultsConfig,
) -> Result<StabilityCurve> {
    let kind = file_val
        .curve
        .as_deref()
        .unwrap_or(&defaults.curve)
        .to_ascii_lowercase();
    let width = file_val.cutoff.unwrap_or(defaults.curve_width);
    let floor = file_val.floor.unwrap_or(defaults.curve_floor);
    match kind.as_str() {
        "linear" => Ok(StabilityCurve::Linear {
            cutoff: width,
            floor,
        }),
        "exponential" => Ok(StabilityCurve::Exponential {
            scale: width,
            floor,
        }),
        "none" => Ok(StabilityCurve::None),
        other => Err(CliError::Config(format!(
            "Unknown stability curve '{}'. Expected 'linear', 'exponential' or 'none'.",
            other
        ))),
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value_str) = parser::parse_key_value(kv_pair)?;

        match key {
            "top-n" => config.top_n = Some(parser::parse_number(key, value_str)?),
            "exploration-size" => {
                config.exploration_size = Some(parser::parse_number(key, value_str)?);
            }
            "normalization.missing-penalty" => {
                config
                    .normalization
                    .get_or_insert_with(Default::default)
                    .missing_penalty = Some(parser::parse_number(key, value_str)?);
            }
            "normalization.min-confidence" => {
                config
                    .normalization
                    .get_or_insert_with(Default::default)
                    .min_confidence = Some(parser::parse_number(key, value_str)?);
            }
            "stability.curve" => {
                config.stability.get_or_insert_with(Default::default).curve =
                    Some(value_str.to_string());
            }
            "stability.cutoff" => {
                config.stability.get_or_insert_with(Default::default).cutoff =
                    Some(parser::parse_number(key, value_str)?);
            }
            "stability.floor" => {
                config.stability.get_or_insert_with(Default::default).floor =
                    Some(parser::parse_number(key, value_str)?);
            }
            "stability.highly-stable-threshold" => {
                config
                    .stability
                    .get_or_insert_with(Default::default)
                    .highly_stable_threshold = Some(parser::parse_number(key, value_str)?);
            }
            "explanation.comfortable-margin" => {
                config
                    .explanation
                    .get_or_insert_with(Default::default)
                    .comfortable_margin = Some(parser::parse_number(key, value_str)?);
            }
            "explanation.max-tradeoffs" => {
                config
                    .explanation
                    .get_or_insert_with(Default::default)
                    .max_tradeoffs = Some(parser::parse_number(key, value_str)?);
            }
            "explanation.lightweight-density" => {
                config
                    .explanation
                    .get_or_insert_with(Default::default)
                    .lightweight_density = Some(parser::parse_number(key, value_str)?);
            }
            _ => {
                let Some(objective) = key.strip_prefix("weights.") else {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                };
                config
                    .weights
                    .get_or_insert_with(Default::default)
                    .insert(objective.to_string(), parser::parse_number(key, value_str)?);
            }
        }
    }
    Ok(config)
}
