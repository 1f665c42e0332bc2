use crate::core::models::candidate::{Candidate, Provenance};
use crate::core::models::property::{Measurement, PropertyVector, PropertyVectorBuilder};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const ID_COLUMN: &str = "material_id";
const UNCERTAINTY_SUFFIX: &str = "_uncertainty";
const CONFIDENCE_SUFFIX: &str = "_confidence";
const METADATA_COLUMNS: &[&str] = &[
    ID_COLUMN,
    "name",
    "source",
    "energy_above_hull",
    "is_stable",
    "is_theoretical",
    "crystal_system",
    "elements",
];

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Missing required column '{column}' in '{path}'")]
    MissingColumn { path: String, column: &'static str },
    #[error("Invalid record {record} in '{path}': {reason}")]
    InvalidRecord {
        path: String,
        record: usize,
        reason: String,
    },
    #[error("Duplicate material id '{id}' in '{path}'")]
    DuplicateId { path: String, id: String },
    #[error("Unsupported candidate file '{path}': expected a .csv or .toml extension")]
    UnsupportedFormat { path: String },
}

/// Reads a candidate pool, choosing the format from the extension.
pub fn read_pool(path: &Path) -> Result<Vec<Candidate>, PoolError> {
    let label = path.to_string_lossy().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let pool = match extension.as_deref() {
        Some("csv") => {
            let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
                path: label.clone(),
                source: e,
            })?;
            parse_csv(file, &label)?
        }
        Some("toml") => {
            let content = std::fs::read_to_string(path).map_err(|e| PoolError::Io {
                path: label.clone(),
                source: e,
            })?;
            parse_toml(&content, &label)?
        }
        _ => return Err(PoolError::UnsupportedFormat { path: label }),
    };

    info!(path = %label, candidates = pool.len(), "Candidate pool loaded.");
    Ok(pool)
}

struct CsvLayout {
    id: usize,
    metadata: BTreeMap<&'static str, usize>,
    /// Property name, value column, uncertainty column, confidence column.
    properties: Vec<(String, usize, Option<usize>, Option<usize>)>,
}

impl CsvLayout {
    fn from_headers(headers: &csv::StringRecord, label: &str) -> Result<Self, PoolError> {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        let position = |name: &str| names.iter().position(|h| *h == name);

        let id = position(ID_COLUMN).ok_or_else(|| PoolError::MissingColumn {
            path: label.to_string(),
            column: ID_COLUMN,
        })?;
        let metadata = METADATA_COLUMNS
            .iter()
            .filter_map(|&column| position(column).map(|i| (column, i)))
            .collect();

        let is_property = |name: &str| !name.is_empty() && !METADATA_COLUMNS.contains(&name);
        let attached = |name: &str, suffix: &str| {
            name.strip_suffix(suffix)
                .is_some_and(|base| is_property(base) && position(base).is_some())
        };

        let properties = names
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, name)| {
                is_property(name)
                    && !attached(name, UNCERTAINTY_SUFFIX)
                    && !attached(name, CONFIDENCE_SUFFIX)
            })
            .map(|(i, name)| {
                let uncertainty = format!("{name}{UNCERTAINTY_SUFFIX}");
                let confidence = format!("{name}{CONFIDENCE_SUFFIX}");
                (
                    name.to_string(),
                    i,
                    position(uncertainty.as_str()),
                    position(confidence.as_str()),
                )
            })
            .collect();

        Ok(Self {
            id,
            metadata,
            properties,
        })
    }

    fn cell<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.metadata
            .get(column)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Parses a CSV candidate table. `label` names the source in errors.
pub fn parse_csv<R: Read>(reader: R, label: &str) -> Result<Vec<Candidate>, PoolError> {
    let csv_error = |e: csv::Error| PoolError::Csv {
        path: label.to_string(),
        source: e,
    };
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let layout = CsvLayout::from_headers(&headers, label)?;

    let mut seen = HashSet::new();
    let mut pool = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(csv_error)?;
        let number = index + 1;
        let invalid = |reason: String| PoolError::InvalidRecord {
            path: label.to_string(),
            record: number,
            reason,
        };

        let id = record
            .get(layout.id)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| invalid("empty material_id".to_string()))?;
        if !seen.insert(id.to_string()) {
            return Err(PoolError::DuplicateId {
                path: label.to_string(),
                id: id.to_string(),
            });
        }

        let mut properties = PropertyVector::builder();
        for (name, value_col, uncertainty_col, confidence_col) in &layout.properties {
            let cell = |col: &Option<usize>| {
                col.and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
            };
            let uncertainty = cell(uncertainty_col)
                .map(|v| parse_number(v, &format!("{name}{UNCERTAINTY_SUFFIX}")))
                .transpose()
                .map_err(invalid)?;
            let confidence = cell(confidence_col)
                .map(|v| parse_number(v, &format!("{name}{CONFIDENCE_SUFFIX}")))
                .transpose()
                .map_err(invalid)?;
            properties = match cell(&Some(*value_col)) {
                None => properties.missing(name),
                Some(raw) => match raw.parse::<f64>() {
                    Ok(value) => {
                        properties.measurement(name, measurement(value, uncertainty, confidence))
                    }
                    Err(_) => properties.category(name, raw),
                },
            };
        }

        let mut provenance = Provenance::new(layout.cell(&record, "source").unwrap_or(label));
        provenance.energy_above_hull = layout
            .cell(&record, "energy_above_hull")
            .map(|v| parse_number(v, "energy_above_hull"))
            .transpose()
            .map_err(invalid)?;
        provenance.is_stable = layout
            .cell(&record, "is_stable")
            .map(|v| parse_flag(v, "is_stable"))
            .transpose()
            .map_err(invalid)?;
        provenance.is_theoretical = layout
            .cell(&record, "is_theoretical")
            .map(|v| parse_flag(v, "is_theoretical"))
            .transpose()
            .map_err(invalid)?;
        provenance.crystal_system = layout.cell(&record, "crystal_system").map(str::to_string);

        let name = layout.cell(&record, "name").unwrap_or(id);
        let mut candidate =
            Candidate::new(id, name, properties.build()).with_provenance(provenance);
        if let Some(elements) = layout.cell(&record, "elements") {
            candidate = candidate.with_elements(split_elements(elements));
        }
        debug!(material = id, "Parsed candidate record.");
        pool.push(candidate);
    }
    Ok(pool)
}

#[derive(Debug, Deserialize)]
struct TomlPool {
    #[serde(default)]
    candidates: Vec<TomlCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlCandidate {
    material_id: String,
    name: Option<String>,
    source: Option<String>,
    energy_above_hull: Option<f64>,
    is_stable: Option<bool>,
    is_theoretical: Option<bool>,
    crystal_system: Option<String>,
    elements: Option<Vec<String>>,
    #[serde(default)]
    properties: BTreeMap<String, TomlProperty>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlProperty {
    Number(f64),
    Text(String),
    Detailed(DetailedValue),
}

/// A table without `value` is an explicit missing value.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedValue {
    value: Option<f64>,
    uncertainty: Option<f64>,
    confidence: Option<f64>,
}

/// Parses a TOML pool made of `[[candidates]]` tables.
pub fn parse_toml(content: &str, label: &str) -> Result<Vec<Candidate>, PoolError> {
    let parsed: TomlPool = toml::from_str(content).map_err(|e| PoolError::Toml {
        path: label.to_string(),
        source: e,
    })?;

    let mut seen = HashSet::new();
    let mut pool = Vec::with_capacity(parsed.candidates.len());
    for (index, entry) in parsed.candidates.into_iter().enumerate() {
        if entry.material_id.trim().is_empty() {
            return Err(PoolError::InvalidRecord {
                path: label.to_string(),
                record: index + 1,
                reason: "empty material_id".to_string(),
            });
        }
        if !seen.insert(entry.material_id.clone()) {
            return Err(PoolError::DuplicateId {
                path: label.to_string(),
                id: entry.material_id,
            });
        }

        let properties = entry
            .properties
            .iter()
            .fold(PropertyVector::builder(), |builder, (name, property)| {
                add_toml_property(builder, name, property)
            })
            .build();
        let provenance = Provenance {
            source: entry.source.unwrap_or_else(|| label.to_string()),
            energy_above_hull: entry.energy_above_hull,
            is_stable: entry.is_stable,
            is_theoretical: entry.is_theoretical,
            crystal_system: entry.crystal_system,
        };
        let name = entry.name.as_deref().unwrap_or(&entry.material_id);
        let mut candidate = Candidate::new(entry.material_id.as_str(), name, properties)
            .with_provenance(provenance);
        if let Some(elements) = entry.elements {
            candidate = candidate.with_elements(elements);
        }
        pool.push(candidate);
    }
    Ok(pool)
}

fn add_toml_property(
    builder: PropertyVectorBuilder,
    name: &str,
    property: &TomlProperty,
) -> PropertyVectorBuilder {
    match property {
        TomlProperty::Number(value) => builder.numeric(name, *value),
        TomlProperty::Text(tier) => builder.category(name, tier),
        TomlProperty::Detailed(DetailedValue { value: None, .. }) => builder.missing(name),
        TomlProperty::Detailed(DetailedValue {
            value: Some(value),
            uncertainty,
            confidence,
        }) => builder.measurement(name, measurement(*value, *uncertainty, *confidence)),
    }
}

fn measurement(value: f64, uncertainty: Option<f64>, confidence: Option<f64>) -> Measurement {
    let base = match confidence {
        Some(c) => Measurement::predicted(value, c),
        None => Measurement::new(value),
    };
    match uncertainty {
        Some(u) => base.with_uncertainty(u),
        None => base,
    }
}

fn parse_number(raw: &str, column: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("column '{column}' expects a number, got '{raw}'"))
}

fn parse_flag(raw: &str, column: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(format!("column '{column}' expects true or false, got '{raw}'")),
    }
}

fn split_elements(raw: &str) -> Vec<&str> {
    raw.split(|c: char| c.is_whitespace() || c == ';')
        .filter(|s| !s.is_empty())
        .collect()
}
