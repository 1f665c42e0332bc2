use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueOrigin {
    #[default]
    Measured,
    Predicted,
}

/// A single numeric property value with its optional error bar.
///
/// `confidence` is only meaningful for predicted values and lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub uncertainty: Option<f64>,
    pub confidence: Option<f64>,
    pub origin: ValueOrigin,
}

impl Measurement {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            uncertainty: None,
            confidence: None,
            origin: ValueOrigin::Measured,
        }
    }

    pub fn predicted(value: f64, confidence: f64) -> Self {
        Self {
            value,
            uncertainty: None,
            confidence: Some(confidence),
            origin: ValueOrigin::Predicted,
        }
    }

    pub fn with_uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = Some(uncertainty);
        self
    }

    #[inline]
    pub fn is_low_confidence(&self, min_confidence: f64) -> bool {
        self.confidence.is_some_and(|c| c < min_confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyValue {
    Numeric(Measurement),
    Category(String),
}

/// Immutable mapping from property name to an optional value.
///
/// A key mapped to `None` is an explicitly missing value; it is never read as zero.
/// Once built the vector cannot be modified, use [`PropertyVectorBuilder`] to create one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyVector {
    entries: BTreeMap<String, Option<PropertyValue>>,
}

impl PropertyVector {
    pub fn builder() -> PropertyVectorBuilder {
        PropertyVectorBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.get(name).and_then(Option::as_ref)
    }

    pub fn numeric(&self, name: &str) -> Option<Measurement> {
        match self.get(name) {
            Some(PropertyValue::Numeric(m)) => Some(*m),
            _ => None,
        }
    }

    pub fn category(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(PropertyValue::Category(tier)) => Some(tier.as_str()),
            _ => None,
        }
    }

    /// True when the key is known to the vector, even if its value is missing.
    pub fn has_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_missing(&self, name: &str) -> bool {
        self.get(name).is_none()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&PropertyValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Option<PropertyValue>)> for PropertyVector {
    fn from_iter<T: IntoIterator<Item = (String, Option<PropertyValue>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PropertyVectorBuilder {
    entries: BTreeMap<String, Option<PropertyValue>>,
}

impl PropertyVectorBuilder {
    pub fn numeric(self, name: &str, value: f64) -> Self {
        self.measurement(name, Measurement::new(value))
    }

    pub fn measurement(mut self, name: &str, measurement: Measurement) -> Self {
        self.entries
            .insert(name.to_string(), Some(PropertyValue::Numeric(measurement)));
        self
    }

    pub fn category(mut self, name: &str, tier: &str) -> Self {
        self.entries.insert(
            name.to_string(),
            Some(PropertyValue::Category(tier.to_string())),
        );
        self
    }

    pub fn missing(mut self, name: &str) -> Self {
        self.entries.insert(name.to_string(), None);
        self
    }

    pub fn build(self) -> PropertyVector {
        PropertyVector {
            entries: self.entries,
        }
    }
}
