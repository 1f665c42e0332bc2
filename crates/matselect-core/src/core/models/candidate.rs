use super::ids::MaterialId;
use super::property::{Measurement, PropertyVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Property name under which the thermodynamic stability indicator is addressable.
pub const STABILITY_PROPERTY: &str = "energy_above_hull";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: String,
    /// Energy above the convex hull in eV/atom; 0.0 means thermodynamically stable.
    pub energy_above_hull: Option<f64>,
    pub is_stable: Option<bool>,
    pub is_theoretical: Option<bool>,
    pub crystal_system: Option<String>,
}

impl Provenance {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    pub fn with_energy_above_hull(mut self, e_hull: f64) -> Self {
        self.energy_above_hull = Some(e_hull);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: MaterialId,
    pub name: String,
    /// Element symbols of the composition, `None` when the source did not report it.
    pub elements: Option<BTreeSet<String>>,
    pub provenance: Provenance,
    properties: PropertyVector,
}

impl Candidate {
    pub fn new(id: impl Into<MaterialId>, name: &str, properties: PropertyVector) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            elements: None,
            provenance: Provenance::default(),
            properties,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements = Some(elements.into_iter().map(Into::into).collect());
        self
    }

    pub fn properties(&self) -> &PropertyVector {
        &self.properties
    }

    /// Numeric lookup that also resolves the provenance stability indicator.
    pub fn measurement(&self, name: &str) -> Option<Measurement> {
        self.properties.numeric(name).or_else(|| {
            if name == STABILITY_PROPERTY {
                self.provenance.energy_above_hull.map(Measurement::new)
            } else {
                None
            }
        })
    }

    pub fn category(&self, name: &str) -> Option<&str> {
        self.properties.category(name)
    }

    pub fn stability_indicator(&self) -> Option<f64> {
        self.measurement(STABILITY_PROPERTY).map(|m| m.value)
    }

    /// True when the candidate reports the property at all, even as an explicit missing value.
    pub fn knows_property(&self, name: &str) -> bool {
        self.properties.has_key(name)
            || (name == STABILITY_PROPERTY && self.provenance.energy_above_hull.is_some())
    }
}
