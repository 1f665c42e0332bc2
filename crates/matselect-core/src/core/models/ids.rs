use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(String);

impl MaterialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MaterialId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MaterialId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![
            MaterialId::from("mp-8"),
            MaterialId::from("mp-13"),
            MaterialId::from("mp-1"),
        ];
        ids.sort();
        let ordered: Vec<_> = ids.iter().map(MaterialId::as_str).collect();
        assert_eq!(ordered, vec!["mp-1", "mp-13", "mp-8"]);
    }

    #[test]
    fn display_prints_raw_identifier() {
        assert_eq!(MaterialId::new("mp-149").to_string(), "mp-149");
    }
}
