use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller-defined identifier for a cluster or scene object.
///
/// Either an integer or a string; round-tripped verbatim through every
/// request and response. Serialized untagged, so a JSON number stays a
/// number and a string stays a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectId {
    Index(u64),
    Name(String),
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        Self::Index(id)
    }
}

impl From<&str> for ObjectId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(id) => write!(f, "#{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_verbatim() {
        let ids = vec![ObjectId::from(7u64), ObjectId::from("andromeda/core-3")];
        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, r#"[7,"andromeda/core-3"]"#);
        let back: Vec<ObjectId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ids);
    }

    #[test]
    fn test_display() {
        assert_eq!(ObjectId::from(42u64).to_string(), "#42");
        assert_eq!(ObjectId::from("sol").to_string(), "sol");
    }
}
