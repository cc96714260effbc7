//! Wire contracts for Operations Desk saves.
//!
//! The engine in `ops_core` persists every entity as a type-tagged
//! [`Envelope`]. Those envelopes are grouped into per-subsystem sections and
//! written out as a single [`SaveSections`] document. Nothing in this crate
//! knows how an envelope payload is interpreted; that is the reviver's job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current version of the sectioned save format.
pub const SAVE_FORMAT_VERSION: u32 = 1;

/// A serialized entity: the registered type tag plus its field payload.
///
/// On the wire this is `{"type": "<tag>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub data: Value,
}

impl Envelope {
    pub fn new(type_tag: impl Into<String>, data: Value) -> Self {
        Self {
            type_tag: type_tag.into(),
            data,
        }
    }

    /// Parse a single envelope from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Top-level save document. Each section is itself a JSON string so a
/// section can be re-read in isolation without parsing the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSections {
    pub version: u32,
    pub action_board: String,
    pub organizations: String,
    #[serde(default)]
    pub tasks: String,
}

impl SaveSections {
    pub fn new(action_board: String, organizations: String, tasks: String) -> Self {
        Self {
            version: SAVE_FORMAT_VERSION,
            action_board,
            organizations,
            tasks,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_uses_type_key_on_the_wire() {
        let envelope = Envelope::new("Organization", json!({ "name": "ECorp" }));
        let encoded = envelope.to_json_string().unwrap();
        assert_eq!(encoded, r#"{"type":"Organization","data":{"name":"ECorp"}}"#);

        let decoded = Envelope::from_json_str(&encoded).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn sections_default_missing_tasks() {
        let sections =
            SaveSections::from_json_str(r#"{"version":1,"action_board":"{}","organizations":"{}"}"#)
                .unwrap();
        assert_eq!(sections.tasks, "");
        assert_eq!(sections.version, SAVE_FORMAT_VERSION);
    }
}
