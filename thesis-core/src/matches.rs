//! Match records produced by the final crew stage

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys every well-formed match record carries
pub const MATCH_KEYS: &[&str] = &[
    "rank",
    "title",
    "company_or_institution",
    "fit_score",
    "url",
    "match_summary",
];

/// One ranked posting relative to the resume.
///
/// Kept as an ordered JSON object so records round-trip exactly and the
/// CSV header follows the key order the model produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchRecord(Map<String, Value>);

impl MatchRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render a field for display: strings raw, other values as JSON
    pub fn display_field(&self, key: &str) -> Option<String> {
        self.0.get(key).map(value_to_cell)
    }

    /// True when all [`MATCH_KEYS`] are present
    pub fn has_required_keys(&self) -> bool {
        MATCH_KEYS.iter().all(|k| self.0.contains_key(*k))
    }
}

impl From<Map<String, Value>> for MatchRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Render a JSON value as a flat cell: strings without quotes, null empty
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
