//! JSON extraction from free-form LLM output
//!
//! Models wrap their JSON in prose, code fences or half-finished lists.
//! Candidates are tried in this order, and the first one that fits the
//! requested shape wins:
//! 1. the greedy `[...]` span across newlines
//! 2. the greedy `{...}` span across newlines
//! 3. every value that parses starting at a `[`, left to right
//! 4. every value that parses starting at a `{`, left to right
//!
//! Parse failures are never surfaced; they just move on to the next
//! candidate.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::MatchRecord;

static ARRAY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

static OBJECT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Iterate over every JSON value found in `text`, in priority order
pub fn json_candidates(text: &str) -> impl Iterator<Item = Value> + '_ {
    let greedy = [&*ARRAY_REGEX, &*OBJECT_REGEX]
        .into_iter()
        .filter_map(move |re| re.find(text))
        .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok());

    greedy.chain(scan(text, '[')).chain(scan(text, '{'))
}

/// Values parsed at each occurrence of `open`, left to right
fn scan(text: &str, open: char) -> impl Iterator<Item = Value> + '_ {
    text.match_indices(open)
        .filter_map(move |(pos, _)| parse_prefix(&text[pos..]))
}

/// Parse the JSON value at the start of `text`, ignoring whatever follows
fn parse_prefix(text: &str) -> Option<Value> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()
        .and_then(|res| res.ok())
}

/// Extract a list of JSON objects.
///
/// Accepts an array whose elements are all objects, or a single object
/// which is wrapped into a one-element list. Returns an empty list when
/// nothing fits.
pub fn extract_records(text: &str) -> Vec<Map<String, Value>> {
    json_candidates(text)
        .find_map(|value| match value {
            Value::Array(items) => objects_only(items),
            Value::Object(obj) => Some(vec![obj]),
            _ => None,
        })
        .unwrap_or_default()
}

fn objects_only(items: Vec<Value>) -> Option<Vec<Map<String, Value>>> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(obj) => Some(obj),
            _ => None,
        })
        .collect()
}

/// Extract ranked match records from the final crew output
pub fn extract_matches(text: &str) -> Vec<MatchRecord> {
    extract_records(text)
        .into_iter()
        .map(MatchRecord::from)
        .collect()
}

/// Extract a list of typed records, skipping elements that do not deserialize
pub fn extract_list<T: DeserializeOwned>(text: &str) -> Vec<T> {
    extract_records(text)
        .into_iter()
        .filter_map(|obj| serde_json::from_value(Value::Object(obj)).ok())
        .collect()
}

/// Extract the first JSON object that deserializes into `T`
pub fn extract_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    json_candidates(text)
        .filter(|v| v.is_object())
        .find_map(|v| serde_json::from_value(v).ok())
}
