use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::PortalError;

/// Fields echoed back by a password reset. `error` is set when the backend
/// answered without a success message even though the call itself succeeded.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ResetOutcome {
    #[serde(rename = "SuccessMessage")]
    pub success_message: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Normalized per-identity outcome of one command. Serializes to its raw form
/// (a bare bool, string, list, ...) with failures as `{"error": message}`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
    Timestamp(String),
    Records(Vec<Value>),
    Reset(ResetOutcome),
    Error { error: String },
}

impl AttributeValue {
    pub fn error(msg: impl Into<String>) -> Self { AttributeValue::Error { error: msg.into() } }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AttributeValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool { matches!(self, AttributeValue::Error { .. }) }
}

impl From<PortalError> for AttributeValue {
    fn from(err: PortalError) -> Self { AttributeValue::error(err.to_string()) }
}

/// Insertion-ordered identity → value mapping. Re-inserting a key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    entries: Vec<(String, AttributeValue)>,
    index: HashMap<String, usize>,
}

impl ResultSet {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, key: impl Into<String>, value: AttributeValue) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> { self.entries.iter().map(|(k, _)| k.as_str()) }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &AttributeValue) -> bool,
    {
        self.entries.retain(|(k, v)| keep(k, v));
        self.index = self.entries.iter().enumerate().map(|(i, (k, _))| (k.clone(), i)).collect();
    }

    pub fn error_count(&self) -> usize { self.entries.iter().filter(|(_, v)| v.is_error()).count() }
}

impl FromIterator<(String, AttributeValue)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        let mut rs = ResultSet::new();
        for (k, v) in iter { rs.insert(k, v); }
        rs
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
