//! Typed views over the portal's inconsistent response shapes.
//!
//! Most module endpoints answer `{items: [{data, properties: {fields}}]}`, the
//! history endpoint answers a bare list, and any endpoint may answer an
//! `{ErrorMessage: ...}` envelope instead. `classify` is the single place that
//! decides which one a body is.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{PortalError, PortalResult};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl FieldSpec {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemProperties {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModuleItem {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub properties: ItemProperties,
}

impl ModuleItem {
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleResult {
    pub items: Vec<ModuleItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleResponse {
    Items(ModuleResult),
    HistoryList(Vec<HistoryEntry>),
    ErrorEnvelope(String),
}

/// Extract the message of an `{ErrorMessage: ...}` envelope, if `v` is one.
pub fn error_envelope(v: &Value) -> Option<String> {
    let msg = v.as_object()?.get("ErrorMessage")?;
    Some(match msg {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

pub fn classify(v: Value) -> PortalResult<ModuleResponse> {
    if let Some(msg) = error_envelope(&v) {
        return Ok(ModuleResponse::ErrorEnvelope(msg));
    }
    match v {
        Value::Object(mut obj) => match obj.remove("items") {
            Some(items @ Value::Array(_)) => {
                let items: Vec<ModuleItem> = serde_json::from_value(items)
                    .map_err(|e| PortalError::UnexpectedShape(format!("module items: {e}")))?;
                Ok(ModuleResponse::Items(ModuleResult { items }))
            }
            Some(Value::Null) | None => Err(PortalError::UnexpectedShape("object without 'items' list".into())),
            Some(_) => Err(PortalError::UnexpectedShape("'items' is not a list".into())),
        },
        arr @ Value::Array(_) => {
            let entries: Vec<HistoryEntry> = serde_json::from_value(arr)
                .map_err(|e| PortalError::UnexpectedShape(format!("history list: {e}")))?;
            Ok(ModuleResponse::HistoryList(entries))
        }
        other => Err(PortalError::UnexpectedShape(format!("expected object or list, got {}", kind_of(&other)))),
    }
}

impl ModuleResponse {
    pub fn into_items(self) -> PortalResult<ModuleResult> {
        match self {
            ModuleResponse::Items(m) => Ok(m),
            ModuleResponse::ErrorEnvelope(msg) => Err(PortalError::BackendError(msg)),
            ModuleResponse::HistoryList(_) => Err(PortalError::UnexpectedShape("expected items, got a bare list".into())),
        }
    }

    pub fn into_history(self) -> PortalResult<Vec<HistoryEntry>> {
        match self {
            ModuleResponse::HistoryList(h) => Ok(h),
            ModuleResponse::ErrorEnvelope(msg) => Err(PortalError::BackendError(msg)),
            // an identity without history comes back as an empty items object
            ModuleResponse::Items(m) if m.items.is_empty() => Ok(Vec::new()),
            ModuleResponse::Items(_) => Err(PortalError::UnexpectedShape("expected a history list, got items".into())),
        }
    }
}

pub(crate) fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
