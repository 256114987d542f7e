use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{PortalError, PortalResult};
use crate::gateway::response::{error_envelope, kind_of};
use crate::gateway::Portal;

/// One principal as returned by the search endpoint. Name and alias fields
/// usually arrive as single-element lists but may be bare strings or hold
/// nulls; everything not modelled here stays in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IdentityRecord {
    #[serde(default, deserialize_with = "loose_string")]
    pub zid: Option<String>,
    #[serde(default, rename = "primaryUserName", deserialize_with = "loose_strings")]
    pub aliases: Option<Vec<String>>,
    #[serde(default, rename = "firstName", deserialize_with = "loose_strings")]
    pub first_name: Option<Vec<String>>,
    #[serde(default, rename = "lastName", deserialize_with = "loose_strings")]
    pub last_name: Option<Vec<String>>,
    #[serde(default, rename = "preferredName", deserialize_with = "loose_strings")]
    pub preferred_name: Option<Vec<String>>,
    /// Account health per alias, keyed by lowercase alias.
    #[serde(default, rename = "userNameHealth", deserialize_with = "loose_map")]
    pub health: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// A string or a list of strings; non-string elements are dropped.
fn loose_strings<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(s)) => Some(vec![s]),
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

fn loose_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Array(items)) => items.into_iter().find_map(|v| v.as_str().map(str::to_string)),
        _ => None,
    })
}

fn loose_map<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Map<String, Value>>, D::Error> {
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Object(m)) => Some(m),
        _ => None,
    })
}

fn first_non_empty(v: &Option<Vec<String>>) -> Option<&str> {
    v.as_ref().and_then(|l| l.first()).map(String::as_str).filter(|s| !s.is_empty())
}

impl IdentityRecord {
    pub fn from_value(v: Value) -> PortalResult<Self> {
        serde_json::from_value(v).map_err(|e| PortalError::UnexpectedShape(format!("identity record: {e}")))
    }

    pub fn first_name(&self) -> &str { first_non_empty(&self.first_name).unwrap_or("") }

    pub fn last_name(&self) -> &str { first_non_empty(&self.last_name).unwrap_or("") }

    /// Preferred name when set, first name otherwise.
    pub fn display_name(&self) -> String {
        let given = first_non_empty(&self.preferred_name).unwrap_or_else(|| self.first_name());
        format!("{} {}", given, self.last_name()).trim().to_string()
    }

    pub fn primary_alias(&self) -> Option<&str> { first_non_empty(&self.aliases) }
}

/// Reduce a `Vaultzid=<id>,ou=...` distinguished name to the bare id.
pub fn bare_record_id(zid: &str) -> &str {
    let head = zid.split(',').next().unwrap_or(zid).trim();
    match head.split_once('=') {
        Some((attr, id)) if attr.eq_ignore_ascii_case("vaultzid") => id.trim(),
        _ => head,
    }
}

/// Pick the record for `identity_key` out of a raw search response.
/// More than one match is resolved by taking the first.
pub fn select_first(identity_key: &str, response: Value) -> PortalResult<IdentityRecord> {
    if let Some(msg) = error_envelope(&response) {
        return Err(PortalError::BackendError(format!("unable to get user {}: {}", identity_key, msg)));
    }
    match response {
        Value::Array(mut matches) => {
            if matches.is_empty() {
                return Err(PortalError::NotFound(format!("user {}", identity_key)));
            }
            if matches.len() > 1 {
                debug!(target: "hdtools::identity", "{} matches for {}, taking the first", matches.len(), identity_key);
            }
            IdentityRecord::from_value(matches.swap_remove(0))
        }
        other => Err(PortalError::UnexpectedShape(format!(
            "unable to get user {}: search returned {}", identity_key, kind_of(&other)
        ))),
    }
}

pub fn resolve(portal: &dyn Portal, identity_key: &str) -> PortalResult<IdentityRecord> {
    select_first(identity_key, portal.search(identity_key)?)
}

/// Record id and primary alias. An absent or empty alias list is a malformed record.
pub fn extract_key_and_alias(record: &IdentityRecord) -> PortalResult<(String, String)> {
    let zid = record.zid.as_deref().map(str::trim).filter(|z| !z.is_empty()).ok_or(PortalError::MissingField("id"))?;
    let alias = record
        .aliases
        .as_ref()
        .and_then(|l| l.first())
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .ok_or(PortalError::MissingField("alias"))?;
    let id = bare_record_id(zid).to_string();
    debug!(target: "hdtools::identity", "extracted alias {} and id {}", alias, id);
    Ok((id, alias.to_string()))
}
