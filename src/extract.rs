//! Attribute extractors: pure translations from decoded module JSON into the
//! normalized per-identity values the batch pipeline aggregates.

use serde_json::{Map, Value};

use crate::error::{PortalError, PortalResult};
use crate::gateway::{ModuleResult, Tristate};
use crate::identity::IdentityRecord;
use crate::pipeline::ResetOutcome;

/// Health value of an account that is in good standing.
pub const ACTIVE_SENTINEL: &str = "ACTIVE";

pub const ACCOUNTS_MODULE: &str = "usernamesHDStudent";
pub const LOCKOUT_FIELD: &str = "activeDirectoryLockout";
pub const PASSWORD_CHANGED_FIELD: &str = "passwordChangedTime";

pub const COURSES_MODULE: &str = "courses";
/// Course-key fragments of the study/work-abroad programs.
pub const ABROAD_PROGRAM_CODES: [&str; 3] = ["CAP", "ISA", "XCH"];

pub const EMPLOYMENT_MODULE: &str = "employeeRecords";
pub const EMPLOYMENT_ACTIVE_STATUS: &str = "A";
pub const DEPARTMENT_FIELD: &str = "departmentName";
pub const SUPERVISOR_FIELD: &str = "supervisorName";

pub const IDENTITY_MODULE: &str = "identity";

/// Raw active status from the record's health map, looked up by the primary
/// alias first and by `identity_key` otherwise.
pub fn health_status(record: &IdentityRecord, identity_key: &str) -> bool {
    let Some(health) = record.health.as_ref() else { return false };
    let mut candidates: Vec<String> = Vec::with_capacity(2);
    if let Some(alias) = record.primary_alias() { candidates.push(alias.to_lowercase()); }
    candidates.push(identity_key.to_lowercase());
    candidates
        .iter()
        .find_map(|k| health.get(k))
        .map(|v| match v {
            Value::String(s) => s == ACTIVE_SENTINEL,
            Value::Array(items) => items.first().and_then(|x| x.as_str()) == Some(ACTIVE_SENTINEL),
            _ => false,
        })
        .unwrap_or(false)
}

/// Lockout flags arrive as `false`, `""` or a truthy marker; a missing flag
/// counts as not locked.
pub fn normalize_lockout(flag: Option<&Value>) -> bool {
    flag.map(Tristate::from_json).unwrap_or(Tristate::Unknown).unwrap_or(false)
}

pub fn lockout_from_module(module: &ModuleResult) -> PortalResult<bool> {
    let first = module
        .items
        .first()
        .ok_or_else(|| PortalError::NotFound(format!("{} entry", ACCOUNTS_MODULE)))?;
    Ok(normalize_lockout(first.data.get(LOCKOUT_FIELD)))
}

/// Active only when the raw status is active and the account is not locked.
pub fn compose_active(raw_status: bool, locked: bool) -> bool {
    raw_status && !locked
}

pub fn abroad_from_keys(data: &Map<String, Value>) -> bool {
    data.keys().any(|k| {
        let upper = k.to_uppercase();
        ABROAD_PROGRAM_CODES.iter().any(|code| upper.contains(code))
    })
}

pub fn abroad_from_courses(module: &ModuleResult) -> bool {
    module.items.first().map(|item| abroad_from_keys(&item.data)).unwrap_or(false)
}

/// `field` of every current employment record, in backend order.
pub fn employment_field(module: &ModuleResult, field: &str) -> Vec<String> {
    module
        .items
        .iter()
        .filter(|item| {
            item.data_str("objectId") == Some(EMPLOYMENT_MODULE)
                && item.data_str("status") == Some(EMPLOYMENT_ACTIVE_STATUS)
        })
        .filter_map(|item| item.data_str(field).map(str::to_string))
        .collect()
}

pub fn password_changed(module: &ModuleResult, alias: &str) -> PortalResult<String> {
    let entry = module
        .items
        .iter()
        .find(|item| item.data_str("label").map(|l| l.eq_ignore_ascii_case(alias)).unwrap_or(false))
        .ok_or_else(|| PortalError::NotFound(format!("password entry for {}", alias)))?;
    match entry.data.get(PASSWORD_CHANGED_FIELD) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(PortalError::MissingField(PASSWORD_CHANGED_FIELD)),
        Some(other) => Ok(other.to_string()),
    }
}

fn string_field(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Fold the reset and description responses. The backend can answer 200
/// without resetting anything; only a non-empty `SuccessMessage` counts.
pub fn reset_outcome(reset: &Value, description: &Value) -> ResetOutcome {
    let success_message = string_field(reset, "SuccessMessage").filter(|m| !m.trim().is_empty());
    let error = if success_message.is_none() {
        Some("Password reset failed. No SuccessMessage returned.".to_string())
    } else {
        None
    };
    ResetOutcome { success_message, description: string_field(description, "description"), error }
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod extract_tests;
