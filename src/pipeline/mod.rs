//! Batch pipeline: one command applied to every input identity in order.
//!
//! Each identity is resolved and evaluated independently; any failure is
//! recorded as that identity's `{error: ...}` entry and the batch moves on.

pub mod filter;
mod result_set;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PortalError, PortalResult};
use crate::extract;
use crate::gateway::Portal;
use crate::identity::{extract_key_and_alias, resolve, select_first, Credential, IdentityRecord};

pub use filter::{apply, Filter};
pub use result_set::{AttributeValue, ResetOutcome, ResultSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Search,
    /// `lockout_aware` also treats accounts with a directory lockout as inactive.
    Active { lockout_aware: bool },
    Lockout,
    Abroad,
    Department,
    Supervisor,
    LastPassword,
    Login,
    Reset,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Active { .. } => "active",
            Operation::Lockout => "lockout",
            Operation::Abroad => "abroad",
            Operation::Department => "department",
            Operation::Supervisor => "supervisor",
            Operation::LastPassword => "lastpass",
            Operation::Login => "login",
            Operation::Reset => "reset",
        }
    }

    /// Display labels for `true` and `false` results of boolean commands.
    pub fn labels(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Operation::Active { .. } => Some(("Active", "Inactive")),
            Operation::Lockout => Some(("Locked", "Unlocked")),
            Operation::Abroad => Some(("Abroad", "Local")),
            _ => None,
        }
    }
}

pub fn run(portal: &dyn Portal, credentials: &[Credential], op: Operation) -> ResultSet {
    info!(target: "hdtools::pipeline", "{}: processing {} identities", op.name(), credentials.len());
    let mut results = ResultSet::new();
    for cred in credentials {
        let key = cred.identity_key();
        let value = match evaluate(portal, cred, op) {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "hdtools::pipeline", "{} {}: {} ({})", op.name(), key, e, e.code_str());
                AttributeValue::from(e)
            }
        };
        debug!(target: "hdtools::pipeline", "{} {} -> {:?}", op.name(), key, value);
        results.insert(key, value);
    }
    info!(
        target: "hdtools::pipeline",
        "{}: {} result(s), {} error(s)", op.name(), results.len(), results.error_count()
    );
    results
}

/// Resolve and extract for a single identity.
pub fn evaluate(portal: &dyn Portal, cred: &Credential, op: Operation) -> PortalResult<AttributeValue> {
    let key = cred.identity_key();
    match op {
        Operation::Search => search_records(portal, key),
        Operation::Active { lockout_aware } => {
            let record = resolve(portal, key)?;
            extract_key_and_alias(&record)?;
            let raw = extract::health_status(&record, key);
            let locked = if lockout_aware && raw { lockout(portal, &record)? } else { false };
            Ok(AttributeValue::Flag(extract::compose_active(raw, locked)))
        }
        Operation::Lockout => {
            let record = resolve(portal, key)?;
            Ok(AttributeValue::Flag(lockout(portal, &record)?))
        }
        Operation::Abroad => {
            let (id, _) = extract_key_and_alias(&resolve(portal, key)?)?;
            let courses = portal.fetch_module(extract::COURSES_MODULE, &id)?;
            Ok(AttributeValue::Flag(extract::abroad_from_courses(&courses)))
        }
        Operation::Department => employment(portal, key, extract::DEPARTMENT_FIELD),
        Operation::Supervisor => employment(portal, key, extract::SUPERVISOR_FIELD),
        Operation::LastPassword => {
            let (id, alias) = extract_key_and_alias(&resolve(portal, key)?)?;
            let accounts = portal.fetch_module(extract::ACCOUNTS_MODULE, &id)?;
            Ok(AttributeValue::Timestamp(extract::password_changed(&accounts, &alias)?))
        }
        Operation::Login => {
            let secret = cred.secret().ok_or(PortalError::MissingField("secret"))?;
            let (_, alias) = extract_key_and_alias(&resolve(portal, key)?)?;
            let ok = portal.check_login(&alias, secret)?;
            Ok(AttributeValue::Text(if ok { "Succeeded" } else { "Failed" }.to_string()))
        }
        Operation::Reset => {
            let (id, alias) = extract_key_and_alias(&resolve(portal, key)?)?;
            let reset = portal.reset_password(&alias, &id)?;
            let description = portal.set_description(&alias, &id)?;
            Ok(AttributeValue::Reset(extract::reset_outcome(&reset, &description)))
        }
    }
}

fn search_records(portal: &dyn Portal, key: &str) -> PortalResult<AttributeValue> {
    match portal.search(key)? {
        Value::Array(records) => Ok(AttributeValue::Records(records)),
        // reuse the resolver's envelope/shape reporting
        other => select_first(key, other).map(|_| AttributeValue::Records(Vec::new())),
    }
}

fn lockout(portal: &dyn Portal, record: &IdentityRecord) -> PortalResult<bool> {
    let (id, _) = extract_key_and_alias(record)?;
    extract::lockout_from_module(&portal.fetch_module(extract::ACCOUNTS_MODULE, &id)?)
}

fn employment(portal: &dyn Portal, key: &str, field: &str) -> PortalResult<AttributeValue> {
    let (id, _) = extract_key_and_alias(&resolve(portal, key)?)?;
    let module = portal.fetch_module(extract::EMPLOYMENT_MODULE, &id)?;
    Ok(AttributeValue::List(extract::employment_field(&module, field)))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod pipeline_tests;
