use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Email domains accepted in place of a bare username.
pub const RECOGNIZED_SUFFIXES: [&str; 2] = ["@clemson.edu", "@g.clemson.edu"];

/// Canonical identity key: trimmed, lowercased, with recognized email suffixes
/// removed. Blank input yields an empty string, which callers must drop.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut key = lowered.as_str();
    while let Some(stripped) = RECOGNIZED_SUFFIXES.iter().find_map(|s| key.strip_suffix(s)) {
        key = stripped.trim_end();
    }
    key.to_string()
}

/// One input identity, optionally paired with a secret for login-style commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    identity_key: String,
    secret: Option<String>,
}

impl Credential {
    pub fn new(identity_key: impl Into<String>, secret: Option<String>) -> Self {
        Self { identity_key: identity_key.into(), secret }
    }

    pub fn identity_key(&self) -> &str { &self.identity_key }

    pub fn secret(&self) -> Option<&str> { self.secret.as_deref() }

    fn normalized(self) -> Self {
        Self { identity_key: normalize(&self.identity_key), secret: self.secret }
    }
}

/// Parse one `identity<TAB>secret` line. Lines with more than two fields are
/// malformed and come back as the empty sentinel `("", None)`.
pub fn parse_credential_line(line: &str) -> Credential {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line.split('\t').collect();
    match fields.as_slice() {
        [identity] => Credential::new(*identity, None),
        [identity, secret] => Credential::new(*identity, Some(secret.to_string())),
        _ => Credential::new("", None),
    }
}

/// Positional identities first, then every line of `input`; keys are normalized
/// and blank keys dropped, order preserved.
pub fn collect_credentials(positional: &[String], input: Option<&str>) -> Vec<Credential> {
    let mut out: Vec<Credential> = positional.iter().map(|u| Credential::new(u.as_str(), None)).collect();
    if let Some(text) = input {
        out.extend(text.split('\n').map(parse_credential_line));
    }
    out.into_iter()
        .map(Credential::normalized)
        .filter(|c| !c.identity_key.is_empty())
        .collect()
}

pub fn load_credentials(positional: &[String], input_file: Option<&Path>) -> Result<Vec<Credential>> {
    let text = match input_file {
        Some(path) => Some(fs::read_to_string(path).with_context(|| format!("failed to read input file {}", path.display()))?),
        None => None,
    };
    let creds = collect_credentials(positional, text.as_deref());
    debug!(target: "hdtools::identity", "loaded {} credential(s)", creds.len());
    Ok(creds)
}
