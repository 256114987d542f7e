//! Process configuration read once at startup from the environment (after an
//! optional `.env` file has been folded in).

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://hdtools.app.clemson.edu";
pub const DEFAULT_USER_AGENT: &str = "HDToolsClient/1.0";

pub const ENV_COOKIE: &str = "HDTOOLS_COOKIE";
pub const ENV_COOKIE_NAME: &str = "HDTOOLS_COOKIE_NAME";
pub const ENV_COOKIE_VALUE: &str = "HDTOOLS_COOKIE_VALUE";
pub const ENV_BASE_URL: &str = "HDTOOLS_BASE_URL";

/// Fragments of the identity-provider hostnames a dead session gets redirected to.
pub const IDP_MARKERS: [&str; 2] = ["idp.app.clemson.edu", "shib"];

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub cookie: String,
    pub user_agent: String,
    pub idp_markers: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cookie = cookie_header(&lookup)?;
        let base_url = lookup(ENV_BASE_URL)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            idp_markers: IDP_MARKERS.iter().map(|s| s.to_string()).collect(),
        })
    }
}

fn cookie_header<F>(lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(full) = lookup(ENV_COOKIE).filter(|s| !s.trim().is_empty()) {
        debug!(target: "hdtools::config", "using full cookie from {}", ENV_COOKIE);
        return Ok(full.trim().to_string());
    }
    match (lookup(ENV_COOKIE_NAME), lookup(ENV_COOKIE_VALUE)) {
        (Some(name), Some(value)) if !name.trim().is_empty() => {
            debug!(target: "hdtools::config", "using split cookie {}=<redacted>", name.trim());
            Ok(format!("{}={}", name.trim(), value.trim()))
        }
        _ => Err(anyhow!(
            "missing HDTools cookie: set {} or {} and {} (environment or .env)",
            ENV_COOKIE, ENV_COOKIE_NAME, ENV_COOKIE_VALUE
        )),
    }
}

/// Key/value pairs of a `.env` file, in file order. Quoting, `export` prefixes
/// and `#` comments follow the usual dotenv rules; unparsable lines are skipped.
pub fn dotenv_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let iter = dotenvy::from_path_iter(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut out = Vec::new();
    for (line, item) in iter.enumerate() {
        match item {
            Ok(pair) => out.push(pair),
            Err(e) => warn!(target: "hdtools::config", "{}: skipping entry {}: {}", path.display(), line + 1, e),
        }
    }
    Ok(out)
}

/// Load `.env` from `path` into the process environment. Variables that are
/// already set to a non-empty value are left alone. Returns how many were applied.
pub fn load_dotenv(path: &Path) -> Result<usize> {
    if !path.exists() { return Ok(0); }
    let mut applied = 0;
    for (key, val) in dotenv_pairs(path)? {
        let present = std::env::var(&key).map(|v| !v.is_empty()).unwrap_or(false);
        if present { continue; }
        std::env::set_var(&key, val);
        applied += 1;
    }
    debug!(target: "hdtools::config", "loaded {} variable(s) from {}", applied, path.display());
    Ok(applied)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
