//! Session gateway: typed accessors over the portal endpoints.
//!
//! A `Portal` implementor only supplies the three transport primitives
//! (`get_json`, `post_form`, `final_url`); every typed accessor is built on top
//! of them here so the HTTP session and the in-memory fakes used by tests share
//! one set of path and shape rules.

pub mod connectivity;
pub mod response;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{PortalError, PortalResult};
use crate::identity::normalize;

pub use connectivity::SessionContext;
pub use response::{classify, FieldSpec, HistoryEntry, ModuleItem, ModuleResponse, ModuleResult};

pub const REST_PREFIX: &str = "/srv/feed/dynamic/rest";
pub const BUTTON_PREFIX: &str = "/srv/feed/dynamic/button";
pub const CHECK_AUTH_PREFIX: &str = "/srv/feed/dynamic/checkAuth";
pub const MODULES_PATH: &str = "/srv/util/getModules.php";
pub const HISTORY_MODULE: &str = "eventLogNew";

/// Three-valued answer for backend flags that are not reliably boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tristate {
    True,
    False,
    Unknown,
}

impl Tristate {
    /// Interpret a loosely typed JSON flag. `null` is `Unknown`; strings, numbers
    /// and containers follow truthiness (empty is false).
    pub fn from_json(v: &Value) -> Self {
        let truthy = match v {
            Value::Null => return Tristate::Unknown,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        };
        if truthy { Tristate::True } else { Tristate::False }
    }

    /// Like `from_json`, except that a string is true only when it reads `true`.
    pub fn verdict(v: &Value) -> Self {
        match v {
            Value::String(s) => Tristate::from(s.trim().eq_ignore_ascii_case("true")),
            other => Tristate::from_json(other),
        }
    }

    /// Collapse to two states, treating `Unknown` as `fallback`.
    pub fn unwrap_or(self, fallback: bool) -> bool {
        match self {
            Tristate::True => true,
            Tristate::False => false,
            Tristate::Unknown => fallback,
        }
    }

    /// Short status tag used by the interactive module listing.
    pub fn tag(self) -> &'static str {
        match self {
            Tristate::True => "OK",
            Tristate::False => "NO",
            Tristate::Unknown => "SK",
        }
    }
}

impl From<bool> for Tristate {
    fn from(b: bool) -> Self { if b { Tristate::True } else { Tristate::False } }
}

/// Navigation entry from the module catalogue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModuleInfo {
    pub module: String,
    #[serde(default)]
    pub label: String,
}

/// Directory-style address of one identity, as the module endpoints expect it.
pub fn record_dn(record_id: &str) -> String {
    format!("Vaultzid={},ou=Identities,o=cuvault", record_id)
}

pub trait Portal {
    /// GET `path` (relative to the portal root) and decode the body as JSON.
    fn get_json(&self, path: &str) -> PortalResult<Value>;

    /// POST url-encoded `form` to `path` and decode the body as JSON.
    fn post_form(&self, path: &str, form: &[(&str, &str)]) -> PortalResult<Value>;

    /// GET `path` following redirects and return the final URL.
    fn final_url(&self, path: &str) -> PortalResult<String>;

    /// Hosts (or fragments) that mark a redirect to the login provider.
    fn idp_markers(&self) -> &[String];

    fn verify_session(&self) -> bool {
        match self.final_url("/") {
            Ok(url) => {
                let url = url.to_lowercase();
                let redirected = self.idp_markers().iter().any(|m| url.contains(&m.to_lowercase()));
                if redirected {
                    debug!(target: "hdtools::gateway", "redirected to {}, session appears invalid", url);
                }
                !redirected
            }
            Err(e) => {
                debug!(target: "hdtools::gateway", "session check failed: {}", e);
                false
            }
        }
    }

    fn search(&self, query: &str) -> PortalResult<Value> {
        let key = normalize(query);
        self.get_json(&format!("{}/Search/{}", REST_PREFIX, urlencoding::encode(&key)))
    }

    fn fetch_module_response(&self, module: &str, record_id: &str) -> PortalResult<ModuleResponse> {
        classify(self.get_json(&format!("{}/{}/{}", REST_PREFIX, module, record_dn(record_id)))?)
    }

    fn fetch_module(&self, module: &str, record_id: &str) -> PortalResult<ModuleResult> {
        self.fetch_module_response(module, record_id)?.into_items()
    }

    fn fetch_history(&self, record_id: &str) -> PortalResult<Vec<HistoryEntry>> {
        let path = format!("{}/{}/{}?extended=1", REST_PREFIX, HISTORY_MODULE, record_dn(record_id));
        classify(self.get_json(&path)?)?.into_history()
    }

    /// 404 means the module does not apply to this identity: `Unknown`, not an error.
    fn check_module_authorized(&self, module: &str, record_id: &str) -> PortalResult<Tristate> {
        match self.get_json(&format!("{}/{}/{}", CHECK_AUTH_PREFIX, module, record_dn(record_id))) {
            Ok(v) => Ok(Tristate::verdict(&v)),
            Err(PortalError::HttpError(404)) => {
                debug!(target: "hdtools::gateway", "module '{}' not applicable (404), skipping", module);
                Ok(Tristate::Unknown)
            }
            Err(e) => Err(e),
        }
    }

    fn list_modules(&self) -> PortalResult<Vec<ModuleInfo>> {
        let v = self.get_json(MODULES_PATH)?;
        let nav = v.get("nav").cloned().ok_or_else(|| PortalError::UnexpectedShape("module list without 'nav'".into()))?;
        serde_json::from_value(nav).map_err(|e| PortalError::UnexpectedShape(format!("module list: {e}")))
    }

    /// Display name of an identity; the endpoint answers a string or a list of strings.
    fn name_by_id(&self, record_id: &str) -> PortalResult<String> {
        match self.get_json(&format!("{}/NameByID/{}", REST_PREFIX, record_dn(record_id)))? {
            Value::String(s) => Ok(s),
            Value::Array(items) => items
                .first()
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| PortalError::NotFound(format!("name for {}", record_id))),
            other => match response::error_envelope(&other) {
                Some(msg) => Err(PortalError::BackendError(msg)),
                None => Err(PortalError::UnexpectedShape(format!("name lookup returned {}", response::kind_of(&other)))),
            },
        }
    }

    fn reset_password(&self, alias: &str, record_id: &str) -> PortalResult<Value> {
        let path = format!("{}/resetPassword/{}", BUTTON_PREFIX, record_dn(record_id));
        reject_envelope(self.post_form(&path, &[("username", alias)])?)
    }

    fn set_description(&self, alias: &str, record_id: &str) -> PortalResult<Value> {
        let path = format!("{}/setDescription/{}", BUTTON_PREFIX, record_dn(record_id));
        reject_envelope(self.post_form(&path, &[("username", alias)])?)
    }

    /// Whether `secret` is the current password of `alias`.
    fn check_login(&self, alias: &str, secret: &str) -> PortalResult<bool> {
        let path = format!("{}/checkLogin", BUTTON_PREFIX);
        let v = reject_envelope(self.post_form(&path, &[("username", alias), ("password", secret)])?)?;
        let flag = match &v {
            Value::Object(o) => o.get("valid").or_else(|| o.get("Success")).cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };
        match Tristate::verdict(&flag) {
            Tristate::Unknown => Err(PortalError::UnexpectedShape("login check without a verdict".into())),
            t => Ok(t.unwrap_or(false)),
        }
    }
}

fn reject_envelope(v: Value) -> PortalResult<Value> {
    match response::error_envelope(&v) {
        Some(msg) => Err(PortalError::BackendError(msg)),
        None => Ok(v),
    }
}
