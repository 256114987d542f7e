//! In-memory portal used by the integration tests. GET and POST answers are
//! keyed by path; anything unregistered answers HTTP 404.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use serde_json::{json, Value};

use hdtools::error::{PortalError, PortalResult};
use hdtools::gateway::{record_dn, Portal, BUTTON_PREFIX, REST_PREFIX};

#[derive(Default)]
pub struct MemoryPortal {
    gets: HashMap<String, PortalResult<Value>>,
    posts: HashMap<String, Value>,
    pub landing: String,
    /// Landing URLs handed out before falling back to `landing`, one per session check.
    pub landings: RefCell<VecDeque<String>>,
    pub markers: Vec<String>,
    pub calls: RefCell<Vec<String>>,
}

impl MemoryPortal {
    pub fn new() -> Self {
        Self {
            landing: "https://hdtools.example/".into(),
            markers: vec!["idp.app.clemson.edu".into(), "shib".into()],
            ..Default::default()
        }
    }

    pub fn on_get(mut self, path: impl Into<String>, body: Value) -> Self {
        self.gets.insert(path.into(), Ok(body));
        self
    }

    pub fn fail_get(mut self, path: impl Into<String>, err: PortalError) -> Self {
        self.gets.insert(path.into(), Err(err));
        self
    }

    pub fn on_post(mut self, path: impl Into<String>, body: Value) -> Self {
        self.posts.insert(path.into(), body);
        self
    }

    /// Register a search for `key` returning `records`.
    pub fn with_search(self, key: &str, records: Value) -> Self {
        self.on_get(format!("{}/Search/{}", REST_PREFIX, key), records)
    }

    pub fn with_module(self, module: &str, id: &str, body: Value) -> Self {
        self.on_get(format!("{}/{}/{}", REST_PREFIX, module, record_dn(id)), body)
    }

    pub fn with_button(self, button: &str, id: &str, body: Value) -> Self {
        self.on_post(format!("{}/{}/{}", BUTTON_PREFIX, button, record_dn(id)), body)
    }

    pub fn with_landings(self, urls: &[&str]) -> Self {
        self.landings.borrow_mut().extend(urls.iter().map(|u| u.to_string()));
        self
    }

    pub fn called(&self, fragment: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.contains(fragment)).count()
    }
}

fn clone_result(r: &PortalResult<Value>) -> PortalResult<Value> {
    match r {
        Ok(v) => Ok(v.clone()),
        Err(PortalError::HttpError(s)) => Err(PortalError::HttpError(*s)),
        Err(PortalError::NotFound(s)) => Err(PortalError::NotFound(s.clone())),
        Err(PortalError::BackendError(s)) => Err(PortalError::BackendError(s.clone())),
        Err(PortalError::TransportError(s)) => Err(PortalError::TransportError(s.clone())),
        Err(e) => Err(PortalError::UnexpectedShape(e.to_string())),
    }
}

impl Portal for MemoryPortal {
    fn get_json(&self, path: &str) -> PortalResult<Value> {
        self.calls.borrow_mut().push(format!("GET {}", path));
        self.gets.get(path).map(clone_result).unwrap_or(Err(PortalError::HttpError(404)))
    }

    fn post_form(&self, path: &str, form: &[(&str, &str)]) -> PortalResult<Value> {
        let fields: Vec<String> = form.iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.calls.borrow_mut().push(format!("POST {} {}", path, fields.join("&")));
        self.posts.get(path).cloned().ok_or(PortalError::HttpError(404))
    }

    fn final_url(&self, path: &str) -> PortalResult<String> {
        self.calls.borrow_mut().push(format!("LANDING {}", path));
        Ok(self.landings.borrow_mut().pop_front().unwrap_or_else(|| self.landing.clone()))
    }

    fn idp_markers(&self) -> &[String] {
        &self.markers
    }
}

/// Search record in the portal's list-valued layout.
pub fn record(id: &str, alias: &str, first: &str, last: &str, health: &str) -> Value {
    json!({
        "zid": id,
        "primaryUserName": [alias],
        "firstName": [first],
        "lastName": [last],
        "userNameHealth": { alias: health },
    })
}

pub fn items(data: Vec<Value>) -> Value {
    json!({ "items": data.into_iter().map(|d| json!({"data": d, "properties": {"fields": []}})).collect::<Vec<_>>() })
}
