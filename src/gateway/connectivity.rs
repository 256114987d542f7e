use std::sync::Arc;

use reqwest::blocking::{Client, Response};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{PortalError, PortalResult};

use super::Portal;

/// The one authenticated connection to the portal. Built once at startup from
/// the operator-supplied cookie and shared read-only by every lookup.
pub struct SessionContext {
    base: Url,
    client: Client,
    idp_markers: Vec<String>,
}

impl SessionContext {
    pub fn connect(cfg: &Config) -> PortalResult<Self> {
        let base = Url::parse(&cfg.base_url)
            .map_err(|e| PortalError::TransportError(format!("invalid base URL '{}': {e}", cfg.base_url)))?;

        // Seed the jar instead of pinning a Cookie header so cookies the portal
        // hands out later (load balancer affinity) are sent back too.
        let jar = Jar::default();
        for pair in cfg.cookie.split(';') {
            let pair = pair.trim();
            if !pair.is_empty() { jar.add_cookie_str(pair, &base); }
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let ua = HeaderValue::from_str(&cfg.user_agent)
            .map_err(|e| PortalError::TransportError(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, ua);

        let client = Client::builder()
            .cookie_provider(Arc::new(jar))
            .default_headers(headers)
            .build()?;
        debug!(target: "hdtools::gateway", "session ready for {}", base);
        Ok(Self { base, client, idp_markers: cfg.idp_markers.clone() })
    }

    pub fn base(&self) -> &Url { &self.base }

    fn url(&self, path: &str) -> PortalResult<Url> {
        self.base
            .join(path)
            .map_err(|e| PortalError::TransportError(format!("invalid path '{}': {e}", path)))
    }

    fn decode(resp: Response) -> PortalResult<Value> {
        let status = resp.status();
        if !status.is_success() {
            return Err(PortalError::HttpError(status.as_u16()));
        }
        let body = resp.text().map_err(|e| PortalError::TransportError(e.to_string()))?;
        serde_json::from_str(&body).map_err(|_| PortalError::decode(&body))
    }
}

impl Portal for SessionContext {
    fn get_json(&self, path: &str) -> PortalResult<Value> {
        let url = self.url(path)?;
        debug!(target: "hdtools::gateway", "GET {}", url);
        let resp = self.client.get(url).send().map_err(|e| PortalError::TransportError(e.to_string()))?;
        Self::decode(resp)
    }

    fn post_form(&self, path: &str, form: &[(&str, &str)]) -> PortalResult<Value> {
        let url = self.url(path)?;
        debug!(target: "hdtools::gateway", "POST {}", url);
        let resp = self.client.post(url).form(form).send().map_err(|e| PortalError::TransportError(e.to_string()))?;
        Self::decode(resp)
    }

    fn final_url(&self, path: &str) -> PortalResult<String> {
        let url = self.url(path)?;
        debug!(target: "hdtools::gateway", "GET {} (following redirects)", url);
        let resp = self.client.get(url).send().map_err(|e| PortalError::TransportError(e.to_string()))?;
        Ok(resp.url().to_string())
    }

    fn idp_markers(&self) -> &[String] { &self.idp_markers }
}
