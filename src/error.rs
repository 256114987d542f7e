//! Error model for portal lookups.
//! Every per-identity step returns a `PortalResult`; the batch pipeline turns
//! failures into inline `{error: ...}` entries instead of aborting the run.

use thiserror::Error;

/// Longest body fragment kept on a decode failure.
pub const SNIPPET_LEN: usize = 120;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("backend error: {0}")]
    BackendError(String),
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
    #[error("transport error: {0}")]
    TransportError(String),
    #[error("HTTP {0}")]
    HttpError(u16),
    #[error("invalid JSON in response: {snippet}")]
    DecodeError { snippet: String },
}

impl PortalError {
    pub fn code_str(&self) -> &'static str {
        match self {
            PortalError::NotFound(_) => "not_found",
            PortalError::MissingField(_) => "missing_field",
            PortalError::BackendError(_) => "backend_error",
            PortalError::UnexpectedShape(_) => "unexpected_shape",
            PortalError::TransportError(_) => "transport_error",
            PortalError::HttpError(_) => "http_error",
            PortalError::DecodeError { .. } => "decode_error",
        }
    }

    /// Build a decode error from the raw body, keeping at most `SNIPPET_LEN` chars.
    pub fn decode(body: &str) -> Self {
        let trimmed = body.trim();
        let mut snippet: String = trimmed.chars().take(SNIPPET_LEN).collect();
        if trimmed.chars().count() > SNIPPET_LEN { snippet.push('…'); }
        PortalError::DecodeError { snippet }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => PortalError::HttpError(status.as_u16()),
            None => PortalError::TransportError(err.to_string()),
        }
    }
}

pub type PortalResult<T> = Result<T, PortalError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
