//! Render client error types.

use reveal_models::Aborted;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request aborted")]
    Aborted,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl RenderError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            502..=504 => Self::ServiceUnavailable(format!("HTTP {}: {}", status, body)),
            _ => Self::RequestFailed(format!("service returned {}: {}", status, body)),
        }
    }

    /// Whether the request stopped because its cancellation token fired.
    pub fn is_aborted(&self) -> bool {
        matches!(self, RenderError::Aborted)
    }
}

impl From<Aborted> for RenderError {
    fn from(_: Aborted) -> Self {
        RenderError::Aborted
    }
}
