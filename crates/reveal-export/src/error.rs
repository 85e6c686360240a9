//! Export error types.
//!
//! Every leaf failure is mapped here at the orchestrator boundary. Aborts
//! caused by the cancellation token become [`ExportError::Cancelled`], never
//! a failure variant.

use reveal_compositor::CompositorError;
use reveal_models::{Aborted, InvalidTransition};
use reveal_render_client::RenderError;
use reveal_storage::StorageError;
use thiserror::Error;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid export request: {0}")]
    InvalidRequest(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Render request failed: {0}")]
    Submission(String),

    #[error("Render status check failed: {0}")]
    StatusCheck(String),

    #[error("Render job failed: {0}")]
    RemoteJobFailure(String),

    #[error("Fallback composition failed: {0}")]
    FallbackComposition(String),

    #[error("Fallback encoding failed: {0}")]
    FallbackEncoding(String),

    #[error("Export cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Map an upload error for the image labelled `which`.
    pub fn upload(which: &str, err: StorageError) -> Self {
        if err.is_aborted() {
            return Self::Cancelled;
        }
        Self::Upload(format!("{} image: {}", which, err))
    }

    /// Map a render submission error.
    pub fn submission(err: RenderError) -> Self {
        if err.is_aborted() {
            return Self::Cancelled;
        }
        Self::Submission(err.to_string())
    }

    /// Map a render status check error.
    pub fn status_check(err: RenderError) -> Self {
        if err.is_aborted() {
            return Self::Cancelled;
        }
        Self::StatusCheck(err.to_string())
    }

    /// Map a compositor error from the fallback.
    pub fn composition(err: CompositorError) -> Self {
        if err.is_cancelled() {
            return Self::Cancelled;
        }
        Self::FallbackComposition(err.to_string())
    }

    /// Map an upload error for a fallback frame.
    pub fn frame_upload(err: StorageError) -> Self {
        if err.is_aborted() {
            return Self::Cancelled;
        }
        Self::FallbackEncoding(format!("frame upload: {}", err))
    }

    /// Map an encoder error from the fallback.
    pub fn encoding(err: RenderError) -> Self {
        if err.is_aborted() {
            return Self::Cancelled;
        }
        Self::FallbackEncoding(err.to_string())
    }

    /// Whether this is the user-initiated terminal state rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExportError::Cancelled)
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::InvalidRequest(_) => "invalid_request",
            ExportError::Upload(_) => "upload",
            ExportError::Submission(_) => "submission",
            ExportError::StatusCheck(_) => "status_check",
            ExportError::RemoteJobFailure(_) => "remote_job_failure",
            ExportError::FallbackComposition(_) => "fallback_composition",
            ExportError::FallbackEncoding(_) => "fallback_encoding",
            ExportError::Cancelled => "cancelled",
            ExportError::Internal(_) => "internal",
        }
    }
}

impl From<Aborted> for ExportError {
    fn from(_: Aborted) -> Self {
        ExportError::Cancelled
    }
}

impl From<InvalidTransition> for ExportError {
    fn from(err: InvalidTransition) -> Self {
        ExportError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborts_map_to_cancelled() {
        assert!(ExportError::upload("before", StorageError::Aborted).is_cancelled());
        assert!(ExportError::submission(RenderError::Aborted).is_cancelled());
        assert!(ExportError::status_check(RenderError::Aborted).is_cancelled());
        assert!(ExportError::encoding(RenderError::Aborted).is_cancelled());
        assert!(ExportError::composition(CompositorError::Cancelled).is_cancelled());
        assert!(ExportError::from(Aborted).is_cancelled());
    }

    #[test]
    fn test_business_failures_stay_failures() {
        let err = ExportError::upload("after", StorageError::upload_failed("503"));
        assert!(matches!(err, ExportError::Upload(ref m) if m.starts_with("after image")));
        assert!(!err.is_cancelled());

        let err = ExportError::submission(RenderError::RequestFailed("400".into()));
        assert_eq!(err.kind(), "submission");
    }

    #[test]
    fn test_invalid_transition_is_internal() {
        let err = ExportError::from(InvalidTransition {
            from: reveal_models::ExportStatus::Idle,
            to: reveal_models::ExportStatus::Polling,
        });
        assert!(matches!(err, ExportError::Internal(ref m) if m.contains("idle -> polling")));
    }
}
