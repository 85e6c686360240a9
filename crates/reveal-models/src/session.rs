//! Export session state machine.
//!
//! An [`ExportSession`] is the single mutable record of one export attempt.
//! Only the orchestrator mutates it; observers receive cloned snapshots.
//!
//! Invariants enforced here:
//! - status only moves along [`ExportStatus::can_transition_to`]
//! - progress never decreases, except the reset to 0 on cancellation
//! - result URLs are set only on `Complete` and never both at once
//! - `error_detail` is set only on `Failed`

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AttemptId, ExportArtifact};

/// Export attempt status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    /// Nothing started yet
    #[default]
    Idle,
    /// Uploading the before/after images
    Uploading,
    /// Submitting the remote render job
    Requesting,
    /// Waiting on the remote render job
    Polling,
    /// Building the local crossfade animation
    GeneratingFallback,
    /// Finished with a result URL
    Complete,
    /// Finished with an error
    Failed,
    /// Stopped by the caller
    Cancelled,
}

impl ExportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStatus::Idle => "idle",
            ExportStatus::Uploading => "uploading",
            ExportStatus::Requesting => "requesting",
            ExportStatus::Polling => "polling",
            ExportStatus::GeneratingFallback => "generating_fallback",
            ExportStatus::Complete => "complete",
            ExportStatus::Failed => "failed",
            ExportStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExportStatus::Complete | ExportStatus::Failed | ExportStatus::Cancelled
        )
    }

    /// Whether `next` is a legal successor of this status.
    pub fn can_transition_to(&self, next: ExportStatus) -> bool {
        use ExportStatus::*;

        if next == Cancelled {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, Uploading)
                | (Uploading, Requesting)
                | (Uploading, Failed)
                | (Requesting, Polling)
                | (Requesting, Failed)
                | (Polling, Complete)
                | (Polling, Failed)
                | (Polling, GeneratingFallback)
                | (GeneratingFallback, Complete)
                | (GeneratingFallback, Failed)
        )
    }
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid export transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ExportStatus,
    pub to: ExportStatus,
}

/// Snapshot of one export attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportSession {
    /// Attempt this session belongs to
    pub attempt_id: AttemptId,
    /// Current status
    pub status: ExportStatus,
    /// Progress in [0, 1]
    pub progress: f64,
    /// Human-readable status line (UI hint only)
    pub message: String,
    /// Rendered video URL (remote path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_video_url: Option<String>,
    /// Animated image URL (fallback path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_image_url: Option<String>,
    /// Error message if the attempt failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// When the session last changed
    pub updated_at: DateTime<Utc>,
    /// Sequence number for snapshot ordering (monotonically increasing)
    pub event_seq: u64,
}

impl ExportSession {
    /// Create a fresh idle session for an attempt.
    pub fn new(attempt_id: AttemptId) -> Self {
        Self {
            attempt_id,
            status: ExportStatus::Idle,
            progress: 0.0,
            message: String::new(),
            result_video_url: None,
            result_image_url: None,
            error_detail: None,
            updated_at: Utc::now(),
            event_seq: 0,
        }
    }

    /// Create a fresh idle session with a new attempt ID.
    pub fn idle() -> Self {
        Self::new(AttemptId::new())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to a non-terminal status.
    pub fn transition(
        &mut self,
        next: ExportStatus,
        message: impl Into<String>,
    ) -> Result<(), InvalidTransition> {
        if next.is_terminal() {
            // Terminal states carry payloads; use complete/fail/cancel.
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.move_to(next)?;
        self.message = message.into();
        self.touch();
        Ok(())
    }

    /// Raise progress. Values below the current progress are ignored.
    pub fn set_progress(&mut self, progress: f64) {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        if progress > self.progress {
            self.progress = progress;
        }
        self.touch();
    }

    /// Finish with the given artifact.
    pub fn complete(
        &mut self,
        artifact: &ExportArtifact,
        message: impl Into<String>,
    ) -> Result<(), InvalidTransition> {
        self.move_to(ExportStatus::Complete)?;
        match artifact {
            ExportArtifact::Video { url } => {
                self.result_video_url = Some(url.clone());
                self.result_image_url = None;
            }
            ExportArtifact::AnimatedImage { url } => {
                self.result_image_url = Some(url.clone());
                self.result_video_url = None;
            }
        }
        self.progress = 1.0;
        self.message = message.into();
        self.touch();
        Ok(())
    }

    /// Finish with an error.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), InvalidTransition> {
        self.move_to(ExportStatus::Failed)?;
        let error = error.into();
        self.message = format!("Export failed: {}", error);
        self.error_detail = Some(error);
        self.touch();
        Ok(())
    }

    /// Stop the attempt at the caller's request. Progress resets to 0.
    pub fn cancel(&mut self) -> Result<(), InvalidTransition> {
        self.move_to(ExportStatus::Cancelled)?;
        self.progress = 0.0;
        self.message = "Export cancelled".to_string();
        self.touch();
        Ok(())
    }

    /// The terminal artifact, if the attempt completed.
    pub fn artifact(&self) -> Option<ExportArtifact> {
        if self.status != ExportStatus::Complete {
            return None;
        }
        match (&self.result_video_url, &self.result_image_url) {
            (Some(url), None) => Some(ExportArtifact::Video { url: url.clone() }),
            (None, Some(url)) => Some(ExportArtifact::AnimatedImage { url: url.clone() }),
            _ => None,
        }
    }

    fn move_to(&mut self, next: ExportStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }
}

impl Default for ExportSession {
    fn default() -> Self {
        Self::idle()
    }
}
