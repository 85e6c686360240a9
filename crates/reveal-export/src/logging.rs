//! Structured export logging.
//!
//! Every line carries the attempt ID and the current phase so that one
//! attempt can be followed end to end in JSON logs.

use reveal_models::AttemptId;
use tracing::{error, info, warn, Span};

/// Logger bound to one export attempt.
#[derive(Debug, Clone)]
pub struct ExportLogger {
    attempt_id: String,
    phase: String,
}

impl ExportLogger {
    /// Create a logger for an attempt and phase.
    pub fn new(attempt_id: &AttemptId, phase: &str) -> Self {
        Self {
            attempt_id: attempt_id.to_string(),
            phase: phase.to_string(),
        }
    }

    /// Same attempt, different phase.
    pub fn for_phase(&self, phase: &str) -> Self {
        Self {
            attempt_id: self.attempt_id.clone(),
            phase: phase.to_string(),
        }
    }

    /// Log the start of an attempt.
    pub fn log_start(&self, message: &str) {
        info!(
            attempt_id = %self.attempt_id,
            phase = %self.phase,
            "Export started: {}", message
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, progress: f64, message: &str) {
        info!(
            attempt_id = %self.attempt_id,
            phase = %self.phase,
            progress,
            "Export progress: {}", message
        );
    }

    /// Log a warning.
    pub fn log_warning(&self, message: &str) {
        warn!(
            attempt_id = %self.attempt_id,
            phase = %self.phase,
            "Export warning: {}", message
        );
    }

    /// Log an error.
    pub fn log_error(&self, message: &str) {
        error!(
            attempt_id = %self.attempt_id,
            phase = %self.phase,
            "Export error: {}", message
        );
    }

    /// Log that the attempt was cancelled.
    pub fn log_cancelled(&self) {
        info!(
            attempt_id = %self.attempt_id,
            phase = %self.phase,
            "Export cancelled"
        );
    }

    /// Log the completion of an attempt.
    pub fn log_completion(&self, message: &str) {
        info!(
            attempt_id = %self.attempt_id,
            phase = %self.phase,
            "Export completed: {}", message
        );
    }

    /// Get the attempt ID.
    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    /// Get the phase.
    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// Span covering the whole attempt.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "export",
            attempt_id = %self.attempt_id,
            phase = %self.phase
        )
    }
}
