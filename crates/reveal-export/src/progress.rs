//! Session snapshot publishing.
//!
//! One [`ProgressChannel`] per attempt owns the attempt's [`ExportSession`]
//! and is its only writer. Every mutation publishes a full snapshot to the
//! paired [`ExportEvents`] receiver. The session itself keeps progress from
//! moving backwards; only cancellation resets it.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use reveal_models::{AttemptId, ExportArtifact, ExportSession, ExportStatus};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::ExportResult;

/// Writer side: owns the session for one attempt.
#[derive(Debug)]
pub struct ProgressChannel {
    session: ExportSession,
    tx: mpsc::UnboundedSender<ExportSession>,
}

impl ProgressChannel {
    /// Create the writer and its paired snapshot stream for a new attempt.
    pub fn new(attempt_id: AttemptId) -> (Self, ExportEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Self {
            session: ExportSession::new(attempt_id),
            tx,
        };
        (channel, ExportEvents { rx })
    }

    /// Get the current session.
    pub fn session(&self) -> &ExportSession {
        &self.session
    }

    /// Get the attempt ID.
    pub fn attempt_id(&self) -> &AttemptId {
        &self.session.attempt_id
    }

    /// Move to a non-terminal status and raise progress.
    pub fn enter(
        &mut self,
        status: ExportStatus,
        progress: f64,
        message: impl Into<String>,
    ) -> ExportResult<()> {
        self.session.transition(status, message)?;
        self.session.set_progress(progress);
        self.publish();
        Ok(())
    }

    /// Raise progress and replace the message within the current status.
    pub fn update(&mut self, progress: f64, message: impl Into<String>) {
        self.session.set_progress(progress);
        self.session.message = message.into();
        self.publish();
    }

    /// Finish with the given artifact and publish the terminal snapshot.
    pub fn complete(&mut self, artifact: &ExportArtifact) -> ExportResult<()> {
        let message = if artifact.is_video() {
            "Video ready"
        } else {
            "Animation ready"
        };
        self.session.complete(artifact, message)?;
        self.publish();
        Ok(())
    }

    /// Finish with an error and publish the terminal snapshot.
    pub fn fail(&mut self, error: impl Into<String>) -> ExportResult<()> {
        self.session.fail(error)?;
        self.publish();
        Ok(())
    }

    /// Finish as cancelled (progress 0) and publish the terminal snapshot.
    pub fn cancel(&mut self) -> ExportResult<()> {
        self.session.cancel()?;
        self.publish();
        Ok(())
    }

    fn publish(&self) {
        if self.tx.send(self.session.clone()).is_err() {
            trace!(
                attempt_id = %self.session.attempt_id,
                "No subscriber for export snapshot"
            );
        }
    }
}

/// Reader side: ordered stream of session snapshots for one attempt.
///
/// Ends once the attempt reaches a terminal status and its writer is dropped.
#[derive(Debug)]
pub struct ExportEvents {
    rx: mpsc::UnboundedReceiver<ExportSession>,
}

impl ExportEvents {
    /// Next snapshot, or `None` once the attempt is over.
    pub async fn recv(&mut self) -> Option<ExportSession> {
        self.rx.recv().await
    }

    /// Drain every snapshot until the writer goes away.
    pub async fn collect_all(mut self) -> Vec<ExportSession> {
        let mut snapshots = Vec::new();
        while let Some(snapshot) = self.rx.recv().await {
            snapshots.push(snapshot);
        }
        snapshots
    }
}

impl Stream for ExportEvents {
    type Item = ExportSession;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
