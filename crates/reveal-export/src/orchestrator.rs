//! Export attempt lifecycle.
//!
//! At most one attempt runs per orchestrator. Starting a new attempt cancels
//! the one in flight and waits for it to publish its terminal snapshot
//! before the new attempt begins, so snapshots of different attempts never
//! interleave.

use std::sync::{Arc, Mutex, MutexGuard};

use reveal_models::{AttemptId, ExportArtifact, ExportRequest, ExportSession};
use reveal_render_client::{AnimationEncoder, RenderJobClient};
use reveal_storage::AssetUploader;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use validator::Validate;

use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};
use crate::pipeline::ExportPipeline;
use crate::progress::{ExportEvents, ProgressChannel};

struct ActiveAttempt {
    attempt_id: AttemptId,
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Starts, cancels and resets export attempts.
pub struct ExportOrchestrator {
    pipeline: Arc<ExportPipeline>,
    active: Mutex<Option<ActiveAttempt>>,
    start_lock: tokio::sync::Mutex<()>,
}

impl ExportOrchestrator {
    /// Create an orchestrator over the three remote collaborators.
    pub fn new(
        uploader: Arc<dyn AssetUploader>,
        render_client: Arc<dyn RenderJobClient>,
        encoder: Arc<dyn AnimationEncoder>,
        config: ExportConfig,
    ) -> Self {
        Self::from_pipeline(ExportPipeline::new(uploader, render_client, encoder, config))
    }

    /// Create an orchestrator around an existing pipeline.
    pub fn from_pipeline(pipeline: ExportPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            active: Mutex::new(None),
            start_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Get the export configuration.
    pub fn config(&self) -> &ExportConfig {
        self.pipeline.config()
    }

    /// Start a new attempt.
    ///
    /// Invalid requests are rejected before anything is cancelled. Any
    /// earlier attempt, including one already cancelled by
    /// [`cancel`](Self::cancel) or [`reset`](Self::reset), is cancelled and
    /// awaited first.
    pub async fn start(&self, request: ExportRequest) -> ExportResult<ExportHandle> {
        request
            .validate()
            .map_err(|e| ExportError::invalid_request(e.to_string()))?;

        let _guard = self.start_lock.lock().await;

        let previous = self.active().take();
        if let Some(previous) = previous {
            if !previous.task.is_finished() {
                info!(
                    attempt_id = %previous.attempt_id,
                    "Cancelling in-flight export before starting a new one"
                );
            }
            previous.token.cancel();
            if let Err(e) = previous.task.await {
                warn!(attempt_id = %previous.attempt_id, "Previous export task ended abnormally: {}", e);
            }
        }

        let attempt_id = AttemptId::new();
        let token = CancellationToken::new();
        let (mut channel, events) = ProgressChannel::new(attempt_id.clone());
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let pipeline = Arc::clone(&self.pipeline);
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            let result = pipeline.run(&request, &mut channel, &task_token).await;
            // Receiver may have been dropped by a caller that only streams events.
            let _ = outcome_tx.send(result);
        });

        *self.active() = Some(ActiveAttempt {
            attempt_id: attempt_id.clone(),
            token: token.clone(),
            task,
        });

        Ok(ExportHandle {
            attempt_id,
            token,
            events,
            outcome: outcome_rx,
        })
    }

    /// Cancel the attempt in flight, if any. Idempotent.
    pub fn cancel(&self) {
        if let Some(active) = self.active().as_ref() {
            active.token.cancel();
        }
    }

    /// Cancel whatever is in flight and return a fresh idle session.
    ///
    /// Does not wait for the cancelled attempt to settle; the next
    /// [`start`](Self::start) does.
    pub fn reset(&self) -> ExportSession {
        self.cancel();
        ExportSession::idle()
    }

    /// Attempt currently in flight and not yet cancelled.
    pub fn active_attempt(&self) -> Option<AttemptId> {
        self.active()
            .as_ref()
            .filter(|active| !active.task.is_finished() && !active.token.is_cancelled())
            .map(|active| active.attempt_id.clone())
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveAttempt>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Caller's view of one attempt.
#[derive(Debug)]
pub struct ExportHandle {
    attempt_id: AttemptId,
    token: CancellationToken,
    events: ExportEvents,
    outcome: oneshot::Receiver<ExportResult<ExportArtifact>>,
}

impl ExportHandle {
    /// Get the attempt ID.
    pub fn attempt_id(&self) -> &AttemptId {
        &self.attempt_id
    }

    /// Cancel this attempt. Has no effect once it is terminal.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token for this attempt, e.g. for a signal handler.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Next session snapshot, or `None` once the attempt is over.
    pub async fn next_snapshot(&mut self) -> Option<ExportSession> {
        self.events.recv().await
    }

    /// Snapshot stream for this attempt.
    pub fn events(&mut self) -> &mut ExportEvents {
        &mut self.events
    }

    /// Wait for the terminal result.
    pub async fn outcome(self) -> ExportResult<ExportArtifact> {
        self.outcome
            .await
            .map_err(|_| ExportError::internal("export task ended without a result"))?
    }

    /// Wait for the terminal result and collect the remaining snapshots.
    pub async fn wait(self) -> (ExportResult<ExportArtifact>, Vec<ExportSession>) {
        let result = self
            .outcome
            .await
            .unwrap_or_else(|_| Err(ExportError::internal("export task ended without a result")));
        let snapshots = self.events.collect_all().await;
        (result, snapshots)
    }
}
