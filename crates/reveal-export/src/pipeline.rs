//! The export state machine.
//!
//! One [`ExportPipeline::run`] call drives one attempt from `idle` to a
//! terminal status: upload both images, submit a render job, poll it within
//! the attempt's budget and, when the budget runs out, build a local
//! crossfade animation instead. Every suspension point observes the
//! attempt's cancellation token.

use std::sync::Arc;
use std::time::Duration;

use reveal_models::{
    run_until_cancelled, ExportArtifact, ExportRequest, ExportStatus, UploadedAsset,
};
use reveal_render_client::{AnimationEncoder, RemoteJobState, RenderJobClient, RenderJobRequest};
use reveal_storage::{AssetSource, AssetUploader};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};
use crate::fallback::FallbackGenerator;
use crate::logging::ExportLogger;
use crate::metrics;
use crate::progress::ProgressChannel;

/// Progress when uploads start.
pub const PROGRESS_UPLOAD_START: f64 = 0.1;
/// Progress once both images are uploaded.
pub const PROGRESS_UPLOADED: f64 = 0.4;
/// Progress when the render job is submitted.
pub const PROGRESS_SUBMITTED: f64 = 0.45;
/// Progress once the render job is accepted.
pub const PROGRESS_ACCEPTED: f64 = 0.5;
/// Progress span covered by polling, on top of [`PROGRESS_ACCEPTED`].
pub const PROGRESS_POLL_SPAN: f64 = 0.45;
/// Progress when the local fallback starts.
pub const PROGRESS_FALLBACK: f64 = 0.6;

/// Progress while polling: `0.5 + min(0.45, elapsed / timeout * 0.45)`.
pub fn poll_progress(elapsed: Duration, timeout: Duration) -> f64 {
    if timeout.is_zero() {
        return PROGRESS_ACCEPTED + PROGRESS_POLL_SPAN;
    }
    let ratio = elapsed.as_secs_f64() / timeout.as_secs_f64();
    PROGRESS_ACCEPTED + (ratio * PROGRESS_POLL_SPAN).min(PROGRESS_POLL_SPAN)
}

/// Result of the polling phase.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollOutcome {
    Completed { url: String, polls: u32 },
    TimedOut { polls: u32 },
}

/// Runs export attempts against a set of remote collaborators.
pub struct ExportPipeline {
    uploader: Arc<dyn AssetUploader>,
    render_client: Arc<dyn RenderJobClient>,
    encoder: Arc<dyn AnimationEncoder>,
    config: ExportConfig,
}

impl ExportPipeline {
    /// Create a pipeline from the three remote collaborators and its configuration.
    pub fn new(
        uploader: Arc<dyn AssetUploader>,
        render_client: Arc<dyn RenderJobClient>,
        encoder: Arc<dyn AnimationEncoder>,
        config: ExportConfig,
    ) -> Self {
        Self {
            uploader,
            render_client,
            encoder,
            config,
        }
    }

    /// Get the export configuration.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Drive one attempt to a terminal status.
    ///
    /// The terminal snapshot is published on `channel` before this returns.
    /// A fired token always ends in `cancelled`, whatever the in-flight
    /// operation reported.
    pub async fn run(
        &self,
        request: &ExportRequest,
        channel: &mut ProgressChannel,
        token: &CancellationToken,
    ) -> ExportResult<ExportArtifact> {
        let logger = ExportLogger::new(channel.attempt_id(), "export");
        let span = logger.create_span();
        let started = Instant::now();

        metrics::record_attempt();
        logger.log_start(&format!(
            "{} -> {} ({}, music: {}, budget: {}ms)",
            request.before_image,
            request.after_image,
            request.transition,
            request.has_music,
            request.timeout_ms
        ));

        let result = self
            .drive(request, channel, token, &logger)
            .instrument(span)
            .await;

        self.finish(result, channel, token, &logger, started.elapsed())
    }

    fn finish(
        &self,
        result: ExportResult<ExportArtifact>,
        channel: &mut ProgressChannel,
        token: &CancellationToken,
        logger: &ExportLogger,
        elapsed: Duration,
    ) -> ExportResult<ExportArtifact> {
        match result {
            Ok(artifact) => {
                channel.complete(&artifact)?;
                let outcome = if artifact.is_video() {
                    "video"
                } else {
                    "animated_image"
                };
                metrics::record_outcome(outcome, elapsed);
                logger.log_completion(&format!("{} at {}", outcome, artifact.url()));
                Ok(artifact)
            }
            Err(err) if err.is_cancelled() || token.is_cancelled() => {
                if !err.is_cancelled() {
                    debug!(error = %err, "Discarding error from cancelled attempt");
                }
                channel.cancel()?;
                metrics::record_outcome("cancelled", elapsed);
                logger.log_cancelled();
                Err(ExportError::Cancelled)
            }
            Err(err) => {
                channel.fail(err.to_string())?;
                metrics::record_failure(err.kind());
                metrics::record_outcome("failed", elapsed);
                logger.log_error(&err.to_string());
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        request: &ExportRequest,
        channel: &mut ProgressChannel,
        token: &CancellationToken,
        logger: &ExportLogger,
    ) -> ExportResult<ExportArtifact> {
        ensure_live(token)?;
        channel.enter(
            ExportStatus::Uploading,
            PROGRESS_UPLOAD_START,
            "Uploading images...",
        )?;
        let (before, after) = self.upload_pair(request, token).await?;
        channel.update(PROGRESS_UPLOADED, "Images uploaded");
        logger
            .for_phase("upload")
            .log_progress(PROGRESS_UPLOADED, &format!("{} / {}", before.handle, after.handle));

        ensure_live(token)?;
        channel.enter(
            ExportStatus::Requesting,
            PROGRESS_SUBMITTED,
            "Requesting video render...",
        )?;
        let render_request = RenderJobRequest {
            before_handle: before.handle,
            after_handle: after.handle,
            transition_ms: request.transition.transition_ms(),
            duration_ms: self.config.clip_duration_ms,
            has_music: request.has_music,
        };
        let job = self
            .render_client
            .submit(&render_request, token)
            .await
            .map_err(ExportError::submission)?;

        ensure_live(token)?;
        channel.enter(ExportStatus::Polling, PROGRESS_ACCEPTED, "Rendering video...")?;
        let poll_logger = logger.for_phase("poll");
        poll_logger.log_progress(PROGRESS_ACCEPTED, &format!("render job {} accepted", job.job_id));

        match self
            .poll(&job.job_id, request.timeout(), channel, token, &poll_logger)
            .await?
        {
            PollOutcome::Completed { url, polls } => {
                metrics::record_polls(polls);
                Ok(ExportArtifact::Video { url })
            }
            PollOutcome::TimedOut { polls } => {
                metrics::record_fallback(polls);
                poll_logger.log_warning(&format!(
                    "render job {} not ready after {} checks, generating fallback",
                    job.job_id, polls
                ));

                ensure_live(token)?;
                channel.enter(
                    ExportStatus::GeneratingFallback,
                    PROGRESS_FALLBACK,
                    "Generating animation...",
                )?;
                let url = self.fallback().generate(request, token).await?;
                Ok(ExportArtifact::AnimatedImage { url })
            }
        }
    }

    /// Upload both images concurrently. Either failure fails the pair.
    async fn upload_pair(
        &self,
        request: &ExportRequest,
        token: &CancellationToken,
    ) -> ExportResult<(UploadedAsset, UploadedAsset)> {
        let (before, after) = tokio::join!(
            self.uploader
                .upload(AssetSource::path(request.before_path()), token),
            self.uploader
                .upload(AssetSource::path(request.after_path()), token),
        );
        let before = before.map_err(|e| ExportError::upload("before", e))?;
        let after = after.map_err(|e| ExportError::upload("after", e))?;
        Ok((before, after))
    }

    /// Poll the render job until it completes, fails or the budget runs out.
    ///
    /// The budget is checked before every status call, so a job finishing
    /// after the budget is never observed.
    async fn poll(
        &self,
        job_id: &str,
        timeout: Duration,
        channel: &mut ProgressChannel,
        token: &CancellationToken,
        logger: &ExportLogger,
    ) -> ExportResult<PollOutcome> {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            ensure_live(token)?;
            if started.elapsed() >= timeout {
                return Ok(PollOutcome::TimedOut { polls });
            }

            polls += 1;
            let job = self
                .render_client
                .status(job_id, token)
                .await
                .map_err(ExportError::status_check)?;

            match job.status {
                RemoteJobState::Completed => match job.completed_url() {
                    Some(url) => {
                        return Ok(PollOutcome::Completed {
                            url: url.to_string(),
                            polls,
                        })
                    }
                    None => logger.log_warning("render job completed without a result URL"),
                },
                RemoteJobState::Failed => {
                    return Err(ExportError::RemoteJobFailure(
                        job.error_message
                            .filter(|m| !m.is_empty())
                            .unwrap_or_else(|| "render job failed".to_string()),
                    ));
                }
                RemoteJobState::Pending => {}
            }

            let elapsed = started.elapsed();
            let progress = poll_progress(elapsed, timeout);
            channel.update(
                progress,
                format!("Rendering video... ({}s)", elapsed.as_secs()),
            );
            debug!(job_id, polls, progress, "Render job still pending");

            run_until_cancelled(token, tokio::time::sleep(self.config.poll_interval)).await?;
        }
    }

    fn fallback(&self) -> FallbackGenerator {
        FallbackGenerator {
            uploader: Arc::clone(&self.uploader),
            encoder: Arc::clone(&self.encoder),
            steps: self.config.fallback_steps,
            transport: self.config.fallback_transport,
            options: self.config.animation,
        }
    }
}

fn ensure_live(token: &CancellationToken) -> ExportResult<()> {
    if token.is_cancelled() {
        Err(ExportError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_progress_bounds() {
        let timeout = Duration::from_secs(60);
        assert_eq!(poll_progress(Duration::ZERO, timeout), 0.5);
        assert!((poll_progress(Duration::from_secs(30), timeout) - 0.725).abs() < 1e-9);
        assert!((poll_progress(timeout, timeout) - 0.95).abs() < 1e-9);
        assert!((poll_progress(Duration::from_secs(600), timeout) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_poll_progress_zero_budget() {
        assert!((poll_progress(Duration::from_secs(1), Duration::ZERO) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_progress_marks_are_ordered() {
        let marks = [
            PROGRESS_UPLOAD_START,
            PROGRESS_UPLOADED,
            PROGRESS_SUBMITTED,
            PROGRESS_ACCEPTED,
        ];
        assert!(marks.windows(2).all(|w| w[0] < w[1]));
        assert!(PROGRESS_FALLBACK < PROGRESS_ACCEPTED + PROGRESS_POLL_SPAN);
    }

    #[test]
    fn test_ensure_live() {
        let token = CancellationToken::new();
        assert!(ensure_live(&token).is_ok());
        token.cancel();
        assert!(ensure_live(&token).unwrap_err().is_cancelled());
    }
}
