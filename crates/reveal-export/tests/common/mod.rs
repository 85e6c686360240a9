//! In-memory collaborators for export tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use reveal_export::{ExportConfig, ExportOrchestrator};
use reveal_models::{run_until_cancelled, ExportSession, ExportStatus, UploadedAsset};
use reveal_render_client::{
    AnimationEncoder, AnimationOptions, EncodedAnimation, RemoteJob, RemoteJobState, RenderError,
    RenderJobClient, RenderJobRequest, RenderResult, SubmittedJob,
};
use reveal_storage::{AssetSource, AssetUploader, StorageError, StorageResult};
use tokio_util::sync::CancellationToken;

pub const VIDEO_URL: &str = "https://render.test/video.mp4";
pub const ANIMATION_URL: &str = "https://encoder.test/animation.gif";

/// Uploader that hands out sequential `asset-N` handles.
#[derive(Default)]
pub struct FakeUploader {
    delay: Duration,
    fail_when: Option<String>,
    calls: AtomicUsize,
    uploaded: Mutex<Vec<String>>,
}

impl FakeUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload takes `delay` before it resolves.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Uploads whose source description contains `pattern` fail.
    pub fn failing_when(mut self, pattern: &str) -> Self {
        self.fail_when = Some(pattern.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetUploader for FakeUploader {
    async fn upload(
        &self,
        source: AssetSource,
        token: &CancellationToken,
    ) -> StorageResult<UploadedAsset> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            run_until_cancelled(token, tokio::time::sleep(self.delay)).await?;
        } else if token.is_cancelled() {
            return Err(StorageError::Aborted);
        }

        let description = source.describe();
        if let Some(pattern) = &self.fail_when {
            if description.contains(pattern.as_str()) {
                return Err(StorageError::upload_failed("bucket unavailable"));
            }
        }

        self.uploaded.lock().unwrap().push(description);
        Ok(UploadedAsset::new(
            format!("asset-{}", n),
            format!("https://cdn.test/asset-{}.png", n),
        ))
    }
}

/// One scripted status response.
#[derive(Debug, Clone)]
pub enum Step {
    Pending,
    Completed(String),
    Failed(String),
}

/// Render service whose jobs follow a script chosen at submission time.
///
/// Each submission pops the next script; a job whose script is exhausted
/// stays pending forever.
#[derive(Default)]
pub struct FakeRenderClient {
    scripts: Mutex<VecDeque<Vec<Step>>>,
    jobs: Mutex<HashMap<String, VecDeque<Step>>>,
    reject_submit: bool,
    submit_delay: Duration,
    submits: AtomicUsize,
    status_calls: AtomicUsize,
    requests: Mutex<Vec<RenderJobRequest>>,
}

impl FakeRenderClient {
    pub fn pending_forever() -> Self {
        Self::default()
    }

    pub fn with_script(steps: Vec<Step>) -> Self {
        Self::default().then_script(steps)
    }

    /// Script for the next submitted job.
    pub fn then_script(self, steps: Vec<Step>) -> Self {
        self.scripts.lock().unwrap().push_back(steps);
        self
    }

    pub fn completes_after(pending_polls: usize) -> Self {
        let mut steps = vec![Step::Pending; pending_polls];
        steps.push(Step::Completed(VIDEO_URL.to_string()));
        Self::with_script(steps)
    }

    pub fn rejecting_submissions() -> Self {
        Self {
            reject_submit: true,
            ..Self::default()
        }
    }

    /// Submissions take `delay` before the service answers.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RenderJobRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RenderJobClient for FakeRenderClient {
    async fn submit(
        &self,
        request: &RenderJobRequest,
        token: &CancellationToken,
    ) -> RenderResult<SubmittedJob> {
        if token.is_cancelled() {
            return Err(RenderError::Aborted);
        }
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if !self.submit_delay.is_zero() {
            run_until_cancelled(token, tokio::time::sleep(self.submit_delay)).await?;
        }
        if self.reject_submit {
            return Err(RenderError::RequestFailed("HTTP 400: bad handles".to_string()));
        }

        let job_id = format!("job-{}", n);
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        self.jobs
            .lock()
            .unwrap()
            .insert(job_id.clone(), script.into_iter().collect());
        Ok(SubmittedJob { job_id })
    }

    async fn status(&self, job_id: &str, token: &CancellationToken) -> RenderResult<RemoteJob> {
        if token.is_cancelled() {
            return Err(RenderError::Aborted);
        }
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .jobs
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(|steps| steps.pop_front())
            .unwrap_or(Step::Pending);

        let (status, result_url, error_message) = match step {
            Step::Pending => (RemoteJobState::Pending, None, None),
            Step::Completed(url) => (RemoteJobState::Completed, Some(url), None),
            Step::Failed(message) => (RemoteJobState::Failed, None, Some(message)),
        };
        Ok(RemoteJob {
            job_id: job_id.to_string(),
            status,
            result_url,
            error_message,
        })
    }
}

/// Encoder that records every frame batch it receives.
#[derive(Default)]
pub struct FakeEncoder {
    fail: bool,
    batches: Mutex<Vec<(Vec<String>, AnimationOptions)>>,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn batches(&self) -> Vec<(Vec<String>, AnimationOptions)> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnimationEncoder for FakeEncoder {
    async fn encode(
        &self,
        frames: &[String],
        options: &AnimationOptions,
        token: &CancellationToken,
    ) -> RenderResult<EncodedAnimation> {
        if token.is_cancelled() {
            return Err(RenderError::Aborted);
        }
        self.batches
            .lock()
            .unwrap()
            .push((frames.to_vec(), *options));
        if self.fail {
            return Err(RenderError::ServiceUnavailable("HTTP 503".to_string()));
        }
        Ok(EncodedAnimation {
            url: ANIMATION_URL.to_string(),
        })
    }
}

/// Collaborators plus the orchestrator wired to them.
pub struct Harness {
    pub uploader: Arc<FakeUploader>,
    pub render: Arc<FakeRenderClient>,
    pub encoder: Arc<FakeEncoder>,
    pub orchestrator: ExportOrchestrator,
}

impl Harness {
    pub fn new(uploader: FakeUploader, render: FakeRenderClient, encoder: FakeEncoder) -> Self {
        Self::with_config(uploader, render, encoder, ExportConfig::default())
    }

    pub fn with_config(
        uploader: FakeUploader,
        render: FakeRenderClient,
        encoder: FakeEncoder,
        config: ExportConfig,
    ) -> Self {
        let uploader = Arc::new(uploader);
        let render = Arc::new(render);
        let encoder = Arc::new(encoder);
        let orchestrator = ExportOrchestrator::new(
            uploader.clone(),
            render.clone(),
            encoder.clone(),
            config,
        );
        Self {
            uploader,
            render,
            encoder,
            orchestrator,
        }
    }
}

/// Write a small before/after pair of different sizes into `dir`.
pub fn write_image_pair(dir: &Path) -> (String, String) {
    let before = dir.join("before.png");
    let after = dir.join("after.png");
    RgbaImage::from_pixel(8, 6, Rgba([20, 40, 60, 255]))
        .save(&before)
        .unwrap();
    RgbaImage::from_pixel(16, 12, Rgba([220, 200, 180, 255]))
        .save(&after)
        .unwrap();
    (
        before.display().to_string(),
        after.display().to_string(),
    )
}

pub fn statuses(snapshots: &[ExportSession]) -> Vec<ExportStatus> {
    let mut statuses: Vec<ExportStatus> = snapshots.iter().map(|s| s.status).collect();
    statuses.dedup();
    statuses
}

pub fn assert_monotonic(snapshots: &[ExportSession]) {
    for pair in snapshots.windows(2) {
        if pair[1].status == ExportStatus::Cancelled {
            continue;
        }
        assert!(
            pair[0].progress <= pair[1].progress,
            "progress went backwards: {} ({}) -> {} ({})",
            pair[0].progress,
            pair[0].status,
            pair[1].progress,
            pair[1].status
        );
    }
}
