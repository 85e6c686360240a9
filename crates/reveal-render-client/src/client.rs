//! Remote render job client.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RenderResult;
use crate::http::{HttpTransport, ServiceConfig};
use crate::types::{HealthResponse, RemoteJob, RenderJobRequest, SubmittedJob};

/// Default render service URL for local development.
pub const DEFAULT_RENDER_URL: &str = "http://localhost:8010";

/// Submits render jobs and reads their status.
#[async_trait]
pub trait RenderJobClient: Send + Sync {
    /// Submit a render job. Returns the service's job identifier.
    async fn submit(
        &self,
        request: &RenderJobRequest,
        token: &CancellationToken,
    ) -> RenderResult<SubmittedJob>;

    /// Read a snapshot of a job's state.
    async fn status(&self, job_id: &str, token: &CancellationToken) -> RenderResult<RemoteJob>;
}

/// HTTP client for the render service.
#[derive(Debug, Clone)]
pub struct HttpRenderClient {
    transport: HttpTransport,
}

impl HttpRenderClient {
    /// Create a new render client.
    pub fn new(config: ServiceConfig) -> RenderResult<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    /// Create from `RENDER_SERVICE_*` environment variables.
    pub fn from_env() -> RenderResult<Self> {
        Self::new(ServiceConfig::from_env_prefixed(
            "RENDER_SERVICE",
            DEFAULT_RENDER_URL,
        ))
    }

    /// Check if the render service is healthy.
    pub async fn health_check(&self) -> RenderResult<bool> {
        let url = self.transport.config().endpoint("health");

        match self.transport.client().get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Render service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Render service health check error: {}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl RenderJobClient for HttpRenderClient {
    async fn submit(
        &self,
        request: &RenderJobRequest,
        token: &CancellationToken,
    ) -> RenderResult<SubmittedJob> {
        debug!(
            transition_ms = request.transition_ms,
            duration_ms = request.duration_ms,
            has_music = request.has_music,
            "Submitting render job"
        );
        let job: SubmittedJob = self.transport.post_json("jobs", request, token).await?;
        info!(job_id = %job.job_id, "Render job accepted");
        Ok(job)
    }

    async fn status(&self, job_id: &str, token: &CancellationToken) -> RenderResult<RemoteJob> {
        let path = format!("jobs/{}", urlencoding::encode(job_id));
        self.transport.get_json(&path, token).await
    }
}
