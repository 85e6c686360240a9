//! Remote animation encoder client.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{RenderError, RenderResult};
use crate::http::{HttpTransport, ServiceConfig};
use crate::types::{AnimationOptions, AnimationRequest, EncodedAnimation};

/// Default encoder service URL for local development.
pub const DEFAULT_ENCODER_URL: &str = "http://localhost:8011";

/// Encodes an ordered frame list into an animated image.
///
/// The frame list is borrowed; implementations must not reorder or alter it.
#[async_trait]
pub trait AnimationEncoder: Send + Sync {
    async fn encode(
        &self,
        frames: &[String],
        options: &AnimationOptions,
        token: &CancellationToken,
    ) -> RenderResult<EncodedAnimation>;
}

/// HTTP client for the encoder service.
#[derive(Debug, Clone)]
pub struct HttpAnimationEncoder {
    transport: HttpTransport,
}

impl HttpAnimationEncoder {
    pub fn new(config: ServiceConfig) -> RenderResult<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    /// Create from `ENCODER_SERVICE_*` environment variables.
    pub fn from_env() -> RenderResult<Self> {
        Self::new(ServiceConfig::from_env_prefixed(
            "ENCODER_SERVICE",
            DEFAULT_ENCODER_URL,
        ))
    }
}

#[async_trait]
impl AnimationEncoder for HttpAnimationEncoder {
    async fn encode(
        &self,
        frames: &[String],
        options: &AnimationOptions,
        token: &CancellationToken,
    ) -> RenderResult<EncodedAnimation> {
        if frames.is_empty() {
            return Err(RenderError::RequestFailed(
                "cannot encode an empty frame list".to_string(),
            ));
        }

        debug!(frames = frames.len(), "Submitting frames to encoder");
        let request = AnimationRequest {
            frames,
            options: *options,
        };
        let encoded: EncodedAnimation = self.transport.post_json("animations", &request, token).await?;

        if encoded.url.is_empty() {
            return Err(RenderError::invalid_response("encoder returned an empty URL"));
        }

        info!(url = %encoded.url, "Animation encoded");
        Ok(encoded)
    }
}
