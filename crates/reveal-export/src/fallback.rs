//! Local fallback animation.
//!
//! Composites the before/after pair into a crossfade, hands the frames to
//! the encoder (inline or via upload) and returns the animation URL.

use std::path::PathBuf;
use std::sync::Arc;

use reveal_compositor::{composite, load_image, CompositeFrame, CompositorError};
use reveal_models::ExportRequest;
use reveal_render_client::{AnimationEncoder, AnimationOptions};
use reveal_storage::{AssetSource, AssetUploader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::FallbackTransport;
use crate::error::{ExportError, ExportResult};

/// Builds the fallback animation for one attempt.
pub(crate) struct FallbackGenerator {
    pub(crate) uploader: Arc<dyn AssetUploader>,
    pub(crate) encoder: Arc<dyn AnimationEncoder>,
    pub(crate) steps: u32,
    pub(crate) transport: FallbackTransport,
    pub(crate) options: AnimationOptions,
}

impl FallbackGenerator {
    pub(crate) async fn generate(
        &self,
        request: &ExportRequest,
        token: &CancellationToken,
    ) -> ExportResult<String> {
        let frames = self.composite_frames(request, token).await?;
        let frame_refs = self.transport_frames(frames, token).await?;

        if token.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        debug!(
            frames = frame_refs.len(),
            transport = %self.transport,
            "Encoding fallback animation"
        );
        let encoded = self
            .encoder
            .encode(&frame_refs, &self.options, token)
            .await
            .map_err(ExportError::encoding)?;
        Ok(encoded.url)
    }

    /// Decode both images and blend them off the async runtime.
    async fn composite_frames(
        &self,
        request: &ExportRequest,
        token: &CancellationToken,
    ) -> ExportResult<Vec<CompositeFrame>> {
        let before_path = PathBuf::from(&request.before_image);
        let after_path = PathBuf::from(&request.after_image);
        let steps = self.steps;
        let task_token = token.clone();

        tokio::task::spawn_blocking(move || -> Result<_, CompositorError> {
            let before = load_image(&before_path)?;
            let after = load_image(&after_path)?;
            composite(&before, &after, steps, &task_token)
        })
        .await
        .map_err(|e| ExportError::internal(format!("composite task failed: {}", e)))?
        .map_err(ExportError::composition)
    }

    /// Turn frames into the strings the encoder accepts, preserving order.
    async fn transport_frames(
        &self,
        frames: Vec<CompositeFrame>,
        token: &CancellationToken,
    ) -> ExportResult<Vec<String>> {
        match self.transport {
            FallbackTransport::Inline => {
                let task_token = token.clone();
                tokio::task::spawn_blocking(move || {
                    encode_each(&frames, &task_token, CompositeFrame::to_data_uri)
                })
                .await
                .map_err(|e| ExportError::internal(format!("frame encode task failed: {}", e)))?
                .map_err(ExportError::composition)
            }
            FallbackTransport::Upload => {
                let task_token = token.clone();
                let encoded = tokio::task::spawn_blocking(move || {
                    encode_each(&frames, &task_token, CompositeFrame::encode_png)
                })
                .await
                .map_err(|e| ExportError::internal(format!("frame encode task failed: {}", e)))?
                .map_err(ExportError::composition)?;

                let mut urls = Vec::with_capacity(encoded.len());
                for png in encoded {
                    if token.is_cancelled() {
                        return Err(ExportError::Cancelled);
                    }
                    let asset = self
                        .uploader
                        .upload(AssetSource::png(png), token)
                        .await
                        .map_err(ExportError::frame_upload)?;
                    urls.push(asset.secure_url);
                }
                Ok(urls)
            }
        }
    }
}

/// Encode frames in order, checking the token before each one.
fn encode_each<T>(
    frames: &[CompositeFrame],
    token: &CancellationToken,
    encode: impl Fn(&CompositeFrame) -> Result<T, CompositorError>,
) -> Result<Vec<T>, CompositorError> {
    let mut encoded = Vec::with_capacity(frames.len());
    for frame in frames {
        if token.is_cancelled() {
            return Err(CompositorError::Cancelled);
        }
        encoded.push(encode(frame)?);
    }
    Ok(encoded)
}
