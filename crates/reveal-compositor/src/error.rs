//! Compositor error types.

use thiserror::Error;

pub type CompositorResult<T> = Result<T, CompositorError>;

#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("Step count must be at least 1, got {0}")]
    InvalidSteps(u32),

    #[error("Image has no pixels: {0}")]
    EmptyImage(String),

    #[error("Composition cancelled")]
    Cancelled,

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl CompositorError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompositorError::Cancelled)
    }
}
