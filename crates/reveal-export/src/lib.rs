//! Before/after export orchestration.
//!
//! This crate drives one export attempt through its lifecycle:
//! - Upload both images through an [`AssetUploader`](reveal_storage::AssetUploader)
//! - Submit a render job and poll it within the attempt's time budget
//! - Fall back to a locally composited crossfade animation on timeout
//! - Publish every session change as a snapshot on the attempt's event stream
//!
//! Cancellation is cooperative: each attempt owns a token that every
//! suspension point observes, and a fired token always ends in `cancelled`.

pub mod config;
pub mod error;
mod fallback;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;

pub use config::{ExportConfig, FallbackTransport};
pub use error::{ExportError, ExportResult};
pub use logging::ExportLogger;
pub use orchestrator::{ExportHandle, ExportOrchestrator};
pub use pipeline::{poll_progress, ExportPipeline};
pub use progress::{ExportEvents, ProgressChannel};
