//! Shared data models for the Reveal export pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Export requests and transition kinds
//! - The export session state machine
//! - Uploaded assets and terminal export artifacts
//! - UI event messages derived from session snapshots
//! - Cooperative cancellation helpers

pub mod asset;
pub mod cancel;
pub mod event;
pub mod request;
pub mod session;
pub mod transition;

// Re-export common types
pub use asset::{ExportArtifact, UploadedAsset};
pub use cancel::{run_until_cancelled, Aborted};
pub use event::ExportEvent;
pub use request::{AttemptId, ExportRequest, DEFAULT_TIMEOUT_MS};
pub use session::{ExportSession, ExportStatus, InvalidTransition};
pub use transition::{TransitionKind, TransitionParseError};

pub use tokio_util::sync::CancellationToken;
