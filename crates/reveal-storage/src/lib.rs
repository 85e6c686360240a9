//! Asset storage for the export pipeline.
//!
//! This crate provides:
//! - The [`AssetUploader`] seam used by the orchestrator
//! - Local image sources (files or in-memory buffers)
//! - A Cloudflare R2 implementation returning public URLs

pub mod client;
pub mod error;
pub mod uploader;

pub use client::{R2Config, R2Uploader};
pub use error::{StorageError, StorageResult};
pub use uploader::{content_type_for_path, AssetSource, AssetUploader};
