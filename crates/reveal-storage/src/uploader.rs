//! Asset uploader seam.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reveal_models::UploadedAsset;
use tokio_util::sync::CancellationToken;

use crate::error::StorageResult;

/// A local image to send to the asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// Image file on disk
    Path(PathBuf),
    /// Encoded image already in memory (e.g. a composited frame)
    Bytes {
        data: Vec<u8>,
        content_type: String,
    },
}

impl AssetSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn png(data: Vec<u8>) -> Self {
        Self::Bytes {
            data,
            content_type: "image/png".to_string(),
        }
    }

    /// MIME type of the source.
    pub fn content_type(&self) -> &str {
        match self {
            AssetSource::Path(path) => content_type_for_path(path),
            AssetSource::Bytes { content_type, .. } => content_type,
        }
    }

    /// File extension used for the stored object.
    pub fn extension(&self) -> &str {
        match self.content_type() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/heic" => "heic",
            _ => "bin",
        }
    }

    /// Human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            AssetSource::Path(path) => path.display().to_string(),
            AssetSource::Bytes { data, content_type } => {
                format!("<{} bytes of {}>", data.len(), content_type)
            }
        }
    }
}

/// Guess an image MIME type from a file extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") | Some("heif") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Sends local images to a remote asset store.
///
/// Implementations must stop promptly when `token` fires and report
/// [`StorageError::Aborted`](crate::StorageError::Aborted) rather than a
/// generic failure.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(
        &self,
        source: AssetSource,
        token: &CancellationToken,
    ) -> StorageResult<UploadedAsset>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(content_type_for_path(Path::new("a/b.JPG")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("x.jpeg")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("x.png")), "image/png");
        assert_eq!(content_type_for_path(Path::new("x.heif")), "image/heic");
        assert_eq!(content_type_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_source_extension() {
        assert_eq!(AssetSource::path("before.jpeg").extension(), "jpg");
        assert_eq!(AssetSource::png(vec![1, 2, 3]).extension(), "png");
        assert_eq!(AssetSource::path("clip.mov").extension(), "bin");
    }

    #[test]
    fn test_describe_bytes() {
        let source = AssetSource::png(vec![0; 16]);
        assert_eq!(source.describe(), "<16 bytes of image/png>");
    }
}
