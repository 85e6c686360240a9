//! Storage error types.

use reveal_models::Aborted;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Upload aborted")]
    Aborted,
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    /// Whether the upload stopped because its cancellation token fired.
    pub fn is_aborted(&self) -> bool {
        matches!(self, StorageError::Aborted)
    }
}

impl From<Aborted> for StorageError {
    fn from(_: Aborted) -> Self {
        StorageError::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_aborted_is_aborted() {
        let errors = [
            StorageError::config_error("R2_BUCKET_NAME not set"),
            StorageError::not_found("/photos/before.jpg"),
            StorageError::upload_failed("503"),
            StorageError::from(Aborted),
        ];
        for err in errors {
            let expected = match err {
                StorageError::Aborted => true,
                StorageError::ConfigError(_)
                | StorageError::NotFound(_)
                | StorageError::UploadFailed(_) => false,
            };
            assert_eq!(err.is_aborted(), expected, "{err}");
        }
    }
}
