//! R2 uploader implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use reveal_models::{run_until_cancelled, UploadedAsset};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::uploader::{AssetSource, AssetUploader};

/// Configuration for the R2 uploader.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Public base URL the bucket is served from
    pub public_base_url: String,
    /// Prefix for uploaded object keys
    pub key_prefix: String,
    /// Region (usually "auto" for R2)
    pub region: String,
}

impl R2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("R2_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("R2_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("R2_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("R2_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("R2_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("R2_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("R2_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("R2_BUCKET_NAME not set"))?,
            public_base_url: std::env::var("R2_PUBLIC_URL")
                .map_err(|_| StorageError::config_error("R2_PUBLIC_URL not set"))?,
            key_prefix: std::env::var("R2_KEY_PREFIX").unwrap_or_else(|_| "exports".to_string()),
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

/// Cloudflare R2 asset uploader.
#[derive(Clone)]
pub struct R2Uploader {
    client: Client,
    bucket: String,
    public_base_url: String,
    key_prefix: String,
}

impl R2Uploader {
    /// Create a new uploader from configuration.
    pub async fn new(config: R2Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self {
            client,
            bucket: config.bucket_name,
            public_base_url: config.public_base_url,
            key_prefix: config.key_prefix,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = R2Config::from_env()?;
        Self::new(config).await
    }

    /// Public URL for an object key.
    pub fn public_url(&self, key: &str) -> String {
        public_url(&self.public_base_url, key)
    }

    async fn put(&self, source: &AssetSource, key: &str) -> StorageResult<()> {
        let body = match source {
            AssetSource::Path(path) => {
                if tokio::fs::metadata(path).await.is_err() {
                    return Err(StorageError::not_found(path.display().to_string()));
                }
                ByteStream::from_path(path)
                    .await
                    .map_err(|e| StorageError::upload_failed(e.to_string()))?
            }
            AssetSource::Bytes { data, .. } => ByteStream::from(data.clone()),
        };

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(source.content_type())
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl AssetUploader for R2Uploader {
    async fn upload(
        &self,
        source: AssetSource,
        token: &CancellationToken,
    ) -> StorageResult<UploadedAsset> {
        let key = object_key(&self.key_prefix, &Uuid::new_v4().to_string(), source.extension());
        debug!("Uploading {} to {}", source.describe(), key);

        run_until_cancelled(token, self.put(&source, &key)).await??;

        info!("Uploaded {} to {}", source.describe(), key);
        Ok(UploadedAsset::new(key.clone(), self.public_url(&key)))
    }
}

/// Build an object key under `prefix`.
pub(crate) fn object_key(prefix: &str, id: &str, extension: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}.{}", id, extension)
    } else {
        format!("{}/{}.{}", prefix, id, extension)
    }
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("exports", "abc", "png"), "exports/abc.png");
        assert_eq!(object_key("/exports/frames/", "abc", "jpg"), "exports/frames/abc.jpg");
        assert_eq!(object_key("", "abc", "png"), "abc.png");
    }

    #[test]
    fn test_public_url_trims_slash() {
        assert_eq!(
            public_url("https://cdn.example.com/", "exports/a.png"),
            "https://cdn.example.com/exports/a.png"
        );
    }

    #[test]
    fn test_config_from_env_requires_public_url() {
        if std::env::var("R2_ENDPOINT_URL").is_err() {
            let err = R2Config::from_env().unwrap_err();
            assert!(matches!(err, StorageError::ConfigError(_)));
        }
    }

    #[tokio::test]
    async fn test_upload_aborts_on_cancelled_token() {
        let config = R2Config {
            endpoint_url: "http://127.0.0.1:9".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket_name: "bucket".to_string(),
            public_base_url: "https://cdn.example.com".to_string(),
            key_prefix: "exports".to_string(),
            region: "auto".to_string(),
        };
        let uploader = R2Uploader::new(config).await.unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = uploader
            .upload(AssetSource::png(vec![1, 2, 3]), &token)
            .await
            .unwrap_err();
        assert!(err.is_aborted());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let config = R2Config {
            endpoint_url: "http://127.0.0.1:9".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket_name: "bucket".to_string(),
            public_base_url: "https://cdn.example.com".to_string(),
            key_prefix: "exports".to_string(),
            region: "auto".to_string(),
        };
        let uploader = R2Uploader::new(config).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.jpg");

        let err = uploader
            .upload(AssetSource::path(missing), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
