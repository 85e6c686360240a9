//! Remote asset references and export results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An image stored in the remote asset store.
///
/// Produced by the uploader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct UploadedAsset {
    /// Opaque remote identifier
    pub handle: String,
    /// Public HTTPS URL
    pub secure_url: String,
}

impl UploadedAsset {
    pub fn new(handle: impl Into<String>, secure_url: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            secure_url: secure_url.into(),
        }
    }
}

/// Terminal result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportArtifact {
    /// Video produced by the remote renderer
    Video { url: String },
    /// Animated image produced by the local fallback
    AnimatedImage { url: String },
}

impl ExportArtifact {
    pub fn url(&self) -> &str {
        match self {
            ExportArtifact::Video { url } | ExportArtifact::AnimatedImage { url } => url,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, ExportArtifact::Video { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_serialization() {
        let artifact = ExportArtifact::AnimatedImage {
            url: "https://cdn/x.gif".into(),
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["kind"], "animated_image");
        assert_eq!(json["url"], "https://cdn/x.gif");
        assert!(!artifact.is_video());
        assert_eq!(artifact.url(), "https://cdn/x.gif");
    }
}
