//! Render and encoder service request/response types.

use serde::{Deserialize, Serialize};

/// Request to render a transition video from two uploaded images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderJobRequest {
    /// Asset handle of the "before" image
    pub before_handle: String,
    /// Asset handle of the "after" image
    pub after_handle: String,
    /// Transition length in milliseconds
    pub transition_ms: u64,
    /// Total clip length in milliseconds
    pub duration_ms: u64,
    /// Whether to lay a music track under the clip
    pub has_music: bool,
}

/// Response to a job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedJob {
    #[serde(alias = "jobId", alias = "id")]
    pub job_id: String,
}

/// Remote job state as reported by the render service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteJobState {
    #[serde(alias = "queued", alias = "processing")]
    Pending,
    Completed,
    Failed,
}

/// Snapshot of a remote render job. Owned by the service; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteJob {
    #[serde(alias = "jobId", alias = "id")]
    pub job_id: String,
    pub status: RemoteJobState,
    #[serde(default, alias = "resultUrl", skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(default, alias = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RemoteJob {
    /// Result URL, if the job completed and produced one.
    pub fn completed_url(&self) -> Option<&str> {
        match (self.status, self.result_url.as_deref()) {
            (RemoteJobState::Completed, Some(url)) if !url.is_empty() => Some(url),
            _ => None,
        }
    }
}

/// Encoder settings applied to a whole frame batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationOptions {
    /// Delay between frames in milliseconds
    pub frame_delay_ms: u64,
    /// Whether the animation loops
    pub loop_forever: bool,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            frame_delay_ms: 100,
            loop_forever: true,
        }
    }
}

/// Request body sent to the encoder. Borrows the frame list.
#[derive(Debug, Serialize)]
pub struct AnimationRequest<'a> {
    /// Ordered frames (data URIs or public URLs)
    pub frames: &'a [String],
    #[serde(flatten)]
    pub options: AnimationOptions,
}

/// Encoded animated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedAnimation {
    pub url: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_job_parses_service_aliases() {
        let job: RemoteJob = serde_json::from_str(
            r#"{"jobId":"j1","status":"processing"}"#,
        )
        .unwrap();
        assert_eq!(job.status, RemoteJobState::Pending);
        assert!(job.completed_url().is_none());

        let job: RemoteJob = serde_json::from_str(
            r#"{"job_id":"j1","status":"completed","resultUrl":"https://v.mp4"}"#,
        )
        .unwrap();
        assert_eq!(job.completed_url(), Some("https://v.mp4"));
    }

    #[test]
    fn test_completed_without_url_has_no_result() {
        let job = RemoteJob {
            job_id: "j".into(),
            status: RemoteJobState::Completed,
            result_url: Some(String::new()),
            error_message: None,
        };
        assert!(job.completed_url().is_none());
    }

    #[test]
    fn test_animation_request_flattens_options() {
        let frames = vec!["a".to_string(), "b".to_string()];
        let request = AnimationRequest {
            frames: &frames,
            options: AnimationOptions::default(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["frames"][1], "b");
        assert_eq!(json["frame_delay_ms"], 100);
        assert_eq!(json["loop_forever"], true);
    }
}
