//! Export request definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::TransitionKind;

/// Default budget for the remote render poll phase, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Unique identifier for one export attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AttemptId(pub String);

impl AttemptId {
    /// Generate a new random attempt ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable input to one export attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ExportRequest {
    /// Local location of the "before" image
    #[validate(length(min = 1, message = "before image is required"))]
    pub before_image: String,

    /// Local location of the "after" image
    #[validate(length(min = 1, message = "after image is required"))]
    pub after_image: String,

    /// Transition requested from the renderer
    #[serde(default)]
    pub transition: TransitionKind,

    /// Whether the rendered clip carries a music track
    #[serde(default)]
    pub has_music: bool,

    /// Budget for the remote poll phase
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1, message = "timeout must be positive"))]
    pub timeout_ms: u64,
}

impl ExportRequest {
    /// Create a request with default transition, no music and the default timeout.
    pub fn new(before_image: impl Into<String>, after_image: impl Into<String>) -> Self {
        Self {
            before_image: before_image.into(),
            after_image: after_image.into(),
            transition: TransitionKind::default(),
            has_music: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_transition(mut self, transition: TransitionKind) -> Self {
        self.transition = transition;
        self
    }

    pub fn with_music(mut self, has_music: bool) -> Self {
        self.has_music = has_music;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn before_path(&self) -> &Path {
        Path::new(&self.before_image)
    }

    pub fn after_path(&self) -> &Path {
        Path::new(&self.after_image)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
