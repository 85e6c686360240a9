//! Export configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reveal_models::DEFAULT_TIMEOUT_MS;
use reveal_render_client::AnimationOptions;

/// How composited fallback frames reach the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackTransport {
    /// Embed each frame as a `data:image/png;base64,...` URI
    #[default]
    Inline,
    /// Upload each frame and pass its public URL
    Upload,
}

impl FallbackTransport {
    /// Get the transport name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackTransport::Inline => "inline",
            FallbackTransport::Upload => "upload",
        }
    }
}

impl fmt::Display for FallbackTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FallbackTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" | "data" | "data_uri" => Ok(FallbackTransport::Inline),
            "upload" | "url" => Ok(FallbackTransport::Upload),
            other => Err(format!("unknown fallback transport: {}", other)),
        }
    }
}

/// Export orchestrator configuration.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Delay between render status checks
    pub poll_interval: Duration,
    /// Total clip length requested from the render service
    pub clip_duration_ms: u64,
    /// Crossfade intervals in the fallback animation (frames = steps + 1)
    pub fallback_steps: u32,
    /// Encoder settings for the fallback animation
    pub animation: AnimationOptions,
    /// How fallback frames are handed to the encoder
    pub fallback_transport: FallbackTransport,
    /// Polling budget used when a caller does not supply one
    pub default_timeout_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            clip_duration_ms: 2500,
            fallback_steps: 10,
            animation: AnimationOptions::default(),
            fallback_transport: FallbackTransport::Inline,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ExportConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: Duration::from_millis(
                env_parse("EXPORT_POLL_INTERVAL_MS")
                    .filter(|ms| *ms > 0)
                    .unwrap_or(defaults.poll_interval.as_millis() as u64),
            ),
            clip_duration_ms: env_parse("EXPORT_CLIP_DURATION_MS")
                .unwrap_or(defaults.clip_duration_ms),
            fallback_steps: env_parse("EXPORT_FALLBACK_STEPS")
                .filter(|steps| *steps > 0)
                .unwrap_or(defaults.fallback_steps),
            animation: AnimationOptions {
                frame_delay_ms: env_parse("EXPORT_FRAME_DELAY_MS")
                    .unwrap_or(defaults.animation.frame_delay_ms),
                loop_forever: defaults.animation.loop_forever,
            },
            fallback_transport: std::env::var("EXPORT_FALLBACK_TRANSPORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fallback_transport),
            default_timeout_ms: env_parse("EXPORT_DEFAULT_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.default_timeout_ms),
        }
    }

    /// Set the delay between status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set how fallback frames reach the encoder.
    pub fn with_fallback_transport(mut self, transport: FallbackTransport) -> Self {
        self.fallback_transport = transport;
        self
    }

    /// Set the number of crossfade intervals.
    pub fn with_fallback_steps(mut self, steps: u32) -> Self {
        self.fallback_steps = steps;
        self
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
