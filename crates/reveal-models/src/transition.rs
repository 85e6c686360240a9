//! Transition kinds between the "before" and "after" image.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Transition duration for a cross-dissolve, in milliseconds.
pub const CROSSFADE_TRANSITION_MS: u64 = 700;

/// Transition duration for every other transition kind, in milliseconds.
pub const DEFAULT_TRANSITION_MS: u64 = 400;

/// Visual transition used by the remote renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Cross-dissolve from before to after
    #[default]
    Crossfade,
    /// After image slides in over before
    Slide,
    /// Hard-edged wipe
    Wipe,
    /// Zoom through to the after image
    Zoom,
}

impl TransitionKind {
    pub const ALL: &'static [TransitionKind] = &[
        TransitionKind::Crossfade,
        TransitionKind::Slide,
        TransitionKind::Wipe,
        TransitionKind::Zoom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Crossfade => "crossfade",
            TransitionKind::Slide => "slide",
            TransitionKind::Wipe => "wipe",
            TransitionKind::Zoom => "zoom",
        }
    }

    /// Whether this kind is the cross-dissolve.
    pub fn is_crossfade(&self) -> bool {
        matches!(self, TransitionKind::Crossfade)
    }

    /// Transition duration sent to the renderer.
    pub fn transition_ms(&self) -> u64 {
        if self.is_crossfade() {
            CROSSFADE_TRANSITION_MS
        } else {
            DEFAULT_TRANSITION_MS
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransitionKind {
    type Err = TransitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crossfade" | "cross_fade" | "dissolve" => Ok(TransitionKind::Crossfade),
            "slide" => Ok(TransitionKind::Slide),
            "wipe" => Ok(TransitionKind::Wipe),
            "zoom" => Ok(TransitionKind::Zoom),
            _ => Err(TransitionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown transition: {0}")]
pub struct TransitionParseError(String);
