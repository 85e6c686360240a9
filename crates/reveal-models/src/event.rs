//! UI event messages.
//!
//! A flattened, JSON-friendly projection of [`ExportSession`] snapshots for
//! transports that only care about what changed (progress bars, toasts).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{ExportSession, ExportStatus};

/// Export event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    /// Status line with timestamp
    Log {
        status: ExportStatus,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Progress update (0-100)
    Progress { value: u8 },

    /// Export finished with a result URL
    Done {
        url: String,
        #[serde(rename = "isVideo")]
        is_video: bool,
    },

    /// Export failed
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Export cancelled by the user
    Cancelled,
}

impl ExportEvent {
    /// Create a progress event from a fraction in [0, 1].
    pub fn progress(fraction: f64) -> Self {
        let value = (fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
        ExportEvent::Progress { value }
    }

    /// Events describing a snapshot, in display order.
    pub fn from_session(session: &ExportSession) -> Vec<Self> {
        match session.status {
            ExportStatus::Complete => match session.artifact() {
                Some(artifact) => vec![
                    Self::progress(session.progress),
                    ExportEvent::Done {
                        url: artifact.url().to_string(),
                        is_video: artifact.is_video(),
                    },
                ],
                None => vec![ExportEvent::Error {
                    message: "Export completed without a result".to_string(),
                    timestamp: session.updated_at,
                }],
            },
            ExportStatus::Failed => vec![ExportEvent::Error {
                message: session
                    .error_detail
                    .clone()
                    .unwrap_or_else(|| session.message.clone()),
                timestamp: session.updated_at,
            }],
            ExportStatus::Cancelled => vec![ExportEvent::Cancelled],
            status => vec![
                ExportEvent::Log {
                    status,
                    message: session.message.clone(),
                    timestamp: session.updated_at,
                },
                Self::progress(session.progress),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExportArtifact;

    #[test]
    fn test_progress_rounding() {
        assert_eq!(ExportEvent::progress(0.456), ExportEvent::Progress { value: 46 });
        assert_eq!(ExportEvent::progress(2.0), ExportEvent::Progress { value: 100 });
    }

    #[test]
    fn test_events_for_live_session() {
        let mut session = ExportSession::idle();
        session
            .transition(ExportStatus::Uploading, "Uploading images...")
            .unwrap();
        session.set_progress(0.1);

        let events = ExportEvent::from_session(&session);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            ExportEvent::Log { status: ExportStatus::Uploading, message, .. } if message == "Uploading images..."
        ));
        assert_eq!(events[1], ExportEvent::Progress { value: 10 });
    }

    #[test]
    fn test_events_for_completed_session() {
        let mut session = ExportSession::idle();
        session.transition(ExportStatus::Uploading, "").unwrap();
        session.transition(ExportStatus::Requesting, "").unwrap();
        session.transition(ExportStatus::Polling, "").unwrap();
        session
            .complete(&ExportArtifact::Video { url: "https://v".into() }, "done")
            .unwrap();

        let events = ExportEvent::from_session(&session);
        assert_eq!(
            events.last(),
            Some(&ExportEvent::Done {
                url: "https://v".into(),
                is_video: true
            })
        );

        let json = serde_json::to_value(events.last().unwrap()).unwrap();
        assert_eq!(json["type"], "done");
        assert_eq!(json["isVideo"], true);
    }
}
