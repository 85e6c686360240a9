//! Export metrics.
//!
//! Recorded through the `metrics` facade; the binary installs a Prometheus
//! recorder, library callers may install their own or none.

use std::time::Duration;

use metrics::{counter, histogram};

/// Metric name constants.
pub mod names {
    /// Export attempts started.
    pub const ATTEMPTS_TOTAL: &str = "reveal_export_attempts_total";

    /// Terminal outcomes by `outcome` (video, animated_image, failed, cancelled).
    pub const OUTCOMES_TOTAL: &str = "reveal_export_outcomes_total";

    /// Attempts that timed out polling and switched to the local fallback.
    pub const FALLBACKS_TOTAL: &str = "reveal_export_fallbacks_total";

    /// Failures by error kind.
    pub const FAILURES_TOTAL: &str = "reveal_export_failures_total";

    /// Status checks made per attempt.
    pub const POLLS: &str = "reveal_export_polls";

    /// Attempt duration in seconds by outcome.
    pub const DURATION_SECONDS: &str = "reveal_export_duration_seconds";
}

/// Record a started attempt.
pub fn record_attempt() {
    counter!(names::ATTEMPTS_TOTAL).increment(1);
}

/// Record a terminal outcome and how long the attempt took.
pub fn record_outcome(outcome: &'static str, elapsed: Duration) {
    counter!(names::OUTCOMES_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::DURATION_SECONDS, "outcome" => outcome).record(elapsed.as_secs_f64());
}

/// Record a failure by error kind.
pub fn record_failure(kind: &'static str) {
    counter!(names::FAILURES_TOTAL, "kind" => kind).increment(1);
}

/// Record a switch to the local fallback after `polls` status checks.
pub fn record_fallback(polls: u32) {
    counter!(names::FALLBACKS_TOTAL).increment(1);
    histogram!(names::POLLS).record(polls as f64);
}

/// Record how many status checks an attempt needed.
pub fn record_polls(polls: u32) {
    histogram!(names::POLLS).record(polls as f64);
}
