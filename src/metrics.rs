use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the forwarding loop
///
/// Thread-safe atomic counters shared by every request.
#[derive(Default)]
pub struct RetryMetrics {
    /// Upstream POSTs issued
    pub attempts: AtomicU64,

    /// Attempts answered with a 2xx
    pub successes: AtomicU64,

    /// Attempts answered with 403
    pub challenge_rejections: AtomicU64,

    /// Refreshes that produced a new clearance
    pub refreshes_succeeded: AtomicU64,

    /// Refreshes that produced nothing
    pub refreshes_failed: AtomicU64,

    /// Attempts answered with any other non-success status
    pub upstream_errors: AtomicU64,

    /// Attempts that never got a status
    pub transport_failures: AtomicU64,

    /// Requests that used up every attempt
    pub exhausted: AtomicU64,
}

impl RetryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_challenge(&self) {
        self.challenge_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one clearance refresh
    pub fn record_refresh(&self, succeeded: bool) {
        if succeeded {
            self.refreshes_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.refreshes_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get success rate of individual attempts as percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.attempts.load(Ordering::Relaxed);
        let successful = self.successes.load(Ordering::Relaxed);
        if total > 0 {
            (successful as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Get snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            challenge_rejections: self.challenge_rejections.load(Ordering::Relaxed),
            refreshes_succeeded: self.refreshes_succeeded.load(Ordering::Relaxed),
            refreshes_failed: self.refreshes_failed.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            success_rate: self.success_rate(),
        }
    }
}

/// Immutable snapshot of metrics at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub challenge_rejections: u64,
    pub refreshes_succeeded: u64,
    pub refreshes_failed: u64,
    pub upstream_errors: u64,
    pub transport_failures: u64,
    pub exhausted: u64,
    pub success_rate: f64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Retry Metrics: {} attempts ({:.1}% success), {} challenges, {}/{} refreshes ok, {} exhausted",
            self.attempts,
            self.success_rate,
            self.challenge_rejections,
            self.refreshes_succeeded,
            self.refreshes_succeeded + self.refreshes_failed,
            self.exhausted
        )
    }
}
