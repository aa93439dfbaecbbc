//! Observability stubs (metrics, tracing)

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters on client/orchestrator activity
#[derive(Debug, Default)]
pub struct Metrics {
    requests_sent: AtomicU64,
    fallbacks_taken: AtomicU64,
    soft_failures: AtomicU64,
    timeouts_recovered: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "requests_sent", "Metric incremented");
    }

    pub fn fallback_taken(&self) {
        self.fallbacks_taken.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fallbacks_taken", "Metric incremented");
    }

    pub fn soft_failure(&self) {
        self.soft_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "soft_failures", "Metric incremented");
    }

    pub fn timeout_recovered(&self) {
        self.timeouts_recovered.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "timeouts_recovered", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            fallbacks_taken: self.fallbacks_taken.load(Ordering::Relaxed),
            soft_failures: self.soft_failures.load(Ordering::Relaxed),
            timeouts_recovered: self.timeouts_recovered.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub fallbacks_taken: u64,
    pub soft_failures: u64,
    pub timeouts_recovered: u64,
}
