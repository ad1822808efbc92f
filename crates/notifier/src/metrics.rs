//! Notifier metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for the notifier worker
#[derive(Debug, Default)]
pub struct NotifierMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Alerts handled by the channel without error
    sent_count: AtomicU64,
    /// Alerts whose channel call failed outright
    failure_count: AtomicU64,
    /// Alerts dropped because the queue was full
    dropped_count: AtomicU64,
    /// Individual recipient deliveries
    delivered_count: AtomicU64,
    /// Individual recipient failures
    recipient_failures: AtomicU64,
}

impl NotifierMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::Relaxed)
    }

    pub fn inc_sent_count(&self) {
        self.sent_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold a per-recipient delivery report into the totals
    pub fn add_report(&self, delivered: usize, failed: usize) {
        self.delivered_count
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.recipient_failures
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> NotifierSnapshot {
        NotifierSnapshot {
            queue_len: self.queue_len(),
            sent_count: self.sent_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
            delivered_count: self.delivered_count.load(Ordering::Relaxed),
            recipient_failures: self.recipient_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of notifier metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierSnapshot {
    pub queue_len: usize,
    pub sent_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub delivered_count: u64,
    pub recipient_failures: u64,
}
