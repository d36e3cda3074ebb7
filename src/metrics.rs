use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for bulk queue operations.
///
/// Uses atomic counters with `Relaxed` ordering since these are purely
/// statistical - no control flow depends on exact values, and eventual
/// visibility is acceptable for observability. Counters are only touched on
/// the batch paths, never per element inside the claim loops.
#[derive(Debug, Default)]
pub struct Metrics {
    messages_drained: AtomicU64,
    drain_batches: AtomicU64,
    messages_filled: AtomicU64,
    fill_batches: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_drained(&self, messages: u64) {
        self.messages_drained.fetch_add(messages, Ordering::Relaxed);
        self.drain_batches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_filled(&self, messages: u64) {
        self.messages_filled.fetch_add(messages, Ordering::Relaxed);
        self.fill_batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_drained: self.messages_drained.load(Ordering::Relaxed),
            drain_batches: self.drain_batches.load(Ordering::Relaxed),
            messages_filled: self.messages_filled.load(Ordering::Relaxed),
            fill_batches: self.fill_batches.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of bulk-operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_drained: u64,
    pub drain_batches: u64,
    pub messages_filled: u64,
    pub fill_batches: u64,
}
