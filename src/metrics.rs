//! Buffer metrics collection
//!
//! Thread-safe counters for monitoring write buffer behaviour across many
//! series. Uses atomic operations for lock-free updates, so a single
//! collector can be shared by every per-series buffer in the process.

use std::sync::atomic::{AtomicU64, Ordering};

/// Write buffer metrics collector
///
/// Each per-series buffer keeps its own plain counters for its `stats()`
/// snapshot; this collector aggregates the same events process-wide when
/// attached via [`WriteBuffer::with_metrics`](crate::WriteBuffer::with_metrics).
pub struct BufferMetrics {
    /// Total points accepted (including overwrites)
    points_added: AtomicU64,
    /// Total points rejected for being older than the flush frontier
    points_rejected: AtomicU64,
    /// Accepted points that missed the newer-than-tail fast path
    out_of_order: AtomicU64,
    /// Points that overwrote an existing timestamp
    overwrites: AtomicU64,
    /// Total flush operations that emitted at least one point
    flushes: AtomicU64,
    /// Total points emitted to sinks
    points_flushed: AtomicU64,
}

impl BufferMetrics {
    /// Create a new metrics collector with all counters at zero
    pub fn new() -> Self {
        Self {
            points_added: AtomicU64::new(0),
            points_rejected: AtomicU64::new(0),
            out_of_order: AtomicU64::new(0),
            overwrites: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            points_flushed: AtomicU64::new(0),
        }
    }

    // === Recording Methods ===

    /// Record an accepted point
    #[inline]
    pub fn record_added(&self) {
        // Saturating arithmetic so a long-lived process cannot wrap
        let _ = self
            .points_added
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_add(1))
            });
    }

    /// Record a point rejected as older than the flush frontier
    #[inline]
    pub fn record_rejected(&self) {
        self.points_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an accepted point that arrived out of order
    #[inline]
    pub fn record_out_of_order(&self) {
        self.out_of_order.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a timestamp overwrite
    #[inline]
    pub fn record_overwrite(&self) {
        self.overwrites.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a flush that emitted `point_count` points
    #[inline]
    pub fn record_flush(&self, point_count: u64) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .points_flushed
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_add(point_count))
            });
    }

    // === Query Methods ===

    /// Get total points accepted
    pub fn points_added(&self) -> u64 {
        self.points_added.load(Ordering::Relaxed)
    }

    /// Get total points rejected
    pub fn points_rejected(&self) -> u64 {
        self.points_rejected.load(Ordering::Relaxed)
    }

    /// Get total out-of-order accepts
    pub fn out_of_order(&self) -> u64 {
        self.out_of_order.load(Ordering::Relaxed)
    }

    /// Get total timestamp overwrites
    pub fn overwrites(&self) -> u64 {
        self.overwrites.load(Ordering::Relaxed)
    }

    /// Get total flush operations
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Get total points emitted to sinks
    pub fn points_flushed(&self) -> u64 {
        self.points_flushed.load(Ordering::Relaxed)
    }

    /// Take a consistent-enough snapshot of all counters
    ///
    /// Counters are read individually with relaxed ordering; under
    /// concurrent updates the snapshot may mix instants, which is fine for
    /// monitoring.
    pub fn snapshot(&self) -> BufferMetricsSnapshot {
        BufferMetricsSnapshot {
            points_added: self.points_added(),
            points_rejected: self.points_rejected(),
            out_of_order: self.out_of_order(),
            overwrites: self.overwrites(),
            flushes: self.flushes(),
            points_flushed: self.points_flushed(),
        }
    }
}

impl Default for BufferMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the buffer metrics counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferMetricsSnapshot {
    /// Total points accepted
    pub points_added: u64,
    /// Total points rejected
    pub points_rejected: u64,
    /// Accepted points that missed the fast path
    pub out_of_order: u64,
    /// Timestamp overwrites
    pub overwrites: u64,
    /// Flush operations
    pub flushes: u64,
    /// Points emitted to sinks
    pub points_flushed: u64,
}
