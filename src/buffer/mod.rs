//! Reorder write buffer with a bounded out-of-order window
//!
//! The buffer keeps a trailing window of datapoints during which it is ok
//! for data to arrive out of order. Points that have aged past the window
//! are flushed to a caller-supplied sink in strictly ascending timestamp
//! order, and the flush frontier then rejects anything older.
//!
//! # Architecture
//!
//! This module is split into submodules for maintainability:
//!
//! - `arena` - entry node storage with free-list recycling
//!
//! The buffer itself is not thread safe. It is designed to live inside a
//! per-series object that serialises all access behind its own lock, so
//! none of the operations here take locks or suspend.
//!
//! # Example
//!
//! ```rust
//! use reorder_buffer::WriteBuffer;
//!
//! let mut buffer = WriteBuffer::new(3, 2, |_ts: u32, _value: f64| {});
//!
//! // out-of-order arrival inside the window is fine
//! buffer.add(1, 100.0);
//! buffer.add(2, 200.0);
//! buffer.add(4, 400.0);
//! buffer.add(3, 300.0);
//!
//! let points = buffer.snapshot();
//! assert_eq!(points.iter().map(|p| p.ts).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
//! ```

mod arena;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::BufferConfig;
use crate::error::ConfigError;
use crate::metrics::BufferMetrics;
use crate::types::Point;

use arena::{Entry, EntryArena};

/// Consumer of flushed points
///
/// The buffer invokes the sink synchronously, once per flushed point, in
/// strictly ascending timestamp order with no duplicates. Each flush starts
/// strictly after the newest timestamp of any previous flush. The sink must
/// not fail: once a point has been emitted its node is back in the pool and
/// cannot be resurrected, so sinks that can fail must queue and retry on
/// their own side.
///
/// Any `FnMut(u32, f64) + Send` closure is a sink. Implement the trait
/// directly when the consumer carries state of its own:
///
/// ```rust
/// use reorder_buffer::PointSink;
///
/// struct CountingSink(u64);
///
/// impl PointSink for CountingSink {
///     fn push(&mut self, _ts: u32, _value: f64) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait PointSink: Send {
    /// Receive one flushed point
    fn push(&mut self, ts: u32, value: f64);
}

impl<F> PointSink for F
where
    F: FnMut(u32, f64) + Send,
{
    fn push(&mut self, ts: u32, value: f64) {
        self(ts, value)
    }
}

/// Reorder write buffer for a single series
///
/// Accepts `(timestamp, value)` datapoints that may arrive out of order
/// within a bounded window of the most recent `reorder_window` points.
/// Insertion is tail-anchored: in-order arrival costs a single comparison
/// and an append, and a point that is `k` positions late costs `O(k)`.
///
/// Flushing emits every point older than the cut (the entry
/// `reorder_window` steps back from the tail) and then refuses to admit
/// anything older than the oldest point that remained. Equal timestamps
/// inside the window overwrite in place rather than duplicating.
///
/// # Example
///
/// ```rust
/// use std::sync::mpsc;
/// use reorder_buffer::WriteBuffer;
///
/// let (tx, rx) = mpsc::channel();
/// let mut buffer = WriteBuffer::new(3, 2, move |ts: u32, value: f64| {
///     tx.send((ts, value)).unwrap();
/// });
///
/// for ts in 1..=5u32 {
///     buffer.add(ts, f64::from(ts) * 100.0);
/// }
///
/// // five points buffered, window 3 + hysteresis 2 reached: two age out
/// assert_eq!(buffer.flush_if_ready(), 2);
/// assert_eq!(rx.try_recv().unwrap(), (1, 100.0));
/// assert_eq!(rx.try_recv().unwrap(), (2, 200.0));
///
/// // the frontier now rejects anything older than the oldest kept point
/// assert!(!buffer.add(2, 250.0));
/// ```
pub struct WriteBuffer {
    /// Window size in datapoints during which out of order is allowed
    reorder_window: u32,
    /// Extra datapoints beyond the window required to trigger a flush
    flush_min: u32,
    /// Current count of buffered entries
    len: u32,
    /// Oldest admissible timestamp (0 until the first flush)
    last_flush: u32,
    /// Head of the ordered list (smallest ts)
    first: Option<u32>,
    /// Tail of the ordered list (largest ts)
    last: Option<u32>,
    /// Node storage and recycling
    entries: EntryArena,
    /// Flushed-point consumer
    sink: Box<dyn PointSink>,
    /// Optional process-wide counters
    metrics: Option<Arc<BufferMetrics>>,

    // Per-buffer counters. Plain integers: the enclosing series object
    // serialises all access.
    total_added: u64,
    overwrites: u64,
    out_of_order: u64,
    rejected: u64,
    flushes: u64,
    points_flushed: u64,
}

impl WriteBuffer {
    /// Create an empty buffer
    ///
    /// # Arguments
    ///
    /// * `reorder_window` - trailing count of most-recent points kept
    ///   un-flushed to absorb late arrivals
    /// * `flush_min` - additional points beyond the window required before
    ///   a flush fires
    /// * `sink` - consumer invoked once per flushed point
    pub fn new<S>(reorder_window: u32, flush_min: u32, sink: S) -> Self
    where
        S: PointSink + 'static,
    {
        Self {
            reorder_window,
            flush_min,
            len: 0,
            last_flush: 0,
            first: None,
            last: None,
            entries: EntryArena::new(),
            sink: Box::new(sink),
            metrics: None,
            total_added: 0,
            overwrites: 0,
            out_of_order: 0,
            rejected: 0,
            flushes: 0,
            points_flushed: 0,
        }
    }

    /// Create a buffer from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a configured value is out of range.
    pub fn with_config<S>(config: &BufferConfig, sink: S) -> Result<Self, ConfigError>
    where
        S: PointSink + 'static,
    {
        config.validate()?;
        Ok(Self::new(config.reorder_window, config.flush_min, sink))
    }

    /// Attach a shared metrics collector
    ///
    /// The buffer works without one; per-buffer counts are always available
    /// through [`stats`](Self::stats).
    pub fn with_metrics(mut self, metrics: Arc<BufferMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Add a datapoint
    ///
    /// Returns `true` when the point was accepted, including the case where
    /// it overwrote an existing entry at the same timestamp. Returns `false`
    /// when the point is older than the flush frontier; rejected points
    /// change no state.
    #[inline]
    pub fn add(&mut self, ts: u32, value: f64) -> bool {
        // out of order and too old
        if ts < self.last_flush {
            self.rejected += 1;
            if let Some(metrics) = &self.metrics {
                metrics.record_rejected();
            }
            trace!(
                ts,
                last_flush = self.last_flush,
                "point older than flush frontier, rejected"
            );
            return false;
        }

        self.total_added += 1;
        if let Some(metrics) = &self.metrics {
            metrics.record_added();
        }

        let Some(tail) = self.last else {
            // initializing the linked list
            let idx = self.entries.acquire(ts, value);
            self.first = Some(idx);
            self.last = Some(idx);
            self.len = 1;
            return true;
        };

        // fast path: data normally arrives in order, so the new point is
        // newer than everything buffered and a single comparison settles it
        if ts > self.entries.get(tail).ts {
            let idx = self.entries.acquire(ts, value);
            self.entries.get_mut(idx).prev = Some(tail);
            self.entries.get_mut(tail).next = Some(idx);
            self.last = Some(idx);
            self.len += 1;
            return true;
        }

        // everything below here is a reorder
        self.out_of_order += 1;
        if let Some(metrics) = &self.metrics {
            metrics.record_out_of_order();
        }

        // walk backward from the tail; the equal-ts check must happen at
        // every step or a duplicate slips in ahead of the splice
        let mut cursor = Some(tail);
        while let Some(idx) = cursor {
            let entry_ts = self.entries.get(idx).ts;
            if entry_ts == ts {
                // overwrite value
                self.entries.get_mut(idx).val = value;
                self.overwrites += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.record_overwrite();
                }
                return true;
            }
            if entry_ts < ts {
                self.splice_after(idx, ts, value);
                return true;
            }
            cursor = self.entries.get(idx).prev;
        }

        // ran off the head: the added entry is the oldest one present
        let idx = self.entries.acquire(ts, value);
        if let Some(head) = self.first {
            self.entries.get_mut(idx).next = Some(head);
            self.entries.get_mut(head).prev = Some(idx);
        }
        self.first = Some(idx);
        self.len += 1;
        true
    }

    /// Add many datapoints, returning how many were accepted
    pub fn add_batch<I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        points
            .into_iter()
            .filter(|&(ts, value)| self.add(ts, value))
            .count()
    }

    /// Link a fresh entry directly after `after`
    fn splice_after(&mut self, after: u32, ts: u32, value: f64) {
        let idx = self.entries.acquire(ts, value);
        let next = self.entries.get(after).next;
        self.entries.get_mut(idx).prev = Some(after);
        self.entries.get_mut(idx).next = next;
        self.entries.get_mut(after).next = Some(idx);
        match next {
            Some(n) => self.entries.get_mut(n).prev = Some(idx),
            None => self.last = Some(idx),
        }
        self.len += 1;
    }

    /// Whether a flush would emit anything right now
    ///
    /// True when the buffer holds at least `flush_min + reorder_window`
    /// entries and at least one point has aged past the window.
    pub fn is_ready(&self) -> bool {
        let needed = u64::from(self.flush_min) + u64::from(self.reorder_window);
        u64::from(self.len) >= needed && self.len > self.reorder_window
    }

    /// Flush every point that has aged past the reorder window
    ///
    /// No-op unless [`is_ready`](Self::is_ready) holds. When it does, the
    /// points older than the cut are emitted to the sink in ascending
    /// timestamp order, their nodes are recycled, and the flush frontier
    /// advances to the oldest remaining timestamp. Exactly
    /// `reorder_window` entries remain afterwards.
    ///
    /// Returns the number of points emitted (0 when not ready).
    pub fn flush_if_ready(&mut self) -> usize {
        if !self.is_ready() {
            return 0;
        }

        // seek the entry up to which we'll want to flush: the cut sits
        // reorder_window steps back from the tail
        let Some(mut cut) = self.last else {
            return 0;
        };
        for _ in 0..self.reorder_window {
            match self.entries.get(cut).prev {
                Some(prev) => cut = prev,
                // fewer entries than the window; nothing has aged out
                None => return 0,
            }
        }

        // emit and recycle everything up to and including the cut
        let mut emitted: u32 = 0;
        let mut newest_flushed: u32 = 0;
        let mut remaining: Option<u32> = None;
        let mut cursor = self.first;
        while let Some(idx) = cursor {
            let Entry { ts, val, next, .. } = *self.entries.get(idx);
            self.sink.push(ts, val);
            self.entries.release(idx);
            emitted += 1;
            newest_flushed = ts;
            if idx == cut {
                remaining = next;
                break;
            }
            cursor = next;
        }

        match remaining {
            Some(head) => {
                self.entries.get_mut(head).prev = None;
                self.first = Some(head);
                self.len = self.reorder_window;
                self.last_flush = self.entries.get(head).ts;
            }
            None => {
                // a zero-length window drains the buffer completely; move
                // the frontier past the final emitted point so it cannot be
                // re-admitted and emitted a second time
                self.first = None;
                self.last = None;
                self.len = 0;
                self.last_flush = newest_flushed.saturating_add(1);
            }
        }

        self.flushes += 1;
        self.points_flushed += u64::from(emitted);
        if let Some(metrics) = &self.metrics {
            metrics.record_flush(u64::from(emitted));
        }
        debug!(
            emitted,
            len = self.len,
            last_flush = self.last_flush,
            "flushed aged points"
        );

        emitted as usize
    }

    /// Ascending copy of the current buffered contents
    ///
    /// For the read path that merges not-yet-flushed points with on-disk
    /// chunks. Does not mutate the buffer.
    pub fn snapshot(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.len as usize);
        let mut cursor = self.first;
        while let Some(idx) = cursor {
            let entry = self.entries.get(idx);
            points.push(Point::new(entry.ts, entry.val));
            cursor = entry.next;
        }
        points
    }

    /// Number of buffered entries
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the buffer holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Oldest admissible timestamp (0 until the first flush)
    pub fn last_flush(&self) -> u32 {
        self.last_flush
    }

    /// Configured reorder window, in datapoints
    pub fn reorder_window(&self) -> u32 {
        self.reorder_window
    }

    /// Configured flush hysteresis, in datapoints
    pub fn flush_min(&self) -> u32 {
        self.flush_min
    }

    /// Get buffer statistics
    pub fn stats(&self) -> WriteBufferStats {
        WriteBufferStats {
            len: self.len as usize,
            last_flush: self.last_flush,
            total_added: self.total_added,
            overwrites: self.overwrites,
            out_of_order: self.out_of_order,
            rejected: self.rejected,
            flushes: self.flushes,
            points_flushed: self.points_flushed,
            entries_allocated: self.entries.allocated(),
            entries_recycled: self.entries.recycled(),
        }
    }
}

impl fmt::Debug for WriteBuffer {
    // debug only: walks the whole chain, never call this on the hot path
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteBuffer")
            .field("reorder_window", &self.reorder_window)
            .field("flush_min", &self.flush_min)
            .field("len", &self.len)
            .field("last_flush", &self.last_flush)
            .field("points", &self.snapshot())
            .finish()
    }
}

/// Statistics for a write buffer
///
/// Snapshot of per-buffer counters for monitoring and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBufferStats {
    /// Current number of buffered entries
    pub len: usize,
    /// Oldest admissible timestamp
    pub last_flush: u32,
    /// Total points accepted (including overwrites)
    pub total_added: u64,
    /// Points that overwrote an existing timestamp
    pub overwrites: u64,
    /// Accepted points that missed the newer-than-tail fast path
    pub out_of_order: u64,
    /// Points rejected as older than the flush frontier
    pub rejected: u64,
    /// Flush operations performed
    pub flushes: u64,
    /// Total points emitted to the sink
    pub points_flushed: u64,
    /// Entry slots created fresh
    pub entries_allocated: u64,
    /// Entry acquires served from the free list
    pub entries_recycled: u64,
}
