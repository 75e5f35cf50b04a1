//! Reorder write buffer for time-series ingestion
//!
//! This library provides the write-side buffering stage of a time-series
//! storage engine:
//!
//! - Bounded out-of-order tolerance: late points are accepted as long as
//!   they land inside the trailing reorder window
//! - Strictly ascending emission: flushed points reach the downstream sink
//!   in timestamp order with no duplicates, contiguous across flushes
//! - A monotone flush frontier that rejects data too old to reorder
//! - Near-zero allocation on the hot path via entry recycling
//!
//! The buffer is deliberately not thread safe: it is meant to be owned by a
//! per-series object that already serialises access behind its own lock.
//!
//! # Example
//!
//! ```rust
//! use reorder_buffer::{BufferConfig, WriteBuffer};
//!
//! let config = BufferConfig {
//!     reorder_window: 3,
//!     flush_min: 2,
//! };
//! let mut buffer = WriteBuffer::with_config(&config, |ts: u32, value: f64| {
//!     println!("flushed {ts} = {value}");
//! })
//! .unwrap();
//!
//! buffer.add(1, 100.0);
//! buffer.add(3, 300.0);
//! buffer.add(2, 200.0); // late, inside the window
//!
//! let points = buffer.snapshot();
//! assert_eq!(points.iter().map(|p| p.ts).collect::<Vec<_>>(), vec![1, 2, 3]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// Re-export main types
pub use buffer::{PointSink, WriteBuffer, WriteBufferStats};
pub use config::{BufferConfig, MAX_FLUSH_MIN, MAX_REORDER_WINDOW};
pub use error::ConfigError;
pub use metrics::{BufferMetrics, BufferMetricsSnapshot};
pub use types::Point;
