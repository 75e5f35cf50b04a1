//! Core data types for the write buffer
//!
//! # Key Types
//!
//! - **`Point`**: a single datapoint (timestamp + value) as returned by
//!   snapshots and consumed by downstream chunk builders
//!
//! # Example
//!
//! ```rust
//! use reorder_buffer::Point;
//!
//! let point = Point::new(1_700_000_000, 42.5);
//! assert_eq!(point.ts, 1_700_000_000);
//! ```

use serde::{Deserialize, Serialize};

/// A single datapoint in a time-series
///
/// The fundamental unit the buffer works with: a wall-clock timestamp in
/// seconds and an IEEE-754 double value.
///
/// # Value semantics
///
/// The value field supports the full double range including NaN, Infinity
/// and subnormals. The buffer carries non-finite values through verbatim;
/// NaN is a real measurement here, not a missing-data marker.
///
/// # Example
///
/// ```rust
/// use reorder_buffer::Point;
///
/// let point = Point::new(1_700_000_000, 45.2);
/// assert_eq!(point.value, 45.2);
///
/// let gap = Point::new(1_700_000_001, f64::NAN);
/// assert!(gap.value.is_nan());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Unix timestamp in seconds since epoch (1970-01-01 00:00:00 UTC)
    pub ts: u32,

    /// Floating-point measurement value
    pub value: f64,
}

impl Point {
    /// Create a new datapoint
    ///
    /// # Arguments
    ///
    /// * `ts` - Unix timestamp in seconds
    /// * `value` - Measurement value
    pub fn new(ts: u32, value: f64) -> Self {
        Self { ts, value }
    }
}
