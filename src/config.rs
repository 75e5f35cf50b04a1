//! Buffer configuration and validation
//!
//! Defines the two knobs that control reordering and flush behaviour, with
//! serde support so the enclosing engine can load them from its config file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum reorder window, in datapoints
pub const MAX_REORDER_WINDOW: u32 = 1_000_000;

/// Maximum flush hysteresis, in datapoints
pub const MAX_FLUSH_MIN: u32 = 1_000_000;

/// Configuration for a reorder write buffer
///
/// Both settings are counted in datapoints, not seconds: the reorder window
/// is a trailing suffix of the most recent points that stays buffered to
/// absorb late arrivals, and `flush_min` is the extra depth required on top
/// of it before a flush fires at all.
///
/// # Example
///
/// ```rust
/// use reorder_buffer::BufferConfig;
///
/// let config = BufferConfig {
///     reorder_window: 60,
///     flush_min: 10,
/// };
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Trailing count of most-recent datapoints kept un-flushed to absorb
    /// out-of-order arrivals
    #[serde(default = "default_reorder_window")]
    pub reorder_window: u32,

    /// Additional datapoints beyond the reorder window required before a
    /// flush is performed (prevents flush thrashing)
    #[serde(default = "default_flush_min")]
    pub flush_min: u32,
}

fn default_reorder_window() -> u32 {
    600
}

fn default_flush_min() -> u32 {
    30
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            reorder_window: default_reorder_window(),
            flush_min: default_flush_min(),
        }
    }
}

impl BufferConfig {
    /// Validate the configuration
    ///
    /// Zero is a legal value for both fields: a zero reorder window means
    /// flushes drain the buffer completely, and a zero `flush_min` lets a
    /// flush fire as soon as anything has aged past the window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reorder_window > MAX_REORDER_WINDOW {
            return Err(ConfigError::OutOfRange {
                field: "reorder_window",
                value: self.reorder_window,
                max: MAX_REORDER_WINDOW,
            });
        }
        if self.flush_min > MAX_FLUSH_MIN {
            return Err(ConfigError::OutOfRange {
                field: "flush_min",
                value: self.flush_min,
                max: MAX_FLUSH_MIN,
            });
        }
        Ok(())
    }
}
