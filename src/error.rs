//! Error types for the buffer

use thiserror::Error;

/// Configuration validation errors
///
/// The buffer itself surfaces no errors on the write path: a too-old point
/// is reported as `false` from `add`, and everything else is either a no-op
/// or a programmer error. The only fallible surface is configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configured value exceeds its allowed maximum
    #[error("{field} value {value} exceeds maximum {max}")]
    OutOfRange {
        /// Field name being validated
        field: &'static str,
        /// The invalid value
        value: u32,
        /// Maximum allowed value
        max: u32,
    },
}

/// Result type alias for configuration validation
pub type Result<T> = std::result::Result<T, ConfigError>;
