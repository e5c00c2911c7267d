//! Error types for Jetson Clocks

use std::io;
use thiserror::Error;

/// Result type alias for Jetson Clocks operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by board discovery and control operations
#[derive(Error, Debug)]
pub enum Error {
    /// Caller does not hold root privileges
    #[error("Permission denied: {0} requires root privileges")]
    PrivilegeDenied(String),

    /// SoC family is unknown or has no mapping for the requested control
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Control file is missing or not writable
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Requested frequency or governor is not advertised by the board
    #[error("{requested} is not an available {control} (available: {})", available.join(", "))]
    ValueNotAvailable {
        /// Control being set
        control: String,
        /// Value the caller asked for
        requested: String,
        /// Values the board advertises
        available: Vec<String>,
    },

    /// Requested range has its floor above its ceiling
    #[error("Invalid {control} range: minimum {min} is above maximum {max}")]
    InvalidRange {
        /// Control being set
        control: String,
        /// Requested floor
        min: i64,
        /// Requested ceiling
        max: i64,
    },

    /// Control file content is not in the expected format
    #[error("Parse error: {0}")]
    ParseFailure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Reject `min > max` for `control`
    pub(crate) fn check_range(control: &str, min: i64, max: i64) -> Result<()> {
        if min > max {
            return Err(Error::InvalidRange {
                control: control.to_string(),
                min,
                max,
            });
        }
        Ok(())
    }

    pub(crate) fn not_available<R, A, I>(control: &str, requested: R, available: I) -> Self
    where
        R: ToString,
        A: ToString,
        I: IntoIterator<Item = A>,
    {
        Error::ValueNotAvailable {
            control: control.to_string(),
            requested: requested.to_string(),
            available: available.into_iter().map(|v| v.to_string()).collect(),
        }
    }
}
