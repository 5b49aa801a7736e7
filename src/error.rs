//! # Error Types
//!
//! Custom error types for Steno Stick using `thiserror`.

use thiserror::Error;

/// Main error type for Steno Stick
#[derive(Debug, Error)]
pub enum StenoStickError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// No usable controller was found
    #[error("No gamepad found (searched: {0})")]
    DeviceNotFound(String),

    /// Controller access errors
    #[error("Device error: {0}")]
    Device(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Steno Stick
pub type Result<T> = std::result::Result<T, StenoStickError>;
