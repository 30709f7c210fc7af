//! Error types for the gaze dwell library.
//!
//! Only configuration violations and malformed host input are reported as
//! errors. Missing signal, singular fits, vanished targets and capture
//! timeouts are handled where they occur and never reach the frame loop.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter construction error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Calibration request could not be honoured
    #[error("Calibration error: {0}")]
    CalibrationError(String),

    /// Configuration value out of range
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
