//! Error types for the head gesture library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Normalization of a zero-length vector
    #[error("Degenerate vector: cannot normalize a zero-length vector")]
    DegenerateVector,

    /// Normalization of a zero-norm quaternion
    #[error("Degenerate quaternion: cannot normalize a zero-norm quaternion")]
    DegenerateQuaternion,

    /// Incoming orientation sample contains NaN or infinite components
    #[error("Non-finite orientation sample")]
    NonFiniteSample,

    /// `start()` was called while a capture is already running
    #[error("Calibration already in progress")]
    CalibrationAlreadyInProgress,

    /// `finish()` was called without a running capture
    #[error("No calibration in progress")]
    CalibrationNotInProgress,

    /// A capture finished without recording a single sample
    #[error("Calibration captured no samples")]
    EmptyCalibration,

    /// Action executor reported a failure
    #[error("Action failed: {0}")]
    ActionFailed(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The tracking session is no longer accepting events
    #[error("Tracking session closed")]
    SessionClosed,
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
