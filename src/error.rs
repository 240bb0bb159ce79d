//! Error types for the mootrack library.

use thiserror::Error;

/// Result type for mootrack operations.
pub type Result<T> = std::result::Result<T, MooTrackError>;

/// Error types that can occur while ingesting, reviewing or exporting detections.
#[derive(Error, Debug)]
pub enum MooTrackError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid confidence threshold.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// A detection index that does not exist in the current result.
    #[error("Detection index {index} out of range (result has {len} detections)")]
    DetectionIndexOutOfRange { index: usize, len: usize },

    /// A manual detection position that does not exist.
    #[error("Manual detection {index} out of range ({len} manual detections)")]
    ManualIndexOutOfRange { index: usize, len: usize },

    /// Invalid session configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// An operation that needs an analysed image was called without one.
    #[error("No active result: {0}")]
    NoActiveResult(String),

    /// Unknown detection method name.
    #[error("Invalid detection method: {0}")]
    InvalidMethod(String),
}
