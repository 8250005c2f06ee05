//! Error types for telemetry processing.
//!
//! Malformed frames are not errors. The frame decoder reports them as
//! [`RejectReason`](crate::protocol::RejectReason) values and keeps going; the
//! types here cover the surrounding plumbing: notification sources, capture
//! files, configuration and payload slices of the wrong size.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use racebox::TelemetryError;
//!
//! let error = TelemetryError::connection_failed("notification channel stalled");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Device link failed: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Capture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Payload must be {expected} bytes, got {found}")]
    Payload { expected: usize, found: usize },

    #[error("Invalid configuration: {details}")]
    Config {
        details: String,
        #[source]
        source: Option<serde_yaml_ng::Error>,
    },

    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Connection { .. } => true,
            TelemetryError::Timeout { .. } => true,
            TelemetryError::File { .. } => false,
            TelemetryError::Parse { .. } => false,
            TelemetryError::Payload { .. } => false,
            TelemetryError::Config { .. } => false,
            TelemetryError::ChannelClosed => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::Connection { .. } => vec![
                "Check the device is powered and in range",
                "Reconnect to the device",
                "Verify notifications are enabled on the TX characteristic",
            ],
            TelemetryError::File { .. } => vec![
                "Check the capture file exists and is readable",
                "Check file permissions",
            ],
            TelemetryError::Parse { .. } => vec![
                "Check the capture file uses one hex notification per line",
                "Verify source data integrity",
            ],
            TelemetryError::Payload { .. } => vec![
                "Only pass payloads produced by the frame decoder",
                "Check fragment reassembly produced a full payload",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the YAML syntax",
                "Compare field names against the documented configuration keys",
            ],
            TelemetryError::ChannelClosed => vec![
                "Keep a NotificationSink alive for the lifetime of the link",
                "Create a new connection after a disconnect",
            ],
            TelemetryError::Timeout { .. } => vec![
                "Increase the first record timeout",
                "Check the device is streaming telemetry",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(details: impl Into<String>) -> Self {
        TelemetryError::Config { details: details.into(), source: None }
    }
}

impl From<serde_yaml_ng::Error> for TelemetryError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TelemetryError::Config { details: err.to_string(), source: Some(err) }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
