//! Error types for the ESXi RAID exporter

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while collecting and publishing hardware telemetry
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structured source response could not be decoded
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Prometheus registry error
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    // =========================================================================
    // Command Execution Errors
    // =========================================================================
    /// Command could not be launched or exited unsuccessfully
    #[error("Command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// Command exceeded its wall-clock budget and was killed
    #[error("Command '{command}' timed out after {timeout_secs} seconds: {stderr}")]
    CommandTimeout {
        command: String,
        timeout_secs: u64,
        stderr: String,
    },

    // =========================================================================
    // Decode Errors
    // =========================================================================
    /// Composite identifier (enclosure:slot, DG/VD) is malformed
    #[error("Malformed {kind} identifier: '{value}'")]
    InvalidCompositeId { kind: &'static str, value: String },

    /// Label values do not match a metric's label schema
    #[error("Metric {metric} expects {expected} labels, got {got}")]
    LabelCardinality {
        metric: &'static str,
        expected: usize,
        got: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error came from a command hitting its timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::CommandTimeout { .. })
    }
}
