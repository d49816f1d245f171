//! # Error Types
//!
//! This module defines error types used throughout the bridge.
//!
//! Per-job errors (`Write`, `PrintCommand`, `InvalidPrinter`) are converted
//! into a `failed` status report by the dispatcher and never stop a batch.
//! `Fetch` aborts only the current poll cycle. `StatusReport` is logged and
//! dropped.

use thiserror::Error;

/// Main error type for bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The OS printer enumeration command could not run or exited non-zero
    #[error("Printer enumeration failed: {0}")]
    Enumeration(String),

    /// The silent-print command failed to launch or exited non-zero
    #[error("Print command failed (exit code {}): {stderr}", exit_code(.code))]
    PrintCommand {
        /// Exit code, `None` if the process never ran to completion
        code: Option<i32>,
        /// Captured standard error, or a description of the launch failure
        stderr: String,
        /// Whether trying again could plausibly succeed
        retryable: bool,
    },

    /// Printer name rejected before any process was spawned
    #[error("Invalid printer name: {0}")]
    InvalidPrinter(String),

    /// Payload decode or temp file write failure
    #[error("write error: {0}")]
    Write(String),

    /// Backend unreachable or returned a non-2xx response to the pending-jobs fetch
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Backend rejected or never received a status update
    #[error("Status report error: {0}")]
    StatusReport(String),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Cash drawer or VFD communication failure
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// HTTP listener failure
    #[error("Server error: {0}")]
    Server(String),

    /// A hardware feature was requested but is not configured
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether a later attempt at the same operation could succeed.
    ///
    /// A missing silent-print utility or a rejected printer name is a
    /// configuration problem and never clears up on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::PrintCommand { retryable, .. } => *retryable,
            BridgeError::InvalidPrinter(_) | BridgeError::Config(_) => false,
            BridgeError::NotConfigured(_) => false,
            _ => true,
        }
    }
}

fn exit_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;
