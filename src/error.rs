//! Error types for rar-renamer
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Scan, Rename)
//! - Context information (session ID, file path, operation)
//!
//! Per-archive classification failures (password protected, corrupted,
//! timed out, no root folder) are **not** errors — they are represented as
//! [`ScanStatus`](crate::types::ScanStatus) values and never escalate past
//! the inspector boundary. Only configuration, persistence, and
//! session-level problems surface through these types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rar-renamer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rar-renamer
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "queue_path")
        key: Option<String>,
    },

    /// Scan-session error
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// Rename or undo error
    #[error("rename error: {0}")]
    Rename(#[from] RenameError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session not found
    #[error("session not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Scan-session errors
///
/// These are session-level failures, as opposed to per-archive outcomes
/// which are carried in each [`ScanResult`](crate::types::ScanResult).
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan target is not a readable directory
    #[error("scan directory not readable: {path}: {reason}")]
    DirectoryUnreadable {
        /// The directory that could not be read
        path: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },

    /// A scan session is in the wrong state for the requested operation
    #[error("cannot {operation} session {id} in state {current_state}")]
    InvalidState {
        /// The session ID that is in an invalid state for the operation
        id: i64,
        /// The operation that was attempted (e.g., "pause", "resume")
        operation: String,
        /// The current state that prevents the operation
        current_state: String,
    },

    /// A worker task died unexpectedly (panic or runtime shutdown)
    #[error("scan worker failed: {0}")]
    WorkerFailed(String),

    /// Drive-type classification failed (permissions, unsupported platform)
    #[error("drive detection failed: {0}")]
    DriveDetection(String),
}

/// Rename and undo errors
///
/// Per-item rename failures (missing source, occupied destination) are data
/// — recorded in [`LogEntry`](crate::types::LogEntry) — and never abort a
/// batch. These variants cover the problems that do propagate to the caller.
#[derive(Debug, Error)]
pub enum RenameError {
    /// A rename target has no folder name to build the new name from
    #[error("no folder name for {path}; archive was not scanned as ready")]
    NotRenameable {
        /// The archive that cannot be renamed
        path: PathBuf,
    },

    /// The persisted queue or ledger file could not be written
    #[error("failed to persist {what} to {path}: {reason}")]
    PersistFailed {
        /// Which store failed ("queue" or "ledger")
        what: &'static str,
        /// The backing file path
        path: PathBuf,
        /// The underlying failure
        reason: String,
    },
}
