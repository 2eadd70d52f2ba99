//! Error types for timetrace-core operations.
//!
//! Classification and redaction never fail; everything that can fail lives
//! at the storage, config, or input-parsing edges.

use std::path::PathBuf;

/// Exit status used when the wrapped executable cannot be found.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// All errors that can occur in timetrace-core operations.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    // ─────────────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Storage error: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Storage path not writable: {path}: {source}")]
    StoragePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Data directory not found")]
    DataDirNotFound,

    // ─────────────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("A session is already active (id={id}). Stop it first.")]
    SessionAlreadyActive { id: i64 },

    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    // ─────────────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Command not found: {0:?}")]
    CommandNotFound(String),

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration write failed: {path}: {source}")]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TraceError {
    pub(crate) fn storage(context: impl Into<String>, source: rusqlite::Error) -> Self {
        TraceError::Storage {
            context: context.into(),
            source,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TraceError::Io {
            context: context.into(),
            source,
        }
    }

    /// True for failures of the backing database (as opposed to bad input).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            TraceError::Storage { .. } | TraceError::StoragePath { .. } | TraceError::DataDirNotFound
        )
    }

    /// Process exit status a CLI should use when this error aborts it.
    pub fn exit_code(&self) -> i32 {
        match self {
            TraceError::CommandNotFound(_) => EXIT_COMMAND_NOT_FOUND,
            TraceError::InvalidInput(_) | TraceError::SessionAlreadyActive { .. } => 2,
            _ => 1,
        }
    }
}

/// Convenience type alias for Results using TraceError.
pub type Result<T> = std::result::Result<T, TraceError>;
