//! Structured error types for the command bus
//!
//! Every failure the bus can hit while consuming the command file is one of
//! these variants. Most of them are confined to a single line of a drained
//! batch; only file and watch failures concern the bus as a whole.

use std::path::PathBuf;
use thiserror::Error;

use crate::host::HostError;

/// Primary error type for bus operations
#[derive(Error, Debug)]
pub enum BusError {
    // =========================================================================
    // Line-level Errors (never abort a batch)
    // =========================================================================
    /// The argument fragment after the command name is not a JSON object
    #[error("malformed arguments for {command}: {reason}")]
    MalformedArguments {
        command: String,
        line: String,
        reason: String,
    },

    /// The JSON object parsed but a known field has the wrong type
    #[error("invalid arguments for {command}: {reason}")]
    InvalidArguments { command: String, reason: String },

    /// A host capability call raised while a handler was running
    #[error("handler for {command} failed: {message}")]
    HandlerFailed { command: String, message: String },

    // =========================================================================
    // Bus-level Errors
    // =========================================================================
    /// The command file could not be read, truncated or created
    #[error("cannot {operation} command file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem notifications could not be registered
    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BusError {
    pub(crate) fn file_access(
        path: impl Into<PathBuf>,
        operation: &'static str,
        source: std::io::Error,
    ) -> Self {
        Self::FileAccess {
            path: path.into(),
            operation,
            source,
        }
    }

    pub(crate) fn handler(command: impl Into<String>, err: HostError) -> Self {
        Self::HandlerFailed {
            command: command.into(),
            message: err.message,
        }
    }

    /// Check if the error concerns one line only, so the rest of the batch
    /// keeps going.
    pub fn is_line_local(&self) -> bool {
        match self {
            Self::MalformedArguments { .. }
            | Self::InvalidArguments { .. }
            | Self::HandlerFailed { .. } => true,

            Self::FileAccess { .. } | Self::Watch(_) | Self::Config(_) | Self::Json(_) => false,
        }
    }

    /// Name of the command the error is attached to, if any
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::MalformedArguments { command, .. }
            | Self::InvalidArguments { command, .. }
            | Self::HandlerFailed { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Get an operator-facing message, used when a drain was requested by hand
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedArguments { line, .. } => {
                format!("Skipped a line whose arguments are not a JSON object: {}", line)
            }
            Self::FileAccess { path, operation, .. } => format!(
                "Could not {} the command file at {}. Check that the path exists and is writable.",
                operation,
                path.display()
            ),
            Self::Watch(_) => {
                "File change notifications are unavailable; run a manual drain instead.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
