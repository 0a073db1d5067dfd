//! Error types for ResearchDesk.
//!
//! Library crates use [`ResearchDeskError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ResearchDesk operations.
#[derive(Debug, thiserror::Error)]
pub enum ResearchDeskError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a generative backend.
    #[error("network error: {0}")]
    Network(String),

    /// JSON or input document parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Run store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Generative backend error (API failure, malformed completion).
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad request, empty topic, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Bundle packaging error.
    #[error("export error: {0}")]
    Export(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ResearchDeskError>;

impl ResearchDeskError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
