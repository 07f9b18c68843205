//! Error types for Lekcjonarz.
//!
//! Library crates use [`LekcjonarzError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Which part of the expected page structure was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StructureFault {
    /// No `div.cf.txt` article container.
    #[error("article container not found")]
    MissingArticle,
    /// The article has no (non-empty) `h1` heading.
    #[error("page heading not found")]
    MissingTitle,
    /// Neither the rich-area nor the plain content container is present.
    #[error("content container not found")]
    MissingContainer,
}

/// Top-level error type for all Lekcjonarz operations.
#[derive(Debug, thiserror::Error)]
pub enum LekcjonarzError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Timeout, connection failure or non-2xx status.
    #[error("network error: {0}")]
    Network(String),

    /// Expected container/heading absent (site layout drift).
    #[error("structure error: {0}")]
    Structure(StructureFault),

    /// Structure found but no reading blocks could be extracted.
    #[error("no readings extracted")]
    ParseEmpty,

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed job store, invalid URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LekcjonarzError>;

impl LekcjonarzError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Errors that abandon a single job and land in the failure manifest.
    /// Everything else aborts the run.
    pub fn is_job_scoped(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Structure(_) | Self::ParseEmpty
        )
    }
}
