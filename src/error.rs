//! Error types for Lathe
//!
//! Uses `thiserror` for library errors. Port-level errors (`FsError`,
//! `CacheError`, `StageError`, `FetchError`) convert into `LatheError` at the
//! application boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ports::{CacheError, FetchError, FsError};

/// Result type alias for Lathe operations
pub type LatheResult<T> = Result<T, LatheError>;

/// Main error type for Lathe operations
#[derive(Error, Debug)]
pub enum LatheError {
    /// Malformed front matter or data file
    #[error("invalid front matter in {file}: {message}")]
    InvalidFrontmatter { file: PathBuf, message: String },

    /// A transformer stage failed
    #[error("stage '{stage}' failed for {file}: {message}")]
    Stage {
        file: PathBuf,
        stage: String,
        message: String,
    },

    /// A layout, include or embed target could not be found
    #[error("cannot resolve '{target}' from {file}")]
    UnresolvedTarget { file: PathBuf, target: String },

    /// Layout composition looped back onto a file already being rendered
    #[error("layout cycle detected: {}", format_chain(.chain))]
    LayoutCycle { chain: Vec<PathBuf> },

    /// A namespace batch handler rejected its batch
    #[error("namespace '{namespace}' failed: {message}")]
    Namespace { namespace: String, message: String },

    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Configuration file could not be parsed
    #[error("invalid configuration in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// Invalid regex or glob pattern
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Post-build command failure
    #[error("command '{command}' failed: {message}")]
    Command { command: String, message: String },

    /// File system port failure
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Cache persistence failure
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Remote fetch failure
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LatheError {
    /// Source file this error is attributed to, when there is one
    pub fn file(&self) -> Option<&std::path::Path> {
        match self {
            LatheError::InvalidFrontmatter { file, .. }
            | LatheError::Stage { file, .. }
            | LatheError::UnresolvedTarget { file, .. } => Some(file),
            LatheError::LayoutCycle { chain } => chain.first().map(|p| p.as_path()),
            _ => None,
        }
    }

    /// Whether this error must abort the process before any compilation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LatheError::DirectoryNotFound { .. }
                | LatheError::InvalidConfig { .. }
                | LatheError::Pattern { .. }
        )
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
