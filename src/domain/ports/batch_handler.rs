//! BatchHandler port - namespace processors working on groups of files

use std::path::PathBuf;

use crate::domain::value_objects::Content;

/// Namespace handler failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError(pub String);

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BatchError {}

/// What a namespace output is made of
#[derive(Debug, Clone, PartialEq)]
pub enum NamespaceBody {
    /// Content produced by the handler
    Content(Content),
    /// Copy an existing file verbatim
    CopyFrom(PathBuf),
}

/// One output produced by a batch handler
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceOutput {
    pub destination: PathBuf,
    pub body: NamespaceBody,
}

impl NamespaceOutput {
    pub fn content(destination: impl Into<PathBuf>, content: impl Into<Content>) -> Self {
        Self {
            destination: destination.into(),
            body: NamespaceBody::Content(content.into()),
        }
    }

    pub fn copy(destination: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            body: NamespaceBody::CopyFrom(source.into()),
        }
    }
}

/// Processes every dirty member of a namespace group in one call
pub trait BatchHandler: Send + Sync {
    fn handle(&self, paths: &[PathBuf]) -> Result<Vec<NamespaceOutput>, BatchError>;
}
