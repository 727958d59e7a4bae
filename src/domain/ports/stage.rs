//! Stage port - a content transformer bound to one or more filename suffixes
//!
//! A stage receives a mutable [`StageContext`] and returns exactly one
//! `Result`: the single-completion contract is carried by the return type.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};

/// Stage failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    message: String,
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StageError {}

/// Mutable compilation context threaded through a suffix chain.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Absolute path of the file being compiled
    pub file: PathBuf,
    /// Current text
    pub text: String,
    /// Front-matter data
    pub data: Value,
    /// Merged locals (config globals, front matter, layout yield)
    pub locals: Map<String, Value>,
    /// Files this output depends on, accumulated by stages
    pub deps: Vec<PathBuf>,
    /// Working output label
    pub label: String,
    /// Token that will run after this stage, if any
    pub next: Option<String>,
    /// The content is literate source for `next`
    pub literate: bool,
    /// Free-form options for stages
    pub options: Map<String, Value>,
    /// Time spent installing missing external tooling
    pub install_time: Duration,
}

impl StageContext {
    pub fn new(file: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            text: text.into(),
            data: Value::Object(Map::new()),
            locals: Map::new(),
            deps: Vec::new(),
            label: String::new(),
            next: None,
            literate: false,
            options: Map::new(),
            install_time: Duration::ZERO,
        }
    }

    /// Record a dependency, keeping the list free of duplicates
    pub fn add_dep(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if path != self.file && !self.deps.iter().any(|p| p == path) {
            self.deps.push(path.to_path_buf());
        }
    }

    /// Look a dotted key up in locals first, then front-matter data
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let head = parts.next()?;
        let root = self
            .locals
            .get(head)
            .or_else(|| self.data.as_object().and_then(|d| d.get(head)))?;
        parts.try_fold(root, |value, part| match value {
            Value::Object(map) => map.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

/// A content transformer
pub trait Stage: Send + Sync {
    /// Stage name used in diagnostics
    fn name(&self) -> &str;

    /// Transform the context in place
    fn run(&self, ctx: &mut StageContext) -> Result<(), StageError>;

    /// Whether the stage extracts code for a literate next token
    fn reads_literate(&self) -> bool {
        false
    }
}
