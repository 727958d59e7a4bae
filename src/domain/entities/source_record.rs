//! Source record entity - one in-memory unit per input file
//!
//! Pure data plus lifecycle transitions; reading and writing files is done by
//! the application layer's `Compiler`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};

use crate::domain::value_objects::{Content, SuffixChain};

/// Compile lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    Created,
    Parsing,
    Piped,
    Embedding,
    Written,
    Failed,
}

impl CompileState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CompileState::Written | CompileState::Failed)
    }
}

/// One input file and everything known about its last compile
#[derive(Debug, Clone)]
pub struct SourceRecord {
    path: PathBuf,
    chain: SuffixChain,
    label: String,
    raw: Content,
    /// `raw` was supplied by the caller rather than read from `path`
    literal: bool,
    content: Content,
    data: Value,
    locals: Map<String, Value>,
    deps: Vec<PathBuf>,
    destination: Option<PathBuf>,
    state: CompileState,
    dirty: bool,
    generation: u64,
    install_time: Duration,
    elapsed: Duration,
    failure: Option<String>,
}

impl SourceRecord {
    /// Record for a file discovered on disk; starts dirty
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let chain = SuffixChain::parse(&path);
        let label = chain.last().unwrap_or_default().to_string();
        Self {
            path,
            chain,
            label,
            raw: Content::default(),
            literal: false,
            content: Content::default(),
            data: Value::Object(Map::new()),
            locals: Map::new(),
            deps: Vec::new(),
            destination: None,
            state: CompileState::Created,
            dirty: true,
            generation: 0,
            install_time: Duration::ZERO,
            elapsed: Duration::ZERO,
            failure: None,
        }
    }

    /// Record for literal text attributed to `path`
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let mut record = Self::new(path);
        record.raw = Content::Text(text.into());
        record.literal = true;
        record
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn chain(&self) -> &SuffixChain {
        &self.chain
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn raw(&self) -> &Content {
        &self.raw
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn locals(&self) -> &Map<String, Value> {
        &self.locals
    }

    pub fn deps(&self) -> &[PathBuf] {
        &self.deps
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn state(&self) -> CompileState {
        self.state
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Wall time of the last compile minus external install latency
    pub fn work_time(&self) -> Duration {
        self.elapsed.saturating_sub(self.install_time)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Start a new compile; supersedes whatever the previous one left behind
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.state = CompileState::Parsing;
        self.failure = None;
        self.install_time = Duration::ZERO;
        self.elapsed = Duration::ZERO;
        self.generation
    }

    /// Raw bytes read and front matter parsed
    pub fn loaded(&mut self, raw: Content, data: Value, body: Content) {
        self.raw = raw;
        self.data = data;
        self.content = body;
    }

    pub fn set_locals(&mut self, locals: Map<String, Value>) {
        self.locals = locals;
    }

    /// Stage chain produced its result. The dependency list is replaced.
    pub fn piped(&mut self, content: Content, label: String, deps: Vec<PathBuf>, install_time: Duration) {
        self.content = content;
        self.label = label;
        self.deps = deps;
        self.install_time += install_time;
        self.state = CompileState::Piped;
    }

    pub fn begin_embedding(&mut self) {
        self.state = CompileState::Embedding;
    }

    /// Embedding pass finished; its dependencies are folded in
    pub fn embedded(&mut self, content: Content, deps: Vec<PathBuf>) {
        self.content = content;
        for dep in deps {
            if dep != self.path && !self.deps.contains(&dep) {
                self.deps.push(dep);
            }
        }
    }

    pub fn written(&mut self, destination: PathBuf, elapsed: Duration) {
        self.destination = Some(destination);
        self.elapsed = elapsed;
        self.state = CompileState::Written;
        self.dirty = false;
    }

    pub fn fail(&mut self, message: impl Into<String>, elapsed: Duration) {
        self.failure = Some(message.into());
        self.elapsed = elapsed;
        self.state = CompileState::Failed;
    }
}
