//! Watch event types and options

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::Config;

/// Debounce duration in milliseconds
pub const DEBOUNCE_MS: u64 = 100;

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Project root (where `lathe.toml` lives)
    pub project_root: PathBuf,
    /// Config, paths already resolved against `project_root`
    pub config: Config,
    /// Output as NDJSON
    pub json: bool,
    /// Skip writing outputs
    pub dry_run: bool,
}

impl WatchOptions {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            config: Config::default(),
            json: false,
            dry_run: false,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.config.watch.debounce_ms)
    }

    pub fn flush_after(&self) -> Duration {
        Duration::from_millis(self.config.watch.flush_ms)
    }

    /// Working directory for the post-build command
    pub fn exec_cwd(&self) -> PathBuf {
        self.config
            .watch
            .exec_cwd
            .clone()
            .unwrap_or_else(|| self.config.build.output.clone())
    }
}

/// What a filesystem notification did to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Changed,
    Removed,
}

/// Watch event types for NDJSON output
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    /// Watch started
    WatchStarted {
        sources: Vec<String>,
        output: String,
    },
    /// File changed; `synthetic` marks the one-time startup announcement
    FileChanged {
        path: String,
        kind: ChangeKind,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        synthetic: bool,
    },
    /// Batch resolution started
    BatchStarted { changes: usize },
    /// Batch settled
    BatchComplete {
        compiled: usize,
        written: usize,
        removed: usize,
        failed: usize,
        hops: usize,
        elapsed_ms: u64,
    },
    /// A record or namespace failed
    Failure {
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        message: String,
    },
    /// Nothing claimed this file; it was copied
    Miss { path: String },
    /// Post-build command (re)started
    CommandStarted { command: String, pid: u32 },
    /// Post-build command wrote to stderr or could not start
    CommandFailed { message: String },
    /// Cache persisted
    CacheFlushed { entries: usize },
    /// Error occurred
    Error { message: String },
    /// Watch stopped
    Shutdown,
}

impl WatchEvent {
    /// Convert to JSON string with "command": "watch" field included
    pub fn to_json(&self) -> String {
        let mut value =
            serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"event": "error"}));
        if let Some(obj) = value.as_object_mut() {
            obj.insert("command".to_string(), serde_json::json!("watch"));
        }
        serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Watcher state for debouncing
///
/// Every notification restarts the quiet window; the last kind seen for a
/// path wins.
#[derive(Debug)]
pub struct WatcherState {
    pending_changes: BTreeMap<PathBuf, ChangeKind>,
    last_change: Option<Instant>,
    debounce: Duration,
}

impl Default for WatcherState {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}

impl WatcherState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            pending_changes: BTreeMap::new(),
            last_change: None,
            debounce,
        }
    }

    /// Add a file change to pending changes
    pub fn add_change(&mut self, path: PathBuf, kind: ChangeKind) {
        self.add_change_at(path, kind, Instant::now());
    }

    pub fn add_change_at(&mut self, path: PathBuf, kind: ChangeKind, at: Instant) {
        self.pending_changes.insert(path, kind);
        self.last_change = Some(at);
    }

    /// Check if debounce period has passed and we have pending changes
    pub fn should_sync(&self) -> bool {
        self.should_sync_at(Instant::now())
    }

    pub fn should_sync_at(&self, now: Instant) -> bool {
        match self.last_change {
            Some(last) => {
                !self.pending_changes.is_empty() && now.saturating_duration_since(last) >= self.debounce
            }
            None => false,
        }
    }

    /// Take all pending changes, resetting state
    pub fn take_changes(&mut self) -> Vec<(PathBuf, ChangeKind)> {
        self.last_change = None;
        std::mem::take(&mut self.pending_changes).into_iter().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_changes.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.pending_changes.len()
    }
}

