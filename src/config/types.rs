//! Configuration type definitions

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::value_objects::{OutputLayout, RenameRule, DEFAULT_RENAME};
use crate::error::LatheResult;

use super::loader::{self, ConfigWarning};

/// `[build]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Source directories scanned for inputs
    #[serde(default = "default_sources")]
    pub sources: Vec<PathBuf>,

    /// Output directory
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Root used for `/`-prefixed layout and include targets
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Persisted dependency cache file
    #[serde(default = "default_cache")]
    pub cache: PathBuf,

    /// Destination template (`{dir}`, `{name}`, `{ext}`, `{fname}`)
    #[serde(default = "default_rename")]
    pub rename: String,

    /// Run every stage but skip writing outputs
    #[serde(default)]
    pub no_write: bool,

    /// Suffix tokens disabled for this run; the chain stops there
    #[serde(default)]
    pub preserve: Vec<String>,

    /// Labels that always keep the full dotted suffix
    #[serde(default)]
    pub exempt: Vec<String>,

    /// Glob filters applied to source paths
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Regexes handled by the built-in `copy` namespace
    #[serde(default)]
    pub copy: Vec<String>,

    /// Soft capacity of the in-memory source registry
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            output: default_output(),
            root: None,
            cache: default_cache(),
            rename: default_rename(),
            no_write: false,
            preserve: Vec::new(),
            exempt: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            copy: Vec::new(),
            capacity: default_capacity(),
        }
    }
}

fn default_sources() -> Vec<PathBuf> {
    vec![PathBuf::from("src")]
}

fn default_output() -> PathBuf {
    PathBuf::from("build")
}

fn default_cache() -> PathBuf {
    PathBuf::from(".lathe-cache.json")
}

fn default_rename() -> String {
    DEFAULT_RENAME.to_string()
}

fn default_capacity() -> usize {
    1000
}

/// `[watch]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet window before a batch of changes is compiled
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Idle window before the cache is persisted
    #[serde(default = "default_flush_ms")]
    pub flush_ms: u64,

    /// Command restarted after every settled batch
    #[serde(default)]
    pub exec: Option<String>,

    /// Working directory for `exec` (defaults to the output directory)
    #[serde(default)]
    pub exec_cwd: Option<PathBuf>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            flush_ms: default_flush_ms(),
            exec: None,
            exec_cwd: None,
        }
    }
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_flush_ms() -> u64 {
    500
}

/// `[stages.<suffix>]` - an external command bound to a suffix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Output label; the suffix itself when absent
    #[serde(default)]
    pub output: Option<String>,

    /// Accept `name.<suffix>.md` as literate source
    #[serde(default)]
    pub literate: bool,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    /// Merged into every record's locals
    #[serde(default)]
    pub locals: Map<String, Value>,

    #[serde(default)]
    pub stages: BTreeMap<String, StageConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> LatheResult<Self> {
        Ok(loader::load_with_warnings(path)?.0)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> LatheResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Load from project config, user config, or defaults
    pub fn load_or_default(project_root: Option<&Path>) -> (Self, Vec<ConfigWarning>) {
        loader::load_or_default(project_root)
    }

    /// Anchor every relative path at `root`
    pub fn resolve_paths(mut self, root: &Path) -> Self {
        let anchor = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        self.build.sources = self.build.sources.iter().map(|p| anchor(p)).collect();
        self.build.output = anchor(&self.build.output);
        self.build.cache = anchor(&self.build.cache);
        self.build.root = self.build.root.as_deref().map(anchor);
        self.watch.exec_cwd = self.watch.exec_cwd.as_deref().map(anchor);
        self
    }

    /// Root for `/`-prefixed targets: `build.root`, else the first source dir
    pub fn target_root(&self) -> Option<&Path> {
        self.build
            .root
            .as_deref()
            .or_else(|| self.build.sources.first().map(|p| p.as_path()))
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(self.build.sources.clone(), self.build.output.clone())
            .with_rename(RenameRule::new(self.build.rename.clone()))
    }
}
