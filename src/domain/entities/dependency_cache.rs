//! Dependency cache entity - cross-run metadata per source file and per
//! namespace group.
//!
//! It's a pure data structure; I/O is handled by `CacheRepository`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Normalize a path for cache keys (always use forward slashes).
pub fn cache_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Milliseconds since the epoch; the granularity the cache compares at.
pub fn to_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Where an entry's output lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Per-file output
    One(PathBuf),
    /// Every output of a namespace group
    Many(Vec<PathBuf>),
}

impl Destination {
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Destination::One(path) => vec![path.as_path()],
            Destination::Many(paths) => paths.iter().map(|p| p.as_path()).collect(),
        }
    }
}

/// Cache entry for a tracked file or group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    /// Source modification time when the entry was recorded (ms)
    modified: Option<u64>,
    destination: Option<Destination>,
    deps: Vec<PathBuf>,
    group: Option<String>,
}

impl CacheEntry {
    /// Entry for a compiled file with a single output
    pub fn compiled(modified: Option<u64>, destination: PathBuf, deps: Vec<PathBuf>) -> Self {
        Self {
            modified,
            destination: Some(Destination::One(destination)),
            deps,
            group: None,
        }
    }

    /// Entry that only remembers when the file was last seen
    pub fn modified_only(modified: u64) -> Self {
        Self {
            modified: Some(modified),
            ..Self::default()
        }
    }

    /// Group entry listing every output of a namespace
    pub fn grouped(label: impl Into<String>, modified: u64, destinations: Vec<PathBuf>) -> Self {
        Self {
            modified: Some(modified),
            destination: Some(Destination::Many(destinations)),
            deps: Vec::new(),
            group: Some(label.into()),
        }
    }

    /// Member of a namespace group
    pub fn member(label: impl Into<String>, modified: Option<u64>) -> Self {
        Self {
            modified,
            destination: None,
            deps: Vec::new(),
            group: Some(label.into()),
        }
    }

    pub fn with_parts(
        modified: Option<u64>,
        destination: Option<Destination>,
        deps: Vec<PathBuf>,
        group: Option<String>,
    ) -> Self {
        Self {
            modified,
            destination,
            deps,
            group,
        }
    }

    pub fn modified(&self) -> Option<u64> {
        self.modified
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn deps(&self) -> &[PathBuf] {
        &self.deps
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Group entries carry a list of destinations
    pub fn is_group(&self) -> bool {
        matches!(self.destination, Some(Destination::Many(_)))
    }

    pub fn depends_on(&self, path: &Path) -> bool {
        self.deps.iter().any(|d| d == path)
    }
}

/// The persisted dependency cache
///
/// Keys are absolute source paths (normalized) or namespace labels for
/// group entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn get_path(&self, path: &Path) -> Option<&CacheEntry> {
        self.entries.get(&cache_key(path))
    }

    pub fn set(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn set_path(&mut self, path: &Path, entry: CacheEntry) {
        self.entries.insert(cache_key(path), entry);
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    pub fn remove_path(&mut self, path: &Path) -> Option<CacheEntry> {
        self.entries.remove(&cache_key(path))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys of non-group entries that belong to namespace `label`
    pub fn members_of<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(_, e)| !e.is_group() && e.group() == Some(label))
            .map(|(k, _)| k.as_str())
    }

    /// Keys of entries whose dependency list contains `path`
    pub fn dependents_of<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(_, e)| e.depends_on(path))
            .map(|(k, _)| k.as_str())
    }

    /// Add `destinations` to the group entry for `label`, creating it if needed
    pub fn merge_group(&mut self, label: &str, modified: u64, destinations: Vec<PathBuf>) {
        let mut all: Vec<PathBuf> = match self.entries.get(label).and_then(|e| e.destination()) {
            Some(Destination::Many(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        for dest in destinations {
            if !all.contains(&dest) {
                all.push(dest);
            }
        }
        self.entries
            .insert(label.to_string(), CacheEntry::grouped(label, modified, all));
    }
}
