//! JSON Dependency Cache Repository
//!
//! Persists the dependency cache as a single JSON object keyed by source path
//! (or namespace label for group entries).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{CacheEntry, DependencyCache, Destination};
use crate::domain::ports::cache_repository::{CacheError, CacheRepository, CacheResult};
use crate::domain::ports::file_system::FileSystem;
use crate::infrastructure::fs::LocalFs;

/// JSON representation of a destination: one path or a list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum JsonDestination {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

/// JSON representation of a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JsonCacheEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mtime: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dest: Option<JsonDestination>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    deps: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
}

/// JSON-based dependency cache repository
pub struct JsonCacheRepository {
    fs: LocalFs,
}

impl JsonCacheRepository {
    pub fn new() -> Self {
        Self { fs: LocalFs::new() }
    }

    fn lock_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        path.with_file_name(name)
    }
}

impl Default for JsonCacheRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheRepository for JsonCacheRepository {
    fn load(&self, path: &Path) -> CacheResult<DependencyCache> {
        if !self.fs.exists(path) {
            return Ok(DependencyCache::new());
        }

        let content = fs::read_to_string(path).map_err(CacheError::Io)?;
        if content.trim().is_empty() {
            return Ok(DependencyCache::new());
        }
        let raw: BTreeMap<String, JsonCacheEntry> =
            serde_json::from_str(&content).map_err(|e| CacheError::Corrupted(e.to_string()))?;

        let mut cache = DependencyCache::new();
        for (key, entry) in raw {
            cache.set(key, from_json(entry));
        }
        Ok(cache)
    }

    fn save(&self, cache: &DependencyCache, path: &Path) -> CacheResult<()> {
        let raw: BTreeMap<&str, JsonCacheEntry> =
            cache.entries().map(|(k, e)| (k, to_json(e))).collect();
        let content = serde_json::to_string_pretty(&raw)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let lock_path = Self::lock_path(path);
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(CacheError::Io)?;
        }
        let lock_file = fs::File::create(&lock_path).map_err(CacheError::Io)?;
        lock_file.lock_exclusive().map_err(CacheError::Io)?;

        let result = self
            .fs
            .write(path, content.as_bytes())
            .map_err(|e| CacheError::Io(std::io::Error::other(e.to_string())));

        let _ = lock_file.unlock();
        let _ = fs::remove_file(&lock_path);
        result
    }
}

fn from_json(entry: JsonCacheEntry) -> CacheEntry {
    let destination = entry.dest.map(|d| match d {
        JsonDestination::One(path) => Destination::One(path),
        JsonDestination::Many(paths) => Destination::Many(paths),
    });
    CacheEntry::with_parts(entry.mtime, destination, entry.deps, entry.group)
}

fn to_json(entry: &CacheEntry) -> JsonCacheEntry {
    JsonCacheEntry {
        mtime: entry.modified(),
        dest: entry.destination().map(|d| match d {
            Destination::One(path) => JsonDestination::One(path.clone()),
            Destination::Many(paths) => JsonDestination::Many(paths.clone()),
        }),
        deps: entry.deps().to_vec(),
        group: entry.group().map(String::from),
    }
}
