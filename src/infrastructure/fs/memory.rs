//! In-memory FileSystem with a controllable clock.
//!
//! Modification times are plain millisecond counters so invalidation can be
//! exercised without sleeping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::domain::ports::file_system::{FileSystem, FsError, FsResult};

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, (Vec<u8>, u64)>,
    clock: u64,
    writes: Vec<PathBuf>,
    denied: Vec<PathBuf>,
}

#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<State>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create or replace a file with an explicit modification time
    pub fn put(&self, path: impl Into<PathBuf>, content: impl AsRef<[u8]>, mtime: u64) {
        let mut state = self.lock();
        state.clock = state.clock.max(mtime);
        state
            .files
            .insert(path.into(), (content.as_ref().to_vec(), mtime));
    }

    /// Change a file's modification time
    pub fn touch(&self, path: impl AsRef<Path>, mtime: u64) {
        let mut state = self.lock();
        state.clock = state.clock.max(mtime);
        if let Some(entry) = state.files.get_mut(path.as_ref()) {
            entry.1 = mtime;
        }
    }

    /// Make writes to `path` fail with permission denied
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.lock().denied.push(path.into());
    }

    pub fn allow(&self, path: impl AsRef<Path>) {
        self.lock().denied.retain(|p| p != path.as_ref());
    }

    pub fn delete(&self, path: impl AsRef<Path>) {
        self.lock().files.remove(path.as_ref());
    }

    pub fn mtime(&self, path: impl AsRef<Path>) -> Option<u64> {
        self.lock().files.get(path.as_ref()).map(|(_, m)| *m)
    }

    pub fn text(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock()
            .files
            .get(path.as_ref())
            .map(|(bytes, _)| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Every path written through the port, in order
    pub fn writes(&self) -> Vec<PathBuf> {
        self.lock().writes.clone()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().files.keys().cloned().collect()
    }
}

impl FileSystem for MemoryFs {
    fn read_bytes(&self, path: &Path) -> FsResult<Vec<u8>> {
        self.lock()
            .files
            .get(path)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, content: &[u8]) -> FsResult<()> {
        let mut state = self.lock();
        if state.denied.iter().any(|p| p == path) {
            return Err(FsError::PermissionDenied(path.to_path_buf()));
        }
        state.clock += 1;
        let now = state.clock;
        state
            .files
            .insert(path.to_path_buf(), (content.to_vec(), now));
        state.writes.push(path.to_path_buf());
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> FsResult<()> {
        let bytes = self.read_bytes(from)?;
        self.write(to, &bytes)
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    /// Directories are implied by the files below them
    fn is_dir(&self, path: &Path) -> bool {
        let state = self.lock();
        !state.files.contains_key(path) && state.files.keys().any(|p| p != path && p.starts_with(path))
    }

    fn remove(&self, path: &Path) -> FsResult<()> {
        self.lock()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.mtime(path)
            .map(|ms| UNIX_EPOCH + Duration::from_millis(ms))
    }
}
