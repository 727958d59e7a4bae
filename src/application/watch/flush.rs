//! Debounced cache persistence
//!
//! A settled batch that wrote, removed or failed something marks the cache
//! as pending; it is written once no further batch settled for the idle
//! window, and unconditionally on shutdown.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::application::build::BuildReport;
use crate::domain::entities::DependencyCache;
use crate::domain::ports::{CacheRepository, CacheResult};

pub struct CacheFlusher<'a> {
    repo: &'a dyn CacheRepository,
    path: PathBuf,
    idle: Duration,
    pending_since: Option<Instant>,
    enabled: bool,
}

impl<'a> CacheFlusher<'a> {
    pub fn new(repo: &'a dyn CacheRepository, path: impl Into<PathBuf>, idle: Duration) -> Self {
        Self {
            repo,
            path: path.into(),
            idle,
            pending_since: None,
            enabled: true,
        }
    }

    /// A disabled flusher never writes (dry runs)
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mark after a settled batch. No-op batches leave the cache alone.
    pub fn settled(&mut self, report: &BuildReport) -> bool {
        if report.is_noop() && report.failures.is_empty() {
            return false;
        }
        self.mark();
        true
    }

    pub fn mark(&mut self) {
        self.mark_at(Instant::now());
    }

    pub fn mark_at(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn has_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn is_due_at(&self, now: Instant) -> bool {
        self.pending_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.idle)
    }

    /// Write the cache if the idle window has passed. Returns whether it did.
    pub fn flush_if_due(&mut self, cache: &DependencyCache) -> CacheResult<bool> {
        self.flush_if_due_at(cache, Instant::now())
    }

    pub fn flush_if_due_at(&mut self, cache: &DependencyCache, now: Instant) -> CacheResult<bool> {
        if !self.is_due_at(now) {
            return Ok(false);
        }
        self.flush(cache)?;
        Ok(true)
    }

    /// Write the cache now if anything is pending
    pub fn flush(&mut self, cache: &DependencyCache) -> CacheResult<()> {
        if self.pending_since.take().is_none() || !self.enabled {
            return Ok(());
        }
        self.repo.save(cache, &self.path)?;
        tracing::debug!(path = %self.path.display(), entries = cache.len(), "flushed cache");
        Ok(())
    }
}
