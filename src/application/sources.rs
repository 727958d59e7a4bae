//! Source Registry
//!
//! In-memory records keyed by absolute path. When the soft capacity is
//! exceeded the whole registry is dropped; records come back lazily from
//! the persisted cache on the next scan.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::entities::SourceRecord;

pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    records: BTreeMap<PathBuf, SourceRecord>,
    capacity: usize,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SourceRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: BTreeMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, path: &Path) -> Option<&SourceRecord> {
        self.records.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut SourceRecord> {
        self.records.get_mut(path)
    }

    pub fn insert(&mut self, record: SourceRecord) {
        self.records.insert(record.path().to_path_buf(), record);
    }

    /// Record for `path`, created (dirty) when unknown
    pub fn ensure(&mut self, path: &Path) -> &mut SourceRecord {
        self.records
            .entry(path.to_path_buf())
            .or_insert_with(|| SourceRecord::new(path))
    }

    pub fn remove(&mut self, path: &Path) -> Option<SourceRecord> {
        self.records.remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.records.keys().map(|p| p.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records.values()
    }

    /// Move the records for `paths` out so they can be compiled in parallel
    pub fn take(&mut self, paths: &[PathBuf]) -> Vec<SourceRecord> {
        paths.iter().filter_map(|p| self.records.remove(p)).collect()
    }

    /// Put records taken with [`SourceRegistry::take`] back
    pub fn restore(&mut self, records: impl IntoIterator<Item = SourceRecord>) {
        for record in records {
            self.insert(record);
        }
    }

    /// Clear everything once the soft capacity is exceeded.
    /// Returns whether the registry was cleared.
    pub fn enforce_capacity(&mut self) -> bool {
        if self.records.len() <= self.capacity {
            return false;
        }
        tracing::warn!(
            records = self.records.len(),
            capacity = self.capacity,
            "source registry over capacity, clearing"
        );
        self.records.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_creates_dirty_records_once() {
        let mut registry = SourceRegistry::default();
        registry.ensure(Path::new("/src/a.md")).mark_clean();
        assert!(!registry.ensure(Path::new("/src/a.md")).is_dirty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn take_and_restore_round_trip_selected_records() {
        let mut registry = SourceRegistry::default();
        for name in ["/src/a.md", "/src/b.md", "/src/c.md"] {
            registry.ensure(Path::new(name));
        }

        let taken = registry.take(&[PathBuf::from("/src/a.md"), PathBuf::from("/src/x.md")]);
        assert_eq!(taken.len(), 1);
        assert_eq!(registry.len(), 2);

        registry.restore(taken);
        assert!(registry.contains(Path::new("/src/a.md")));
    }

    #[test]
    fn exceeding_capacity_clears_everything() {
        let mut registry = SourceRegistry::new(2);
        registry.ensure(Path::new("/src/a.md"));
        registry.ensure(Path::new("/src/b.md"));
        assert!(!registry.enforce_capacity());

        registry.ensure(Path::new("/src/c.md"));
        assert!(registry.enforce_capacity());
        assert!(registry.is_empty());
    }
}
