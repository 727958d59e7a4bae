//! CacheRepository port - persistence of the dependency cache
//!
//! Only the raw read/write of the snapshot lives behind this trait; the
//! invalidation rules that govern its content are in `domain::services`.

use std::path::Path;

use crate::domain::entities::DependencyCache;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache persistence errors
#[derive(Debug)]
pub enum CacheError {
    /// Snapshot exists but could not be decoded
    Corrupted(String),
    /// Snapshot could not be encoded
    Serialization(String),
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Corrupted(msg) => write!(f, "Corrupted cache file: {}", msg),
            CacheError::Serialization(msg) => write!(f, "Cannot serialize cache: {}", msg),
            CacheError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {}

/// Abstract repository for the dependency cache snapshot
pub trait CacheRepository: Send + Sync {
    /// Load the snapshot; absent or corrupt files yield an empty cache
    fn load_or_new(&self, path: &Path) -> DependencyCache {
        self.load(path).unwrap_or_default()
    }

    /// Load the snapshot, reporting corruption
    fn load(&self, path: &Path) -> CacheResult<DependencyCache>;

    /// Save the snapshot
    fn save(&self, cache: &DependencyCache, path: &Path) -> CacheResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_error_display() {
        let err = CacheError::Corrupted("expected value at line 1".to_string());
        assert!(err.to_string().contains("line 1"));
    }
}
