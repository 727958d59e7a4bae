//! Domain Entities
//!
//! Core domain entities that have identity and lifecycle.
//! - `SourceRecord` - One input file and its compile state
//! - `DependencyCache` - Cross-run metadata used to skip unchanged work

mod dependency_cache;
mod source_record;

pub use dependency_cache::{cache_key, to_millis, CacheEntry, DependencyCache, Destination};
pub use source_record::{CompileState, SourceRecord};
