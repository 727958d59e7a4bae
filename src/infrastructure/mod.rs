//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `fs/` - File system implementations (Local, Memory)
//! - `scan` - Source discovery and include/exclude filters
//! - `repositories/` - Dependency cache persistence (JSON)
//! - `stages/` - Built-in content transformers
//! - `namespaces/` - Built-in namespace batch handlers
//! - `hooks/` - Built-in template hooks
//! - `fetch` - Remote resource fetcher (reqwest)
//! - `exec` - Post-build command process handle

pub mod exec;
pub mod fetch;
pub mod fs;
pub mod hooks;
pub mod namespaces;
pub mod repositories;
pub mod scan;
pub mod stages;

// Re-export for convenience
pub use exec::PostBuildCommand;
pub use fetch::HttpFetcher;
pub use fs::{LocalFs, MemoryFs};
pub use repositories::JsonCacheRepository;
pub use scan::{scan_sources, SourceFilter};
