//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure provides the concrete implementations; stages, batch
//! handlers and hooks are also supplied by plugins.

pub mod batch_handler;
pub mod cache_repository;
pub mod fetcher;
pub mod file_system;
pub mod hook;
pub mod stage;

pub use batch_handler::{BatchError, BatchHandler, NamespaceBody, NamespaceOutput};
pub use cache_repository::{CacheError, CacheRepository, CacheResult};
pub use fetcher::{FetchError, Fetcher, OfflineFetcher};
pub use file_system::{FileSystem, FsError, FsResult};
pub use hook::{Hook, HookCall, HookEnv, HookOutput};
pub use stage::{Stage, StageContext, StageError};
