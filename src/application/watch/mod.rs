//! Watch Use Case
//!
//! Continuous rebuilding. It orchestrates:
//! - File system monitoring (via `notify` crate)
//! - Debouncing (100ms default, `watch.debounce_ms`)
//! - Batch resolution and dispatch through the shared [`Builder`]
//! - Debounced cache persistence and the post-build command
//!
//! ## Architecture
//!
//! - `WatchUseCase` - Main orchestrator (notify loop)
//! - `WatchScheduler` - Debounce state machine around the builder
//! - `CacheFlusher` - Writes the cache once batches go quiet
//! - `WatchEvent` - Events emitted during watch operation
//!
//! ## Usage
//!
//! ```ignore
//! let options = WatchOptions::new(root).with_config(config);
//! let use_case = WatchUseCase::new(options, JsonCacheRepository::new(), plugins);
//! use_case.start(running, |event| { ... });
//! ```
//!
//! [`Builder`]: crate::application::build::Builder

mod event;
mod flush;
mod scheduler;
mod use_case;


pub use event::{ChangeKind, WatchEvent, WatchOptions, WatcherState, DEBOUNCE_MS};
pub use flush::CacheFlusher;
pub use scheduler::{Phase, Settled, WatchScheduler};
pub use use_case::WatchUseCase;
