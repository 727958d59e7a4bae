//! Lathe - incremental static-asset build pipeline
//!
//! Source files are transformed by stages bound to their filename suffixes
//! (`post.md` -> html, `app.coffee.md` -> literate coffee -> js), composed
//! into layouts, have their linked resources embedded, and are written to a
//! mirrored output tree. A persisted dependency cache keeps rebuilds
//! incremental; watch mode rebuilds on every settled batch of changes.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod parser;

// Re-exports for convenience
pub use application::{
    BuildOptions, BuildReport, BuildUseCase, Builder, ExtensionRegistry, Plugin, PluginContext,
    PluginRegistry, WatchEvent, WatchOptions, WatchUseCase,
};
pub use config::Config;
pub use error::{LatheError, LatheResult};
pub use parser::parse_source;
