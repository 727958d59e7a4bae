//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `BuildUseCase` - One-shot build (scan, one batch, persist the cache)
//! - `WatchUseCase` - Continuous rebuilding on file changes
//!
//! ## Services
//!
//! - `Builder` - Batch resolution and dispatch shared by both modes
//! - `Compiler` - Source record lifecycle (parse, pipe, embed, write)
//! - `Pipeline` - Stage chain walk and layout composition
//! - `Embedder` - Markup embedding pass and template hooks
//! - `ExtensionRegistry` / `PluginRegistry` - Suffix bindings, namespaces, hooks

pub mod build;
pub mod compile;
pub mod embed;
pub mod extensions;
pub mod pipeline;
pub mod plugins;
pub mod sources;
pub mod watch;

pub use build::{BuildFailure, BuildOptions, BuildReport, BuildUseCase, Builder};
pub use compile::{Compiled, Compiler};
pub use embed::{Embedded, Embedder};
pub use extensions::{ExtensionRegistry, StageBinding};
pub use pipeline::{Pipeline, PipelineOptions, Rendered};
pub use plugins::{
    registry_for, ConfigPlugin, HookTable, NamespaceBinding, NamespaceRegistry, Plugin,
    PluginContext, PluginRegistry,
};
pub use sources::SourceRegistry;
pub use watch::{WatchEvent, WatchOptions, WatchScheduler, WatchUseCase};
