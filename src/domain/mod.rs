//! Domain Layer
//!
//! The core of Lathe: pure build rules without direct I/O.
//!
//! ## Structure
//!
//! - `entities/` - Source records and the dependency cache
//! - `value_objects/` - Suffix chains, content and destinations
//! - `services/` - Invalidation rules
//! - `ports/` - Interfaces for file system, cache persistence, stages,
//!   namespace handlers, hooks and remote fetches
//!
//! ## Design Principles
//!
//! 1. **No I/O** - This layer only touches files through the `FileSystem` port
//! 2. **Pure Functions** - Services are stateless and testable
//! 3. **Ports & Adapters** - All I/O goes through trait-defined ports

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
