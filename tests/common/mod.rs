//! Common test utilities for Lathe scenario and CLI tests.
//!
//! This module provides:
//! - `TestProject`: an isolated project directory plus CLI runner
//! - `MemoryProject`: a `Builder` over an in-memory file system
//! - Fixtures: reusable source contents

#![allow(dead_code)]

pub mod env;
pub mod fixtures;
pub mod memory;

pub use env::*;
pub use fixtures::*;
pub use memory::*;
