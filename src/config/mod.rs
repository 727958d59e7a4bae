//! Configuration module for Lathe
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (LATHE_*)
//! 3. Project config (lathe.toml)
//! 4. User config (~/.config/lathe/config.toml)
//! 5. Built-in defaults (lowest priority)

mod loader;
mod types;

pub use loader::{user_config_path, with_env_overrides, ConfigWarning, CONFIG_FILE};
pub use types::{BuildConfig, Config, StageConfig, WatchConfig};
