//! Subcommand implementations

pub mod build;
pub mod stages;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use lathe::application::{registry_for, PluginRegistry};
use lathe::config::{with_env_overrides, Config, CONFIG_FILE};
use lathe::domain::ports::{Fetcher, OfflineFetcher};
use lathe::infrastructure::HttpFetcher;

use crate::ui::output::print_config_warnings;

/// Resolved configuration plus the registry built from it
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    pub plugins: PluginRegistry,
}

/// Load config (explicit path > ./lathe.toml > user config > defaults),
/// apply CLI overrides and anchor every path at the project root.
pub fn load_project(config_path: Option<&Path>, output: Option<&Path>, json: bool) -> Result<Project> {
    let cwd = std::env::current_dir()?;

    let explicit = config_path.map(Path::to_path_buf).or_else(|| {
        let project_config = cwd.join(CONFIG_FILE);
        project_config.exists().then_some(project_config)
    });

    let (mut config, root) = match explicit {
        Some(path) => {
            let (config, warnings) = Config::load_with_warnings(&path)?;
            if !json {
                print_config_warnings(&path, &warnings);
            }
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| cwd.join(p))
                .unwrap_or_else(|| cwd.clone());
            (with_env_overrides(config), root)
        }
        None => {
            let (config, warnings) = Config::load_or_default(None);
            if !json {
                for warning in &warnings {
                    eprintln!("⚠ {}", warning);
                }
            }
            (config, cwd)
        }
    };

    if let Some(output) = output {
        config.build.output = output.to_path_buf();
    }
    let config = config.resolve_paths(&root);
    let plugins = registry_for(&config, &[])?;

    Ok(Project {
        root,
        config,
        plugins,
    })
}

/// HTTP fetcher for remote embeds; offline when the client cannot be built
pub fn fetcher() -> Arc<dyn Fetcher> {
    match HttpFetcher::new() {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            tracing::warn!("remote embeds disabled: {}", e);
            Arc::new(OfflineFetcher)
        }
    }
}
