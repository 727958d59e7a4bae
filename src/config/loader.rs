//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LatheError, LatheResult};

use super::types::Config;

/// Project configuration file name
pub const CONFIG_FILE: &str = "lathe.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> LatheResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| LatheError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load from project config, user config, or defaults
///
/// An unreadable project or user config is logged and skipped.
pub fn load_or_default(project_root: Option<&Path>) -> (Config, Vec<ConfigWarning>) {
    let project_config = project_root.map(|root| root.join(CONFIG_FILE));
    for path in project_config.into_iter().chain(user_config_path()) {
        if let Some((config, warnings)) = load_layer(&path) {
            return (with_env_overrides(config), warnings);
        }
    }

    (with_env_overrides(Config::default()), Vec::new())
}

/// Load one config file if it exists. A file that fails to load is
/// logged and skipped.
pub(crate) fn load_layer(path: &Path) -> Option<(Config, Vec<ConfigWarning>)> {
    if !path.exists() {
        return None;
    }
    match load_with_warnings(path) {
        Ok(loaded) => Some(loaded),
        Err(e) => {
            tracing::warn!("ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// `~/.config/lathe/config.toml` (platform config dir)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lathe").join("config.toml"))
}

/// Apply environment variable overrides (LATHE_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    with_overrides_from(config, |key| std::env::var(key).ok())
}

pub(crate) fn with_overrides_from(
    mut config: Config,
    var: impl Fn(&str) -> Option<String>,
) -> Config {
    if let Some(output) = var("LATHE_OUTPUT").filter(|v| !v.is_empty()) {
        config.build.output = PathBuf::from(output);
    }

    if let Some(cache) = var("LATHE_CACHE").filter(|v| !v.is_empty()) {
        config.build.cache = PathBuf::from(cache);
    }

    if let Some(debounce) = var("LATHE_DEBOUNCE_MS") {
        match debounce.trim().parse::<u64>() {
            Ok(ms) => config.watch.debounce_ms = ms,
            Err(_) => tracing::warn!("ignoring LATHE_DEBOUNCE_MS={}: not a number", debounce),
        }
    }

    if let Some(exec) = var("LATHE_EXEC") {
        config.watch.exec = if exec.trim().is_empty() {
            None
        } else {
            Some(exec)
        };
    }

    config
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "build",
        "sources",
        "output",
        "root",
        "cache",
        "rename",
        "no_write",
        "preserve",
        "exempt",
        "include",
        "exclude",
        "copy",
        "capacity",
        "watch",
        "debounce_ms",
        "flush_ms",
        "exec",
        "exec_cwd",
        "locals",
        "stages",
        "command",
        "args",
        "literate",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
