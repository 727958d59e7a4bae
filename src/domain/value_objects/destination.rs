//! Destination computation
//!
//! A destination is a pure function of the source path, the output layout and
//! the rename rule. No other state participates.

use std::path::{Component, Path, PathBuf};

/// Default rename template
pub const DEFAULT_RENAME: &str = "{dir}/{name}.{ext}";

/// Destination template with `{dir}`, `{name}`, `{ext}` and `{fname}`
/// placeholders (`{fname}` is `{name}.{ext}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule(String);

impl RenameRule {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the template into a relative path
    pub fn apply(&self, dir: &str, name: &str, ext: &str) -> PathBuf {
        let fname = if ext.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", name, ext)
        };
        let rendered = self
            .0
            .replace("{dir}", dir)
            .replace("{fname}", &fname)
            .replace("{name}", name)
            .replace("{ext}", ext);

        rendered
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .map(|segment| segment.trim_end_matches('.'))
            .collect()
    }
}

impl Default for RenameRule {
    fn default() -> Self {
        Self::new(DEFAULT_RENAME)
    }
}

/// Where sources live and where their outputs go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub sources: Vec<PathBuf>,
    pub output: PathBuf,
    pub rename: RenameRule,
}

impl OutputLayout {
    pub fn new(sources: Vec<PathBuf>, output: PathBuf) -> Self {
        Self {
            sources,
            output,
            rename: RenameRule::default(),
        }
    }

    pub fn with_rename(mut self, rename: RenameRule) -> Self {
        self.rename = rename;
        self
    }

    /// Directory of `path` relative to the source root that contains it
    pub fn relative_dir(&self, path: &Path) -> PathBuf {
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        self.sources
            .iter()
            .find_map(|root| parent.strip_prefix(root).ok())
            .map(|rel| rel.to_path_buf())
            .unwrap_or_default()
    }

    /// Destination for `path` once its output label is `label`
    pub fn destination(&self, path: &Path, name: &str, label: &str) -> PathBuf {
        let dir = normalize_dir(&self.relative_dir(path));
        self.output.join(self.rename.apply(&dir, name, label))
    }

    /// Destination for a file copied verbatim (namespace outputs)
    pub fn mirror(&self, path: &Path) -> PathBuf {
        let dir = self.relative_dir(path);
        let file_name = path.file_name().map(PathBuf::from).unwrap_or_default();
        self.output.join(dir).join(file_name)
    }

    /// Whether `path` is inside the output tree
    pub fn is_output(&self, path: &Path) -> bool {
        path.starts_with(&self.output)
    }
}

fn normalize_dir(dir: &Path) -> String {
    dir.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
