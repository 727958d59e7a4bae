//! Hook port - named template hooks expanded by the embedding pass
//!
//! Markup output may contain `{{ @name args }}`; the embedding pass looks the
//! name up in the hook table and splices the hook's output in place.

use std::path::{Path, PathBuf};

use super::stage::StageError;

/// A single hook invocation
#[derive(Debug, Clone, Copy)]
pub struct HookCall<'a> {
    pub name: &'a str,
    pub args: &'a str,
    /// File whose output contains the hook
    pub file: &'a Path,
}

/// Text to splice plus the files it was produced from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookOutput {
    pub text: String,
    pub deps: Vec<PathBuf>,
}

/// Services the embedding pass lends to hooks
pub trait HookEnv {
    /// Resolve `target` relative to `from` (or the configured root for `/…`)
    fn resolve(&self, from: &Path, target: &str) -> Option<PathBuf>;

    /// Render a source file through the pipeline without writing it
    fn render_text(&self, path: &Path) -> Result<(String, Vec<PathBuf>), StageError>;
}

pub trait Hook: Send + Sync {
    fn expand(&self, call: &HookCall<'_>, env: &dyn HookEnv) -> Result<HookOutput, StageError>;
}
