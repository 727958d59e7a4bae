//! In-memory project driving a `Builder` directly

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lathe::application::{Builder, PluginRegistry};
use lathe::domain::ports::FileSystem;
use lathe::infrastructure::MemoryFs;
use lathe::Config;

pub const ROOT: &str = "/p";

pub fn src(relative: &str) -> PathBuf {
    Path::new(ROOT).join("src").join(relative)
}

pub fn out(relative: &str) -> PathBuf {
    Path::new(ROOT).join("build").join(relative)
}

pub fn config() -> Config {
    Config::default().resolve_paths(Path::new(ROOT))
}

/// Builder plus handle on its file system
pub struct MemoryProject {
    pub fs: Arc<MemoryFs>,
    pub builder: Builder,
}

impl MemoryProject {
    pub fn new() -> Self {
        Self::with_plugins(PluginRegistry::with_builtins())
    }

    pub fn with_plugins(plugins: PluginRegistry) -> Self {
        Self::with_config(config(), plugins)
    }

    pub fn with_config(config: Config, plugins: PluginRegistry) -> Self {
        let fs = Arc::new(MemoryFs::new());
        let dynfs: Arc<dyn FileSystem> = fs.clone();
        let builder = Builder::new(config, dynfs, plugins).unwrap();
        Self { fs, builder }
    }

    /// Create a source file and tell the builder about it
    pub fn add(&mut self, relative: &str, content: &str, mtime: u64) {
        let path = src(relative);
        self.fs.put(&path, content, mtime);
        assert!(self.builder.file_added(&path), "{} ignored", path.display());
    }

    /// Bump a source's mtime and report the change
    pub fn touch(&mut self, relative: &str, mtime: u64) {
        let path = src(relative);
        self.fs.touch(&path, mtime);
        self.builder.file_changed(&path);
    }

    pub fn edit(&mut self, relative: &str, content: &str, mtime: u64) {
        let path = src(relative);
        self.fs.put(&path, content, mtime);
        self.builder.file_changed(&path);
    }

    pub fn remove(&mut self, relative: &str) {
        let path = src(relative);
        self.fs.delete(&path);
        self.builder.file_removed(&path);
    }

    pub fn output(&self, relative: &str) -> Option<String> {
        self.fs.text(out(relative))
    }

    /// Hand the builder over (to a scheduler), keeping the file system
    pub fn into_parts(self) -> (Arc<MemoryFs>, Builder) {
        (self.fs, self.builder)
    }
}

/// Text of an output under the build directory
pub fn output_of(fs: &MemoryFs, relative: &str) -> Option<String> {
    fs.text(out(relative))
}

impl Default for MemoryProject {
    fn default() -> Self {
        Self::new()
    }
}
