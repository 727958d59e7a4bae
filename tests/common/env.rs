//! Isolated on-disk project for end-to-end runs of the `lathe` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Result of running a lathe CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Parsed NDJSON lines from stdout
    pub fn events(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad json line {l:?}: {e}")))
            .collect()
    }
}

/// Temporary project directory
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("cannot read {relative}: {e}"))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// Run the binary from the project root, isolated from the user config
    pub fn run(&self, args: &[&str]) -> TestResult {
        let output = lathe()
            .args(args)
            .current_dir(self.root())
            .env("HOME", self.path(".home"))
            .env("XDG_CONFIG_HOME", self.path(".home/.config"))
            .output()
            .unwrap();
        TestResult::from_output(output)
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// `lathe` command with color and `LATHE_*` overrides stripped
pub fn lathe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lathe"));
    cmd.env("NO_COLOR", "1");
    cmd.env("TERM", "dumb");
    cmd.env_remove("RUST_LOG");
    for var in ["LATHE_OUTPUT", "LATHE_CACHE", "LATHE_DEBOUNCE_MS", "LATHE_EXEC"] {
        cmd.env_remove(var);
    }
    cmd
}
