//! External command stage
//!
//! Declared in `lathe.toml` under `[stages.<suffix>]`. The current text is
//! piped to the command's stdin and its stdout becomes the new text. A
//! non-zero exit status or anything written to stderr fails the stage.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use crate::domain::ports::stage::{Stage, StageContext, StageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStage {
    name: String,
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandStage {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// `{file}` in an argument expands to the source path
    fn expand_args(&self, ctx: &StageContext) -> Vec<String> {
        let file = ctx.file.to_string_lossy();
        self.args.iter().map(|a| a.replace("{file}", &file)).collect()
    }
}

impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &mut StageContext) -> Result<(), StageError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.expand_args(ctx))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|e| StageError::new(format!("cannot run '{}': {}", self.program, e)))?;

        // stdin is written on its own thread while stdout/stderr drain here
        let input = std::mem::take(&mut ctx.text);
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || -> std::io::Result<String> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input.as_bytes())?;
            }
            Ok(input)
        });

        let output = child
            .wait_with_output()
            .map_err(|e| StageError::new(e.to_string()))?;
        let input = writer
            .join()
            .map_err(|_| StageError::new("stdin writer panicked"))?
            .map_err(|e| StageError::new(format!("cannot write to '{}': {}", self.program, e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() || !stderr.trim().is_empty() {
            ctx.text = input;
            let detail = if stderr.trim().is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(StageError::new(format!("{}: {}", self.program, detail)));
        }

        ctx.text = String::from_utf8(output.stdout)
            .map_err(|_| StageError::new(format!("{} produced non UTF-8 output", self.program)))?;
        Ok(())
    }
}
