//! Post-build command
//!
//! A shell command restarted after every settled watch batch. The previous
//! instance is interrupted (SIGINT) and awaited before the next one starts.
//! The signal goes to the whole process group, so jobs the shell put in the
//! background (`serve &`) are stopped too, even after the shell itself has
//! exited. Anything the command writes to stderr is treated as a failure.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{LatheError, LatheResult};

const INTERRUPT_GRACE: Duration = Duration::from_millis(500);

/// How long `stop` waits for stderr to close once the group is gone
const READER_GRACE: Duration = Duration::from_millis(200);

pub struct PostBuildCommand {
    command: String,
    cwd: PathBuf,
    child: Option<Child>,
    stderr: Arc<Mutex<Vec<String>>>,
    reader: Option<JoinHandle<()>>,
}

impl PostBuildCommand {
    pub fn new(command: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            cwd: cwd.into(),
            child: None,
            stderr: Arc::new(Mutex::new(Vec::new())),
            reader: None,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Interrupt the running instance (if any) and start a fresh one
    pub fn restart(&mut self) -> LatheResult<u32> {
        self.stop();

        if let Ok(mut lines) = self.stderr.lock() {
            lines.clear();
        }

        let mut child = shell(&self.command)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LatheError::Command {
                command: self.command.clone(),
                message: e.to_string(),
            })?;
        let pid = child.id();
        tracing::info!(command = %self.command, pid, "started post-build command");

        if let Some(stderr) = child.stderr.take() {
            let sink = Arc::clone(&self.stderr);
            let command = self.command.clone();
            self.reader = Some(thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    tracing::error!(command = %command, "{}", line);
                    if let Ok(mut lines) = sink.lock() {
                        lines.push(line);
                    }
                }
            }));
        }

        self.child = Some(child);
        Ok(pid)
    }

    /// Stderr output collected since the last restart, as an error
    pub fn failure(&self) -> Option<LatheError> {
        let lines = self.stderr.lock().ok()?;
        if lines.is_empty() {
            return None;
        }
        Some(LatheError::Command {
            command: self.command.clone(),
            message: lines.join("\n"),
        })
    }

    /// Interrupt and reap the running instance and everything it spawned
    pub fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        let running = |child: &mut Child| matches!(child.try_wait(), Ok(None)) || group_alive(child);
        if running(&mut child) {
            interrupt(&mut child);
            let deadline = Instant::now() + INTERRUPT_GRACE;
            while running(&mut child) && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if running(&mut child) {
                force_kill(&mut child);
            }
        }
        let _ = child.wait();

        if let Some(reader) = self.reader.take() {
            let deadline = Instant::now() + READER_GRACE;
            while !reader.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if reader.is_finished() {
                let _ = reader.join();
            } else {
                // a process outside the group still holds stderr
                tracing::debug!(command = %self.command, "leaving stderr reader behind");
            }
        }
        tracing::debug!(command = %self.command, "stopped post-build command");
    }
}

impl Drop for PostBuildCommand {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    use std::os::unix::process::CommandExt;

    let mut cmd = Command::new("sh");
    // own process group, so signals reach whatever the shell spawned
    cmd.arg("-c").arg(command).process_group(0);
    cmd
}

#[cfg(not(unix))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Whether any process is left in the command's process group
#[cfg(unix)]
fn group_alive(child: &Child) -> bool {
    unsafe { libc::kill(-(child.id() as i32), 0) == 0 }
}

#[cfg(unix)]
fn interrupt(child: &mut Child) {
    unsafe {
        libc::kill(-(child.id() as i32), libc::SIGINT);
    }
}

#[cfg(unix)]
fn force_kill(child: &mut Child) {
    unsafe {
        libc::kill(-(child.id() as i32), libc::SIGKILL);
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn group_alive(_child: &Child) -> bool {
    false
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(not(unix))]
fn force_kill(child: &mut Child) {
    let _ = child.kill();
}
