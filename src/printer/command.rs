//! # External Command Runner
//!
//! Every printer operation shells out to an OS utility. The runner is the
//! seam between the adapter and the process table: production code uses
//! [`SystemRunner`], tests substitute a recording fake.
//!
//! Programs are spawned directly with an argument vector. No shell is
//! involved, so printer names and paths are never interpreted as syntax.

use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

/// Captured result of one finished process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run with the given standard output.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and standard error.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs one external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, capturing its output.
    ///
    /// Returns `ErrorKind::NotFound` when the program does not exist and
    /// `ErrorKind::TimedOut` when the deadline expired.
    async fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput>;
}

/// Runs programs as real child processes via `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// Create a runner; `None` waits for the process indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput> {
        let mut command = tokio::process::Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // CREATE_NO_WINDOW: no console flashes up on the kiosk screen
        #[cfg(windows)]
        command.creation_flags(0x0800_0000);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("timed out after {}ms", limit.as_millis()),
                    )
                })??,
            None => command.output().await?,
        };

        Ok(CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
