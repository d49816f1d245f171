//! # Platform Print Adapter
//!
//! Resolves the OS-specific commands for listing printers and printing a
//! file silently. The platform is chosen once at startup.
//!
//! | Platform | Enumerate | Print |
//! |----------|-----------|-------|
//! | Windows | `powershell Get-Printer \| Select-Object Name` | `SumatraPDF.exe -print-to <printer> -silent <file>` |
//! | POSIX | `lpstat -a` | `lp -d <printer> -- <file>` |
//!
//! SumatraPDF is bundled next to the bridge executable on Windows because
//! the shell `PrintTo` verb pops dialogs and is unavailable on ARM64.

use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::command::{CommandOutput, CommandRunner, SystemRunner};
use crate::config;
use crate::error::{BridgeError, Result};

/// File name of the bundled silent-print utility.
pub const SUMATRA_EXE: &str = "SumatraPDF.exe";

/// Printer enumeration and silent printing.
#[async_trait]
pub trait PrintAdapter: Send + Sync {
    /// Names of the printers installed on this machine.
    async fn list_printers(&self) -> Result<Vec<String>>;

    /// Send the file at `path` to `printer` without any dialog.
    async fn print_file(&self, path: &Path, printer: &str) -> Result<()>;
}

/// OS family the bridge drives.
#[derive(Debug, Clone, PartialEq)]
pub enum Platform {
    /// Windows with the SumatraPDF silent-print utility
    Windows { sumatra: PathBuf },
    /// macOS/Linux with the CUPS client tools
    Posix,
}

impl Platform {
    /// Select the platform for the running OS.
    pub fn detect(sumatra_override: Option<PathBuf>) -> Self {
        if cfg!(windows) {
            Platform::Windows {
                sumatra: sumatra_override.unwrap_or_else(|| config::app_root().join(SUMATRA_EXE)),
            }
        } else {
            Platform::Posix
        }
    }

    fn list_command(&self) -> (PathBuf, Vec<OsString>) {
        match self {
            Platform::Windows { .. } => (
                PathBuf::from("powershell"),
                vec![
                    "-NoProfile".into(),
                    "-NonInteractive".into(),
                    "-Command".into(),
                    "Get-Printer | Select-Object Name".into(),
                ],
            ),
            Platform::Posix => (PathBuf::from("lpstat"), vec!["-a".into()]),
        }
    }

    fn print_command(&self, path: &Path, printer: &str) -> (PathBuf, Vec<OsString>) {
        match self {
            Platform::Windows { sumatra } => (
                sumatra.clone(),
                vec![
                    "-print-to".into(),
                    printer.into(),
                    "-silent".into(),
                    path.as_os_str().to_owned(),
                ],
            ),
            Platform::Posix => (
                PathBuf::from("lp"),
                vec![
                    "-d".into(),
                    printer.into(),
                    "--".into(),
                    path.as_os_str().to_owned(),
                ],
            ),
        }
    }

    /// Parse the enumeration command's output into printer names.
    pub fn parse_printers(&self, stdout: &str) -> Vec<String> {
        match self {
            Platform::Windows { .. } => parse_powershell_printers(stdout),
            Platform::Posix => parse_lpstat_printers(stdout),
        }
    }
}

/// Parse `Get-Printer | Select-Object Name` table output.
///
/// Drops blank lines, the `Name` header and `----` separators.
pub fn parse_powershell_printers(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "Name" && !line.starts_with("----"))
        .map(str::to_string)
        .collect()
}

/// Parse `lpstat -a` output: the printer is the first token of each line.
///
/// ```text
/// Kitchen accepting requests since Mon 01 Jan 2024 09:00:00
/// ```
pub fn parse_lpstat_printers(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Reject printer names that could not name a real queue or could be
/// mistaken for a command-line option.
pub fn validate_printer_name(printer: &str) -> Result<()> {
    if printer.trim().is_empty() {
        return Err(BridgeError::InvalidPrinter(
            "printer name is empty".to_string(),
        ));
    }
    if printer.starts_with('-') {
        return Err(BridgeError::InvalidPrinter(format!(
            "'{}' looks like a command-line option",
            printer
        )));
    }
    if printer.chars().any(char::is_control) {
        return Err(BridgeError::InvalidPrinter(
            "printer name contains control characters".to_string(),
        ));
    }
    Ok(())
}

/// [`PrintAdapter`] that drives the OS utilities through a [`CommandRunner`].
pub struct CommandPrinter {
    platform: Platform,
    runner: Arc<dyn CommandRunner>,
}

impl CommandPrinter {
    pub fn new(platform: Platform, runner: Arc<dyn CommandRunner>) -> Self {
        Self { platform, runner }
    }

    /// Adapter spawning real processes, each bounded by `timeout`.
    pub fn system(platform: Platform, timeout: Option<Duration>) -> Self {
        Self::new(platform, Arc::new(SystemRunner::new(timeout)))
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }
}

fn describe(program: &Path) -> String {
    program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

fn launch_error(program: &Path, e: io::Error) -> BridgeError {
    match e.kind() {
        io::ErrorKind::TimedOut => BridgeError::PrintCommand {
            code: None,
            stderr: format!("{} {}", describe(program), e),
            retryable: true,
        },
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => BridgeError::PrintCommand {
            code: None,
            stderr: format!("failed to launch {}: {}", describe(program), e),
            retryable: false,
        },
        _ => BridgeError::PrintCommand {
            code: None,
            stderr: format!("failed to launch {}: {}", describe(program), e),
            retryable: true,
        },
    }
}

fn failure_text(output: &CommandOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        output.stdout.trim().to_string()
    } else {
        stderr.to_string()
    }
}

#[async_trait]
impl PrintAdapter for CommandPrinter {
    async fn list_printers(&self) -> Result<Vec<String>> {
        let (program, args) = self.platform.list_command();
        let output = self.runner.run(&program, &args).await.map_err(|e| {
            BridgeError::Enumeration(format!("failed to run {}: {}", describe(&program), e))
        })?;

        if !output.success {
            return Err(BridgeError::Enumeration(format!(
                "{} exited with code {:?}: {}",
                describe(&program),
                output.code,
                failure_text(&output)
            )));
        }
        if !output.stderr.trim().is_empty() {
            warn!(stderr = %output.stderr.trim(), "printer enumeration wrote to stderr");
        }

        let printers = self.platform.parse_printers(&output.stdout);
        debug!(count = printers.len(), "enumerated printers");
        Ok(printers)
    }

    async fn print_file(&self, path: &Path, printer: &str) -> Result<()> {
        validate_printer_name(printer)?;

        if let Platform::Windows { sumatra } = &self.platform
            && !sumatra.exists()
        {
            return Err(BridgeError::PrintCommand {
                code: None,
                stderr: format!("{} not found at {}", SUMATRA_EXE, sumatra.display()),
                retryable: false,
            });
        }

        let (program, args) = self.platform.print_command(path, printer);
        let output = self
            .runner
            .run(&program, &args)
            .await
            .map_err(|e| launch_error(&program, e))?;

        if !output.success {
            return Err(BridgeError::PrintCommand {
                code: output.code,
                stderr: failure_text(&output),
                retryable: true,
            });
        }
        if !output.stderr.trim().is_empty() {
            warn!(printer, stderr = %output.stderr.trim(), "print command wrote to stderr");
        }

        info!(printer, path = %path.display(), "sent file to printer");
        Ok(())
    }
}
