//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use posbridge::error::{BridgeError, Result};
use posbridge::job::{PendingBatch, PrintJob, StatusUpdate};
use posbridge::printer::PrintAdapter;

/// Minimal PDF header, base64.
pub const PDF_BASE64: &str = "JVBERi0xLjQK";

/// Printer that fails on the name "Jammed" and records every call.
#[derive(Default)]
pub struct FakeAdapter {
    pub printers: Vec<String>,
    pub list_fails: bool,
    pub printed: Mutex<Vec<(PathBuf, String)>>,
    pub list_calls: AtomicUsize,
}

impl FakeAdapter {
    pub fn with_printers(names: &[&str]) -> Self {
        Self {
            printers: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn printed(&self) -> Vec<(PathBuf, String)> {
        self.printed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrintAdapter for FakeAdapter {
    async fn list_printers(&self) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.list_fails {
            return Err(BridgeError::Enumeration("lpstat: scheduler is not running".into()));
        }
        Ok(self.printers.clone())
    }

    async fn print_file(&self, path: &Path, printer: &str) -> Result<()> {
        assert!(path.exists(), "artifact must exist while printing");
        self.printed
            .lock()
            .unwrap()
            .push((path.to_path_buf(), printer.to_string()));
        if printer == "Jammed" {
            return Err(BridgeError::PrintCommand {
                code: Some(1),
                stderr: "paper jam".to_string(),
                retryable: true,
            });
        }
        Ok(())
    }
}

/// Scripted backend. Fetches pop `responses` front to back and return an
/// empty batch once it runs dry.
#[derive(Default)]
pub struct FakeBackend {
    pub responses: Mutex<VecDeque<Result<PendingBatch>>>,
    pub reports: Mutex<Vec<(String, StatusUpdate)>>,
    pub fetches: AtomicUsize,
    pub reports_fail: bool,
    /// When set, each fetch waits for a notification before answering
    pub gate: Option<Notify>,
}

impl FakeBackend {
    pub fn with_responses(responses: Vec<Result<PendingBatch>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn reports(&self) -> Vec<(String, StatusUpdate)> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl posbridge::backend::JobBackend for FakeBackend {
    async fn fetch_pending(&self) -> Result<PendingBatch> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PendingBatch::default()))
    }

    async fn report_status(&self, job_id: &str, update: &StatusUpdate) -> Result<()> {
        self.reports
            .lock()
            .unwrap()
            .push((job_id.to_string(), update.clone()));
        if self.reports_fail {
            return Err(BridgeError::StatusReport("backend returned 503".into()));
        }
        Ok(())
    }
}

pub fn job(id: &str, printer: &str) -> PrintJob {
    PrintJob {
        id: id.to_string(),
        kind: Some("receipt".to_string()),
        order_id: None,
        document_base64: PDF_BASE64.to_string(),
        printer_name: printer.to_string(),
    }
}

/// Files left behind in a temp artifact directory.
pub fn leftover_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}
