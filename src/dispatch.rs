//! # Job Dispatcher
//!
//! Runs one print attempt end to end:
//!
//! ```text
//! write artifact ──► print file ──► remove artifact ──► JobResult
//!       │                                  ▲
//!       └── write error ───────────────────┘ (nothing to print or remove)
//! ```
//!
//! The artifact is removed whatever the print outcome. Errors never escape
//! [`JobDispatcher::dispatch`]; they become [`JobResult::Failed`].

use std::sync::Arc;
use tracing::{error, info};

use crate::artifact::ArtifactStore;
use crate::error::Result;
use crate::job::{JobResult, PrintJob};
use crate::printer::PrintAdapter;
use crate::printer::platform::validate_printer_name;

/// Turns a payload into paper via the artifact store and the print adapter.
pub struct JobDispatcher {
    store: ArtifactStore,
    adapter: Arc<dyn PrintAdapter>,
}

impl JobDispatcher {
    pub fn new(store: ArtifactStore, adapter: Arc<dyn PrintAdapter>) -> Self {
        Self { store, adapter }
    }

    pub fn adapter(&self) -> &Arc<dyn PrintAdapter> {
        &self.adapter
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Write `payload_base64` to a temp file, print it on `printer`, then
    /// delete the file.
    ///
    /// `label` only names the temp file. Shared by the poll loop and the
    /// ad-hoc `/print/pdf` endpoint.
    pub async fn print_document(
        &self,
        label: &str,
        payload_base64: &str,
        printer: &str,
    ) -> Result<()> {
        let artifact = self.store.write(label, payload_base64).await?;

        // If this future is dropped mid-print, the artifact's destructor
        // deletes the file instead.
        let outcome = self.adapter.print_file(artifact.path(), printer).await;
        self.store.remove(artifact).await;

        outcome
    }

    /// Dispatch one backend job and describe the outcome.
    pub async fn dispatch(&self, job: &PrintJob) -> JobResult {
        info!(job = %job, printer = %job.printer_name, "processing print job");

        if let Err(e) = validate_printer_name(&job.printer_name) {
            error!(job = %job, error = %e, "rejecting print job");
            return JobResult::Failed(e.to_string());
        }

        match self
            .print_document(&job.id, &job.document_base64, &job.printer_name)
            .await
        {
            Ok(()) => {
                info!(job = %job, printer = %job.printer_name, "print job sent to printer");
                JobResult::Completed
            }
            Err(e) => {
                error!(job = %job, error = %e, "print job failed");
                JobResult::Failed(e.to_string())
            }
        }
    }
}
