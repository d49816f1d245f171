//! # Print Jobs
//!
//! Wire types exchanged with the backend.
//!
//! ## Pending Jobs Response
//!
//! The backend answers `GET /print-jobs/pending` in one of two shapes:
//!
//! ```text
//! [ {id, type, order_id?, printer_name, document_base64}, ... ]
//! { "pendingJobs": [ ... ], "alert_sound": true }
//! ```
//!
//! Both are folded into a [`PendingBatch`]. A missing or `null` job array
//! is an empty batch, never an error.
//!
//! ## Lifecycle
//!
//! Jobs are read-only on this side. Each one is dispatched once per fetch
//! and its terminal status is reported back with a [`StatusUpdate`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Keys under which an object-shaped response may carry its job array.
const JOB_ARRAY_KEYS: &[&str] = &["pendingJobs", "pending_jobs", "jobs", "data"];

/// Keys carrying the "play an alert" signal.
const ALERT_KEYS: &[&str] = &["alert_sound", "alertSound", "play_sound"];

/// A unit of work fetched from the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrintJob {
    /// Opaque identifier, used for logs and the status callback
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Free-form category such as "receipt" or "kitchen"
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Optional correlation key
    #[serde(
        default,
        alias = "orderId",
        deserialize_with = "optional_string_or_number"
    )]
    pub order_id: Option<String>,

    /// Base64-encoded printable document (usually PDF)
    #[serde(
        default,
        alias = "documentBase64",
        alias = "pdf_base64",
        alias = "pdfBase64",
        deserialize_with = "text_or_null"
    )]
    pub document_base64: String,

    /// OS-registered printer name
    #[serde(default, alias = "printerName", deserialize_with = "text_or_null")]
    pub printer_name: String,
}

impl fmt::Display for PrintJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Job ID: {}, Type: {}, Order ID: {}",
            self.id,
            self.kind.as_deref().unwrap_or("N/A"),
            self.order_id.as_deref().unwrap_or("N/A")
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(String::from)
        .filter(|s| !s.is_empty()))
}

/// `null` reads as empty text, which dispatch then rejects as a failed job.
fn text_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `id` of an entry that failed to parse, if it has a usable one.
fn entry_id(entry: &Value) -> Option<String> {
    match entry.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One fetch worth of jobs, plus the optional alert signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingBatch {
    pub jobs: Vec<PrintJob>,
    /// Backend asked for an audible alert (new orders arrived)
    pub alert_sound: bool,
}

impl PendingBatch {
    /// Interpret a pending-jobs response body.
    ///
    /// An entry that is not a valid job but still has an `id` is kept with
    /// no document and no printer, so dispatch fails it and the backend
    /// hears about it. Entries without an `id` cannot be reported and are
    /// skipped.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let (entries, alert_sound) = match value {
            Value::Null => (Vec::new(), false),
            Value::Array(entries) => (entries, false),
            Value::Object(mut map) => {
                let alert_sound = ALERT_KEYS
                    .iter()
                    .filter_map(|key| map.get(*key))
                    .any(|v| matches!(v, Value::Bool(true)) || v.as_u64() == Some(1));
                let entries = JOB_ARRAY_KEYS
                    .iter()
                    .find_map(|key| match map.remove(*key) {
                        Some(Value::Array(entries)) => Some(entries),
                        _ => None,
                    })
                    .unwrap_or_default();
                (entries, alert_sound)
            }
            other => {
                return Err(format!(
                    "unexpected pending jobs response: {}",
                    type_name(&other)
                ));
            }
        };

        let jobs = entries
            .into_iter()
            .filter_map(|entry| match PrintJob::deserialize(&entry) {
                Ok(job) => Some(job),
                Err(e) => match entry_id(&entry) {
                    Some(id) => {
                        warn!(job_id = %id, error = %e, "malformed print job entry");
                        Some(PrintJob {
                            id,
                            kind: None,
                            order_id: None,
                            document_base64: String::new(),
                            printer_name: String::new(),
                        })
                    }
                    None => {
                        warn!(error = %e, "skipping print job entry without an id");
                        None
                    }
                },
            })
            .collect();

        Ok(Self { jobs, alert_sound })
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Terminal disposition reported back to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Body of `PUT /print-jobs/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: JobStatus,
    /// `null` on success
    pub error_message: Option<String>,
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    Completed,
    Failed(String),
}

impl JobResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobResult::Completed)
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobResult::Completed => JobStatus::Completed,
            JobResult::Failed(_) => JobStatus::Failed,
        }
    }

    pub fn to_update(&self) -> StatusUpdate {
        StatusUpdate {
            status: self.status(),
            error_message: match self {
                JobResult::Completed => None,
                JobResult::Failed(reason) => Some(reason.clone()),
            },
        }
    }
}
