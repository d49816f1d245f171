//! # Customer Display Hub
//!
//! Fan-out of customer-screen state to every connected viewer. The POS
//! front-end posts cart and ads updates; browsers on the customer screen
//! receive them over `GET /events` (server-sent events).
//!
//! | Event | Data |
//! |-------|------|
//! | `cart:update` | cart JSON as posted |
//! | `ads:update` | ads JSON as posted |
//! | `display:clear` | `{}` |
//! | `print:alert` | `{}` |
//! | `print:status` | `{job_id, status, error_message}` |
//!
//! The latest cart and ads are remembered so a viewer that connects late
//! starts from the current state.

use serde_json::{Value, json};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

use crate::job::{JobResult, PrintJob};

/// Events buffered per viewer before it starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// One message pushed to customer screens.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    CartUpdate(Value),
    AdsUpdate(Value),
    Clear,
    /// New jobs arrived and the backend asked for an audible alert
    PrintAlert,
    PrintStatus {
        job_id: String,
        result: JobResult,
    },
}

impl DisplayEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            DisplayEvent::CartUpdate(_) => "cart:update",
            DisplayEvent::AdsUpdate(_) => "ads:update",
            DisplayEvent::Clear => "display:clear",
            DisplayEvent::PrintAlert => "print:alert",
            DisplayEvent::PrintStatus { .. } => "print:status",
        }
    }

    /// SSE event payload.
    pub fn data(&self) -> Value {
        match self {
            DisplayEvent::CartUpdate(cart) => cart.clone(),
            DisplayEvent::AdsUpdate(ads) => ads.clone(),
            DisplayEvent::Clear | DisplayEvent::PrintAlert => json!({}),
            DisplayEvent::PrintStatus { job_id, result } => {
                let update = result.to_update();
                json!({
                    "job_id": job_id,
                    "status": update.status,
                    "error_message": update.error_message,
                })
            }
        }
    }

    pub fn print_status(job: &PrintJob, result: &JobResult) -> Self {
        DisplayEvent::PrintStatus {
            job_id: job.id.clone(),
            result: result.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    cart: Option<Value>,
    ads: Option<Value>,
}

struct Inner {
    sender: broadcast::Sender<DisplayEvent>,
    snapshot: Mutex<Snapshot>,
}

/// Cheaply cloneable handle to the broadcast channel.
#[derive(Clone)]
pub struct DisplayHub {
    inner: Arc<Inner>,
}

impl Default for DisplayHub {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                sender,
                snapshot: Mutex::new(Snapshot::default()),
            }),
        }
    }

    /// Broadcast an event, returning how many viewers received it.
    pub fn publish(&self, event: DisplayEvent) -> usize {
        let mut snapshot = self
            .inner
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match &event {
            DisplayEvent::CartUpdate(cart) => snapshot.cart = Some(cart.clone()),
            DisplayEvent::AdsUpdate(ads) => snapshot.ads = Some(ads.clone()),
            DisplayEvent::Clear => snapshot.cart = None,
            DisplayEvent::PrintAlert | DisplayEvent::PrintStatus { .. } => {}
        }
        // No receivers is not an error: nobody is watching.
        self.inner.sender.send(event).unwrap_or(0)
    }

    /// Join the broadcast. Returns the current state to replay first.
    pub fn subscribe(&self) -> (Vec<DisplayEvent>, broadcast::Receiver<DisplayEvent>) {
        let snapshot = self
            .inner
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let receiver = self.inner.sender.subscribe();

        let mut replay = Vec::new();
        if let Some(ads) = &snapshot.ads {
            replay.push(DisplayEvent::AdsUpdate(ads.clone()));
        }
        if let Some(cart) = &snapshot.cart {
            replay.push(DisplayEvent::CartUpdate(cart.clone()));
        }
        (replay, receiver)
    }

    /// Number of connected viewers.
    pub fn viewers(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}
