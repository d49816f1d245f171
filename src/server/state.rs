//! Server state shared across handlers.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::BridgeConfig;
use crate::dispatch::JobDispatcher;
use crate::display::DisplayHub;
use crate::hardware::{CashDrawer, VfdDisplay};

/// Application state shared across handlers.
pub struct AppState {
    pub config: BridgeConfig,
    /// Same dispatcher the poll scheduler uses
    pub dispatcher: Arc<JobDispatcher>,
    pub display: DisplayHub,
    /// `None` when no drawer device is configured
    pub drawer: Option<CashDrawer>,
    /// `None` when no VFD port is configured
    pub vfd: Option<VfdDisplay>,
    /// Whether a poll scheduler was actually started
    pub polling: bool,
    /// Unix timestamp of server boot for cache busting.
    pub boot_time: u64,
}

impl AppState {
    pub fn new(config: BridgeConfig, dispatcher: Arc<JobDispatcher>) -> Self {
        let boot_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            drawer: config.drawer_device.clone().map(CashDrawer::new),
            vfd: config.vfd.clone().map(VfdDisplay::new),
            config,
            dispatcher,
            display: DisplayHub::new(),
            polling: false,
            boot_time,
        }
    }

    /// Use an existing hub, e.g. the one the poll scheduler publishes to.
    pub fn with_display(mut self, display: DisplayHub) -> Self {
        self.display = display;
        self
    }

    /// Record whether the poll scheduler is running.
    pub fn with_polling(mut self, started: bool) -> Self {
        self.polling = started;
        self
    }
}
