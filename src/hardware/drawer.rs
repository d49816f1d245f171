//! # Cash Drawer
//!
//! Cash drawers hang off the receipt printer's DK port. Sending the ESC/POS
//! "generate pulse" command to the printer opens the drawer:
//!
//! ```text
//! ESC p m t1 t2    1B 70 00 19 FA
//!                   │  │  │  └─ off time (250 × 2ms)
//!                   │  │  └──── on time  (25 × 2ms)
//!                   │  └─────── pin 2
//!                   └────────── "p"
//! ```
//!
//! The device is whatever node accepts raw bytes for that printer:
//! `/dev/usb/lp0` on Linux, a shared printer path such as
//! `\\localhost\EPSON` on Windows.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{BridgeError, Result};

/// ESC/POS pulse on drawer pin 2.
pub const DRAWER_KICK: [u8; 5] = [0x1B, 0x70, 0x00, 0x19, 0xFA];

/// A cash drawer reachable through a printer device node.
#[derive(Debug, Clone)]
pub struct CashDrawer {
    device: PathBuf,
}

impl CashDrawer {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Pulse the drawer open.
    pub async fn open(&self) -> Result<()> {
        let device = self.device.clone();
        tokio::task::spawn_blocking(move || kick(&device))
            .await
            .map_err(|e| BridgeError::Hardware(format!("Task error: {}", e)))??;

        info!(device = %self.device.display(), "cash drawer opened");
        Ok(())
    }
}

/// Write the pulse to the device (blocking).
fn kick(device: &Path) -> Result<()> {
    let mut file = OpenOptions::new().write(true).open(device).map_err(|e| {
        BridgeError::Hardware(format!("Failed to open {}: {}", device.display(), e))
    })?;
    file.write_all(&DRAWER_KICK)
        .and_then(|()| file.flush())
        .map_err(|e| BridgeError::Hardware(format!("Write failed: {}", e)))
}
