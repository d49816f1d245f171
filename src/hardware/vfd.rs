//! # VFD Pole Display
//!
//! Drives a 2×20 character vacuum-fluorescent customer display over a
//! serial port.
//!
//! ## Frame Format
//!
//! ```text
//! 0C  <line 1, 20 columns>  <line 2, 20 columns>
//! │
//! └── clear screen, cursor home
//! ```
//!
//! The display wraps after column 20, so two padded lines land on the two
//! rows without any cursor commands. Characters outside printable ASCII are
//! replaced with `?` because the display's code page is unknown.

use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::VfdConfig;
use crate::error::{BridgeError, Result};

/// Characters per display row.
pub const VFD_COLUMNS: usize = 20;

/// Clear screen and home cursor.
const CLEAR: u8 = 0x0C;

/// Upper bound for one frame write.
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Build the bytes that show `line1` over `line2`.
pub fn render_frame(line1: &str, line2: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + 2 * VFD_COLUMNS);
    frame.push(CLEAR);
    for line in [line1, line2] {
        let mut row: Vec<u8> = line
            .chars()
            .map(|c| match c {
                ' '..='~' => c as u8,
                _ => b'?',
            })
            .take(VFD_COLUMNS)
            .collect();
        row.resize(VFD_COLUMNS, b' ');
        frame.extend(row);
    }
    frame
}

/// A pole display on a configured serial port.
pub struct VfdDisplay {
    config: VfdConfig,
    // One frame at a time; interleaved writes garble both.
    lock: Mutex<()>,
}

impl VfdDisplay {
    pub fn new(config: VfdConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &VfdConfig {
        &self.config
    }

    /// Replace the display contents.
    pub async fn show(&self, line1: &str, line2: &str) -> Result<()> {
        let frame = render_frame(line1, line2);
        let _lock = self.lock.lock().await;

        let port = serial2_tokio::SerialPort::open(&self.config.port, self.config.baud_rate)
            .map_err(|e| {
                BridgeError::Hardware(format!("Failed to open {}: {}", self.config.port, e))
            })?;

        tokio::time::timeout(WRITE_TIMEOUT, write_frame(&port, &frame))
            .await
            .map_err(|_| BridgeError::Hardware(format!("Write to {} timed out", self.config.port)))?
            .map_err(|e| BridgeError::Hardware(format!("Write failed: {}", e)))?;

        info!(port = %self.config.port, "updated VFD text");
        Ok(())
    }
}

async fn write_frame(port: &serial2_tokio::SerialPort, mut frame: &[u8]) -> std::io::Result<()> {
    while !frame.is_empty() {
        match port.write(frame).await? {
            0 => return Err(std::io::ErrorKind::WriteZero.into()),
            n => frame = &frame[n..],
        }
    }
    Ok(())
}
