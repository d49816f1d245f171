//! # Hardware Module
//!
//! Fire-and-forget peripherals next to the receipt printer.
//!
//! ## Modules
//!
//! - [`drawer`]: Cash drawer kick over an ESC/POS printer device
//! - [`vfd`]: Two-line customer pole display over a serial port

pub mod drawer;
pub mod vfd;

pub use drawer::CashDrawer;
pub use vfd::VfdDisplay;

use crate::error::{BridgeError, Result};

/// Serial ports present on this machine, for VFD discovery.
pub fn list_serial_ports() -> Result<Vec<String>> {
    let ports = serial2_tokio::SerialPort::available_ports()
        .map_err(|e| BridgeError::Hardware(format!("Failed to enumerate serial ports: {}", e)))?;
    Ok(ports.iter().map(|p| p.display().to_string()).collect())
}
