//! # Printer Module
//!
//! This module talks to the operating system's printing tools.
//!
//! ## Modules
//!
//! - [`command`]: External process runner
//! - [`platform`]: Printer enumeration and silent printing per OS

pub mod command;
pub mod platform;

pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use platform::{CommandPrinter, Platform, PrintAdapter};
