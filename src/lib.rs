//! # POS Bridge - Local Hardware Bridge for Point-of-Sale Terminals
//!
//! POS Bridge runs next to a cash register and gives a browser-based POS
//! front-end access to the hardware it cannot reach itself:
//!
//! - **Printing**: silent PDF printing through the operating system's tools
//! - **Job polling**: pulls queued print jobs from a remote backend and
//!   reports their outcome
//! - **Peripherals**: cash drawer kick and two-line VFD pole display
//! - **Customer view**: a full-screen page fed by server-sent events
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use posbridge::{
//!     artifact::ArtifactStore,
//!     dispatch::JobDispatcher,
//!     printer::{CommandPrinter, Platform, PrintAdapter},
//! };
//!
//! # async fn example() -> posbridge::error::Result<()> {
//! let adapter = Arc::new(CommandPrinter::system(Platform::detect(None), None));
//! println!("{:?}", adapter.list_printers().await?);
//!
//! let dispatcher = JobDispatcher::new(
//!     ArtifactStore::in_temp_dir(std::time::Duration::ZERO),
//!     adapter,
//! );
//! dispatcher.print_document("manual", "JVBERi0xLjQK", "Receipt").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | JSON configuration with legacy key names |
//! | [`error`] | Error types |
//! | [`job`] | Print job and status wire types |
//! | [`printer`] | OS printer enumeration and silent printing |
//! | [`artifact`] | Temp files holding decoded documents |
//! | [`dispatch`] | Write, print, clean up |
//! | [`backend`] | Remote job queue client |
//! | [`scheduler`] | Single-flight poll loop |
//! | [`display`] | Customer screen event hub |
//! | [`hardware`] | Cash drawer and VFD |
//! | [`kiosk`] | Customer view browser launch |
//! | [`server`] | Local HTTP API |

pub mod artifact;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod hardware;
pub mod job;
pub mod kiosk;
pub mod printer;
pub mod scheduler;
pub mod server;

// Re-exports for convenience
pub use error::BridgeError;
pub use job::{JobResult, PrintJob};
