//! # bestand
//!
//! Rust implementation of the Bestand posture corrector control protocol.
//!
//! ## Features
//!
//! - Typed access to the ten-byte device register
//! - Safe read-modify-write of device settings
//! - Calibration handshake with bounded polling
//! - Transport-agnostic: bring your own BLE link
//!
//! ## Quick Start
//!
//! ```no_run
//! use bestand::{Session, SessionController};
//! use bestand::transport::MockTransport;
//!
//! #[tokio::main]
//! async fn main() -> bestand::Result<()> {
//!     // Shared between the notification listener and the controller
//!     let session = Session::new();
//!     let mut controller = SessionController::new(MockTransport::new(), session.clone());
//!     
//!     // Notification callback
//!     session.ingest(&[0x0a, 0x07, 80, 30, 45, 0x10, 10, 0, 0, 0])?;
//!     
//!     // Raise the alert threshold and calibrate
//!     controller.handle_line("t 50").await?;
//!     let outcome = controller.calibrate().await?;
//!     println!("{}", outcome);
//!     
//!     Ok(())
//! }
//! ```

pub mod apply;
pub mod config;
pub mod controller;
pub mod error;

// Re-exports
pub use apply::{apply, Applied};
pub use config::CalibrationPolicy;
pub use controller::{CalibrationOutcome, Reply, SessionController};
pub use error::{Error, Result};

// Re-export types
pub use bestand_core::{Ingest, RegisterImage, Session, SessionState};
pub use bestand_transport as transport;
pub use bestand_types::{Command, DeviceInfo};
