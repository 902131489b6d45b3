//! # bestand-core
//!
//! Core protocol implementation for the Bestand posture corrector.
//!
//! This crate provides the low-level protocol primitives:
//! - Register image layout and encoding/decoding
//! - Status and control bit definitions
//! - Buzz strength/pattern nibble handling
//! - Shared session state (last-known snapshot)

pub mod buzz;
pub mod constants;
pub mod error;
pub mod flags;
pub mod register;
pub mod session;

pub use buzz::{BuzzPattern, BuzzStrength};
pub use error::{Error, Result};
pub use flags::{ControlFlags, StatusFlags};
pub use register::RegisterImage;
pub use session::{Ingest, Session, SessionState};

/// Register frame size
pub const FRAME_LEN: usize = 10;

/// Raw register frame as it travels over the link
pub type Frame = [u8; FRAME_LEN];
