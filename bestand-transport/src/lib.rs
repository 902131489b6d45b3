//! Transport layer for the Bestand protocol
//!
//! The link itself (discovery, pairing, GATT) lives outside this workspace.
//! A link implementation pushes notifications into a
//! [`bestand_core::Session`] and implements [`Transport`] for the write
//! side.

pub mod error;
pub mod mock;

pub use error::{Error, Result};
pub use mock::MockTransport;

use async_trait::async_trait;
use bestand_core::Frame;

/// Outbound half of a device link
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one register frame
    ///
    /// Each call is a separate write on the link; implementations must not
    /// coalesce consecutive identical frames.
    async fn transmit(&mut self, frame: &Frame) -> Result<()>;
    
    /// Disconnect from device
    async fn disconnect(&mut self) -> Result<()>;
    
    /// Check if connected
    fn is_connected(&self) -> bool;
    
    /// Get device address
    fn remote_addr(&self) -> String;
}
