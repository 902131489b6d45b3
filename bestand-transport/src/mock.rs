//! In-memory transport
//!
//! Records every frame written so tests can inspect the exact write
//! sequence. With [`MockTransport::with_echo`] it also plays the device:
//! each write is answered with a notification reflecting the request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bestand_core::constants::offset;
use bestand_core::{ControlFlags, Frame, Session, StatusFlags};
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Mock transport
///
/// Cloning yields another handle onto the same write log and link state.
#[derive(Debug, Clone)]
pub struct MockTransport {
    address: String,
    writes: Arc<parking_lot::Mutex<Vec<Frame>>>,
    connected: Arc<AtomicBool>,
    /// Writes left before the link drops
    drop_after: Arc<parking_lot::Mutex<Option<usize>>>,
    echo: Option<Session>,
}

impl MockTransport {
    /// Create new connected mock transport
    pub fn new() -> Self {
        Self {
            address: "00:00:00:00:00:00".into(),
            writes: Arc::new(parking_lot::Mutex::new(Vec::new())),
            connected: Arc::new(AtomicBool::new(true)),
            drop_after: Arc::new(parking_lot::Mutex::new(None)),
            echo: None,
        }
    }
    
    /// Set the reported device address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }
    
    /// Answer each write with a simulated device notification
    pub fn with_echo(mut self, session: Session) -> Self {
        self.echo = Some(session);
        self
    }
    
    /// Drop the link after `count` more successful writes
    pub fn drop_after(&self, count: usize) {
        *self.drop_after.lock() = Some(count);
    }
    
    /// Get all captured writes
    pub fn writes(&self) -> Vec<Frame> {
        self.writes.lock().clone()
    }
    
    /// Most recent write
    pub fn last_write(&self) -> Option<Frame> {
        self.writes.lock().last().copied()
    }
    
    /// Clear captured writes
    pub fn clear_writes(&self) {
        self.writes.lock().clear();
    }
    
    /// Simulate the device going out of range
    pub fn sever(&self) {
        debug!("Mock link severed");
        self.connected.store(false, Ordering::Release);
        if let Some(session) = &self.echo {
            session.close();
        }
    }
    
    fn answer(&self, frame: &Frame) {
        let Some(session) = &self.echo else {
            return;
        };
        
        let reply = device_response(frame);
        if let Err(e) = session.ingest(&reply) {
            warn!("Simulated notification rejected: {}", e);
        }
        
        if ControlFlags::from_bits_retain(frame[offset::CONTROL]).contains(ControlFlags::POWER_OFF) {
            self.sever();
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// What the device reports after accepting `frame`
///
/// Vibration requests become the vibration status bit, calibration finishes
/// at once and the control byte is consumed.
pub fn device_response(frame: &Frame) -> Frame {
    let mut reply = *frame;
    let control = ControlFlags::from_bits_retain(frame[offset::CONTROL]);
    let mut status = StatusFlags::from_bits_retain(frame[offset::STATUS]);
    
    if control.contains(ControlFlags::VIBRATION_ON) {
        status.insert(StatusFlags::VIBRATING);
    } else if control.contains(ControlFlags::VIBRATION_OFF) {
        status.remove(StatusFlags::VIBRATING);
    }
    status.remove(StatusFlags::CALIBRATING);
    
    reply[offset::STATUS] = status.bits();
    reply[offset::CONTROL] = 0;
    reply
}

#[async_trait]
impl Transport for MockTransport {
    async fn transmit(&mut self, frame: &Frame) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        
        let severed = match &mut *self.drop_after.lock() {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        if severed {
            self.sever();
            return Err(Error::ConnectionClosed);
        }
        
        trace!("Sending frame: {}", hex::encode(frame));
        self.writes.lock().push(*frame);
        self.answer(frame);
        
        Ok(())
    }
    
    async fn disconnect(&mut self) -> Result<()> {
        if self.is_connected() {
            debug!("Disconnecting from {}...", self.remote_addr());
            self.connected.store(false, Ordering::Release);
        }
        Ok(())
    }
    
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
    
    fn remote_addr(&self) -> String {
        self.address.clone()
    }
}
