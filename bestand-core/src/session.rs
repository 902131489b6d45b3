//! Session management for the Bestand protocol
//!
//! A session represents one connection to a device and tracks:
//! - The last register snapshot the device reported
//! - The controller state (idle, ready, calibrating, ...)
//! - Whether notifications should be echoed to the user
//!
//! The notification listener and the controller share the same `Session`
//! handle. Snapshots follow last-write-wins: every fresh notification
//! replaces the previous one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::register::RegisterImage;
use crate::{Frame, FRAME_LEN};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, waiting for the first notification
    Idle,
    
    /// Snapshot available, commands accepted
    Ready,
    
    /// Calibration handshake in progress
    Calibrating,
    
    /// Power-off or quit requested, no further writes
    Terminating,
    
    /// Link to the device is gone
    Disconnected,
}

/// Result of feeding a notification into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// New snapshot stored
    Updated {
        image: RegisterImage,
        /// Output mode was on when the snapshot arrived
        echo: bool,
    },
    
    /// Same bytes as the previous notification
    Duplicate,
}

/// Ingest counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub accepted: u64,
    pub duplicates: u64,
    pub malformed: u64,
}

/// Session manager
///
/// Manages the last-known snapshot and controller state.
/// Thread-safe and can be cloned cheaply (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Raw bytes and decoded image of the last accepted notification
    latest: parking_lot::RwLock<Option<Snapshot>>,
    
    /// Last raw buffer seen, for de-duplication
    last_raw: parking_lot::Mutex<Option<Frame>>,
    
    /// Current session state
    state: parking_lot::RwLock<SessionState>,
    
    /// Echo fresh notifications to the user
    output: AtomicBool,
    
    /// Flips to true once when the link is lost
    lost: watch::Sender<bool>,
    
    accepted: AtomicU64,
    duplicates: AtomicU64,
    malformed: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    image: RegisterImage,
    received_at: DateTime<Utc>,
}

impl Session {
    /// Create a new idle session
    pub fn new() -> Self {
        let (lost, _) = watch::channel(false);
        
        Self {
            inner: Arc::new(SessionInner {
                latest: parking_lot::RwLock::new(None),
                last_raw: parking_lot::Mutex::new(None),
                state: parking_lot::RwLock::new(SessionState::Idle),
                output: AtomicBool::new(false),
                lost,
                accepted: AtomicU64::new(0),
                duplicates: AtomicU64::new(0),
                malformed: AtomicU64::new(0),
            }),
        }
    }
    
    /// Get current state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }
    
    /// Check if a snapshot has been received
    pub fn is_ready(&self) -> bool {
        matches!(self.state(), SessionState::Ready | SessionState::Calibrating)
    }
    
    /// Check if the link has been lost
    pub fn is_lost(&self) -> bool {
        *self.inner.lost.borrow()
    }
    
    /// Feed a raw notification buffer
    ///
    /// Buffers that are not exactly one frame long are rejected with
    /// [`Error::MalformedFrame`]. A buffer identical to the previous one is
    /// reported as [`Ingest::Duplicate`] and changes nothing.
    pub fn ingest(&self, buf: &[u8]) -> Result<Ingest> {
        if self.is_lost() {
            return Err(Error::SessionLost);
        }
        
        let frame: Frame = match buf.try_into() {
            Ok(frame) => frame,
            Err(_) => {
                self.inner.malformed.fetch_add(1, Ordering::Relaxed);
                debug!("Dropping {}-byte notification", buf.len());
                return Err(Error::MalformedFrame {
                    expected: FRAME_LEN,
                    actual: buf.len(),
                });
            }
        };
        
        {
            let mut last_raw = self.inner.last_raw.lock();
            if *last_raw == Some(frame) {
                self.inner.duplicates.fetch_add(1, Ordering::Relaxed);
                return Ok(Ingest::Duplicate);
            }
            *last_raw = Some(frame);
        }
        
        let image = RegisterImage::decode(&frame)?;
        trace!("Notification: {}", hex::encode(frame));
        
        *self.inner.latest.write() = Some(Snapshot {
            image,
            received_at: Utc::now(),
        });
        self.inner.accepted.fetch_add(1, Ordering::Relaxed);
        
        {
            let mut state = self.inner.state.write();
            if *state == SessionState::Idle {
                debug!("First snapshot received, session ready");
                *state = SessionState::Ready;
            }
        }
        
        Ok(Ingest::Updated {
            image,
            echo: self.inner.output.load(Ordering::Acquire),
        })
    }
    
    /// Latest snapshot
    ///
    /// # Errors
    ///
    /// [`Error::SessionLost`] once the link is gone, [`Error::NoSnapshotYet`]
    /// before the first notification.
    pub fn snapshot(&self) -> Result<RegisterImage> {
        if self.is_lost() {
            return Err(Error::SessionLost);
        }
        
        let latest = *self.inner.latest.read();
        latest.map(|snapshot| snapshot.image).ok_or(Error::NoSnapshotYet)
    }
    
    /// Wall-clock time of the last accepted notification
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        let latest = *self.inner.latest.read();
        latest.map(|snapshot| snapshot.received_at)
    }
    
    /// Ingest counters
    pub fn stats(&self) -> IngestStats {
        IngestStats {
            accepted: self.inner.accepted.load(Ordering::Relaxed),
            duplicates: self.inner.duplicates.load(Ordering::Relaxed),
            malformed: self.inner.malformed.load(Ordering::Relaxed),
        }
    }
    
    /// Whether fresh notifications are echoed
    pub fn output_enabled(&self) -> bool {
        self.inner.output.load(Ordering::Acquire)
    }
    
    /// Flip output mode
    ///
    /// Forgets the de-duplication memory so the next notification is
    /// reported even if unchanged. Returns the new mode.
    pub fn toggle_output(&self) -> bool {
        let enabled = !self.inner.output.fetch_xor(true, Ordering::AcqRel);
        *self.inner.last_raw.lock() = None;
        enabled
    }
    
    /// Enter the calibration handshake
    pub fn begin_calibration(&self) -> Result<()> {
        let mut state = self.inner.state.write();
        
        if *state != SessionState::Ready {
            return Err(Error::InvalidSessionState(
                format!("Cannot calibrate from state: {:?}", *state)
            ));
        }
        
        *state = SessionState::Calibrating;
        Ok(())
    }
    
    /// Leave the calibration handshake
    ///
    /// A no-op unless the session is still calibrating.
    pub fn end_calibration(&self) {
        let mut state = self.inner.state.write();
        
        if *state == SessionState::Calibrating {
            *state = SessionState::Ready;
        }
    }
    
    /// Mark session as terminating
    pub fn terminate(&self) {
        let mut state = self.inner.state.write();
        
        if *state != SessionState::Disconnected {
            debug!("Session terminating");
            *state = SessionState::Terminating;
        }
    }
    
    /// Mark the link as lost
    ///
    /// Wakes any task waiting in [`Session::lost`].
    pub fn close(&self) {
        *self.inner.state.write() = SessionState::Disconnected;
        self.inner.lost.send_replace(true);
        debug!("Session closed");
    }
    
    /// Resolves once the link is lost
    pub async fn lost(&self) {
        let mut rx = self.inner.lost.subscribe();
        // The sender lives as long as `self`, so this only ends on loss.
        let _ = rx.wait_for(|lost| *lost).await;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    
    const SAMPLE: Frame = [0x0a, 0x07, 80, 30, 45, 0x10, 10, 0x00, 0x00, 0x00];
    
    #[test]
    fn test_session_new() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_ready());
        assert!(!session.is_lost());
        assert_eq!(session.snapshot(), Err(Error::NoSnapshotYet));
        assert!(session.last_update().is_none());
    }
    
    #[test]
    fn test_first_notification_makes_ready() {
        let session = Session::new();
        let ingest = session.ingest(&SAMPLE).unwrap();
        
        let image = RegisterImage::decode(&SAMPLE).unwrap();
        assert_eq!(ingest, Ingest::Updated { image, echo: false });
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.snapshot().unwrap(), image);
        assert!(session.last_update().is_some());
    }
    
    #[test]
    fn test_duplicate_notification_ignored() {
        let session = Session::new();
        session.ingest(&SAMPLE).unwrap();
        
        assert_eq!(session.ingest(&SAMPLE).unwrap(), Ingest::Duplicate);
        assert_eq!(
            session.stats(),
            IngestStats { accepted: 1, duplicates: 1, malformed: 0 }
        );
    }
    
    #[test]
    fn test_last_write_wins() {
        let session = Session::new();
        let mut second = SAMPLE;
        second[3] = 55;
        
        session.ingest(&SAMPLE).unwrap();
        session.ingest(&second).unwrap();
        assert_eq!(session.snapshot().unwrap().angle(), 55);
        
        // Going back to earlier bytes is still a change
        session.ingest(&SAMPLE).unwrap();
        assert_eq!(session.snapshot().unwrap().angle(), 30);
        assert_eq!(session.stats().accepted, 3);
    }
    
    #[test]
    fn test_malformed_notification_keeps_state() {
        let session = Session::new();
        session.ingest(&SAMPLE).unwrap();
        
        let result = session.ingest(&SAMPLE[..4]);
        assert_eq!(result, Err(Error::MalformedFrame { expected: 10, actual: 4 }));
        assert_eq!(session.snapshot().unwrap().battery(), 80);
        assert_eq!(session.stats().malformed, 1);
    }
    
    #[test]
    fn test_malformed_before_first_snapshot_stays_idle() {
        let session = Session::new();
        assert!(session.ingest(&[1, 2, 3]).is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }
    
    #[test]
    fn test_toggle_output_resets_dedup() {
        let session = Session::new();
        session.ingest(&SAMPLE).unwrap();
        
        assert!(session.toggle_output());
        assert!(session.output_enabled());
        
        let image = RegisterImage::decode(&SAMPLE).unwrap();
        assert_eq!(session.ingest(&SAMPLE).unwrap(), Ingest::Updated { image, echo: true });
        
        assert!(!session.toggle_output());
        assert!(!session.output_enabled());
    }
    
    #[test]
    fn test_calibration_transitions() {
        let session = Session::new();
        assert!(session.begin_calibration().is_err());
        
        session.ingest(&SAMPLE).unwrap();
        session.begin_calibration().unwrap();
        assert_eq!(session.state(), SessionState::Calibrating);
        assert!(session.is_ready());
        
        // Only one handshake at a time
        assert!(session.begin_calibration().is_err());
        
        session.end_calibration();
        assert_eq!(session.state(), SessionState::Ready);
    }
    
    #[test]
    fn test_terminate() {
        let session = Session::new();
        session.ingest(&SAMPLE).unwrap();
        session.terminate();
        
        assert_eq!(session.state(), SessionState::Terminating);
        assert!(session.begin_calibration().is_err());
        
        // Notifications may still arrive while shutting down
        let mut next = SAMPLE;
        next[2] = 79;
        session.ingest(&next).unwrap();
        assert_eq!(session.state(), SessionState::Terminating);
    }
    
    #[test]
    fn test_close() {
        let session = Session::new();
        session.ingest(&SAMPLE).unwrap();
        session.close();
        
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.is_lost());
        assert_eq!(session.snapshot(), Err(Error::SessionLost));
        assert_eq!(session.ingest(&SAMPLE), Err(Error::SessionLost));
        
        // Terminate never resurrects a closed session
        session.terminate();
        assert_eq!(session.state(), SessionState::Disconnected);
    }
    
    #[test]
    fn test_session_clone() {
        let session1 = Session::new();
        let session2 = session1.clone();
        
        session1.ingest(&SAMPLE).unwrap();
        
        // Both share same state
        assert_eq!(session2.state(), SessionState::Ready);
        assert_eq!(session2.snapshot().unwrap().battery(), 80);
    }
    
    #[tokio::test(start_paused = true)]
    async fn test_lost_wakes_waiter() {
        let session = Session::new();
        let waiter = session.clone();
        
        let handle = tokio::spawn(async move { waiter.lost().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.close();
        
        handle.await.unwrap();
    }
    
    #[tokio::test]
    async fn test_lost_resolves_when_already_closed() {
        let session = Session::new();
        session.close();
        session.lost().await;
    }
}
