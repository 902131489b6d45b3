//! Session controller
//!
//! Executes commands against the last-known snapshot and writes the
//! result back to the device. Every write is a full register image with
//! the counter byte cleared; the device answers with a fresh notification,
//! which becomes the next snapshot.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use bestand_core::constants::DEVICE_NAME;
use bestand_core::{Frame, RegisterImage, Session, SessionState};
use bestand_transport::Transport;
use bestand_types::{Command, DeviceInfo, USAGE};

use crate::apply::apply;
use crate::config::CalibrationPolicy;
use crate::error::{Error, Result};

const QUIT_MESSAGE: &str = "Quitting.";

/// Reply to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text for the user
    pub message: String,
    
    /// False once the session should end
    pub keep_going: bool,
}

impl Reply {
    fn new(message: impl Into<String>, keep_going: bool) -> Self {
        Self {
            message: message.into(),
            keep_going,
        }
    }
}

/// How the calibration handshake ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationOutcome {
    /// Device cleared its calibrating bit during this poll round
    Confirmed { rounds: u32 },
    
    /// Polling ran out; calibration is taken as done anyway
    AssumedComplete { rounds: u32 },
}

impl CalibrationOutcome {
    pub fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

impl fmt::Display for CalibrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed { rounds } => {
                write!(f, "Done calibrating (confirmed after {} rounds).", rounds)
            }
            Self::AssumedComplete { rounds } => {
                write!(f, "Done calibrating (unconfirmed after {} rounds).", rounds)
            }
        }
    }
}

/// Bestand session controller
///
/// Commands take `&mut self`, so one controller runs at most one command
/// at a time. Share it between tasks behind a `tokio::sync::Mutex`.
///
/// # Examples
///
/// ```no_run
/// use bestand::{Session, SessionController};
/// use bestand::transport::MockTransport;
///
/// #[tokio::main]
/// async fn main() -> bestand::Result<()> {
///     let session = Session::new();
///     let mut controller = SessionController::new(MockTransport::new(), session.clone());
///
///     // The link layer feeds notifications into the session
///     session.ingest(&[0x0a, 0x07, 80, 30, 45, 0x10, 10, 0, 0, 0])?;
///
///     let reply = controller.handle_line("t 40").await?;
///     println!("{}", reply.message);
///     Ok(())
/// }
/// ```
pub struct SessionController {
    transport: Box<dyn Transport>,
    session: Session,
    policy: CalibrationPolicy,
}

impl SessionController {
    /// Create a controller writing through `transport`
    pub fn new(transport: impl Transport + 'static, session: Session) -> Self {
        Self {
            transport: Box::new(transport),
            session,
            policy: CalibrationPolicy::default(),
        }
    }
    
    /// Set calibration timing
    pub fn with_calibration_policy(mut self, policy: CalibrationPolicy) -> Self {
        self.policy = policy;
        self
    }
    
    /// Shared session handle
    pub fn session(&self) -> &Session {
        &self.session
    }
    
    pub fn policy(&self) -> &CalibrationPolicy {
        &self.policy
    }
    
    /// Check if the link is up
    pub fn is_connected(&self) -> bool {
        !self.session.is_lost() && self.transport.is_connected()
    }
    
    /// Identity of the connected device
    pub fn device_info(&self) -> Result<DeviceInfo> {
        let snapshot = self.session.snapshot()?;
        
        Ok(DeviceInfo::new(
            DEVICE_NAME,
            self.transport.remote_addr(),
            snapshot.tag(),
        ))
    }
    
    /// Parse and execute one line of console input
    ///
    /// Unrecognised input is not an error: nothing is sent and the reply
    /// carries a usage hint.
    pub async fn handle_line(&mut self, line: &str) -> Result<Reply> {
        match line.parse::<Command>() {
            Ok(command) => self.execute(command).await,
            Err(e) => {
                debug!("Ignoring input: {}", e);
                Ok(Reply::new(format!("{} - type 'h' for help.", e), true))
            }
        }
    }
    
    /// Execute a command
    ///
    /// # Errors
    ///
    /// - `NoSnapshotYet` if no notification has arrived (except help/quit)
    /// - `InvalidSessionState` for a write while a calibration is running
    /// - `SessionLost` if the link went away
    /// - `Terminated` after quit or power-off
    pub async fn execute(&mut self, command: Command) -> Result<Reply> {
        if command == Command::Help {
            return Ok(Reply::new(USAGE, true));
        }
        
        self.ensure_open()?;
        
        if !command.needs_snapshot() {
            info!("Quitting");
            self.session.terminate();
            return Ok(Reply::new(QUIT_MESSAGE, false));
        }
        
        let snapshot = self.session.snapshot()?;
        
        match command {
            Command::ToggleOutput => {
                let enabled = self.session.toggle_output();
                let message = if enabled {
                    "Starting notifications."
                } else {
                    "Stopping notifications."
                };
                Ok(Reply::new(message, true))
            }
            Command::Calibrate => {
                let outcome = self.calibrate().await?;
                Ok(Reply::new(outcome.to_string(), true))
            }
            _ => {
                let Some(applied) = apply(command, &snapshot) else {
                    return Err(bestand_types::Error::UnsupportedCommand(command.to_string()).into());
                };
                
                if let Some(frame) = applied.frame {
                    self.ensure_writable()?;
                    info!("{}", command);
                    self.transmit(&frame).await?;
                }
                
                if command.is_terminal() {
                    self.session.terminate();
                }
                
                Ok(Reply::new(applied.message, applied.keep_going))
            }
        }
    }
    
    /// Run the calibration handshake, polling the shared session
    pub async fn calibrate(&mut self) -> Result<CalibrationOutcome> {
        let session = self.session.clone();
        self.calibrate_with(move || session.snapshot()).await
    }
    
    /// Run the calibration handshake with a custom snapshot source
    ///
    /// 1. Send the current snapshot with the calibration request set.
    /// 2. Send the identical frame again after a short pause; the device
    ///    regularly misses the first one.
    /// 3. Up to `max_rounds` times: sleep, then `poll` for the latest
    ///    snapshot and stop as soon as the device clears its calibrating bit.
    /// 4. Send the latest snapshot with the request cleared.
    ///
    /// Running out of rounds is not an error; the outcome says whether the
    /// device confirmed. Losing the link aborts with `SessionLost`.
    pub async fn calibrate_with<P>(&mut self, mut poll: P) -> Result<CalibrationOutcome>
    where
        P: FnMut() -> bestand_core::Result<RegisterImage>,
    {
        self.ensure_writable()?;
        let snapshot = self.session.snapshot()?;
        self.session.begin_calibration()?;
        
        let result = self.run_calibration(snapshot, &mut poll).await;
        
        self.session.end_calibration();
        result
    }
    
    async fn run_calibration<P>(
        &mut self,
        snapshot: RegisterImage,
        poll: &mut P,
    ) -> Result<CalibrationOutcome>
    where
        P: FnMut() -> bestand_core::Result<RegisterImage>,
    {
        let mut request = snapshot;
        request.set_calibrating(true);
        let frame = request.encode();
        
        info!("Calibrating");
        self.transmit(&frame).await?;
        self.pause(self.policy.resend_delay).await?;
        self.transmit(&frame).await?;
        
        let mut latest = request;
        let mut confirmed = None;
        
        for round in 1..=self.policy.max_rounds {
            self.pause(self.policy.round_interval).await?;
            latest = poll()?;
            
            if !latest.is_calibrating() {
                confirmed = Some(round);
                break;
            }
            debug!("Calibrating .. (round {}/{})", round, self.policy.max_rounds);
        }
        
        latest.set_calibrating(false);
        self.transmit(&latest.encode()).await?;
        
        let outcome = match confirmed {
            Some(rounds) => CalibrationOutcome::Confirmed { rounds },
            None => {
                warn!(
                    "Device did not confirm calibration after {} rounds, assuming done",
                    self.policy.max_rounds
                );
                CalibrationOutcome::AssumedComplete {
                    rounds: self.policy.max_rounds,
                }
            }
        };
        
        info!("{}", outcome);
        Ok(outcome)
    }
    
    /// Disconnect from device
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.transport.is_connected() {
            return Ok(());
        }
        
        info!("Disconnecting from {}...", self.transport.remote_addr());
        self.transport.disconnect().await?;
        self.session.close();
        
        Ok(())
    }
    
    // Helper methods
    
    fn ensure_open(&self) -> Result<()> {
        match self.session.state() {
            SessionState::Disconnected => Err(bestand_core::Error::SessionLost.into()),
            SessionState::Terminating => Err(Error::Terminated),
            _ => Ok(()),
        }
    }
    
    /// Writes are refused while any controller on this session calibrates
    fn ensure_writable(&self) -> Result<()> {
        self.ensure_open()?;
        
        if self.session.state() == SessionState::Calibrating {
            return Err(bestand_core::Error::InvalidSessionState(
                "Calibration in progress".into()
            ).into());
        }
        Ok(())
    }
    
    async fn transmit(&mut self, frame: &Frame) -> Result<()> {
        trace!("Sending: {}", hex::encode(frame));
        
        match self.transport.transmit(frame).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_disconnect() => {
                warn!("Link to {} lost: {}", self.transport.remote_addr(), e);
                self.session.close();
                Err(bestand_core::Error::SessionLost.into())
            }
            Err(e) => Err(e.into()),
        }
    }
    
    /// Sleep, waking early with `SessionLost` if the link drops
    async fn pause(&self, duration: Duration) -> Result<()> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.session.lost() => Err(bestand_core::Error::SessionLost.into()),
        }
    }
}
