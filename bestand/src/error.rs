//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] bestand_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] bestand_transport::Error),
    
    #[error("Command error: {0}")]
    Types(#[from] bestand_types::Error),
    
    #[error("Session terminated - no further writes")]
    Terminated,
}

impl Error {
    /// The device link is gone; the session cannot continue
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::Core(bestand_core::Error::SessionLost))
    }
    
    /// No notification has arrived yet; wait or reconnect
    pub fn is_no_snapshot(&self) -> bool {
        matches!(self, Self::Core(bestand_core::Error::NoSnapshotYet))
    }
}
