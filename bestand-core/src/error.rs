//! Error types for bestand-core



/// Result type alias for bestand operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Notification buffer does not have the register length
    #[error("Malformed frame: expected {expected} bytes, got {actual} bytes")]
    MalformedFrame {
        expected: usize,
        actual: usize,
    },
    
    /// No notification has been received yet
    #[error("No register snapshot yet - wait for the device to report")]
    NoSnapshotYet,
    
    /// Link to the device went away
    #[error("Session lost - device disconnected")]
    SessionLost,
    
    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
    
    /// Value does not fit in a hex nibble
    #[error("Value {0} does not fit in a nibble (0-15)")]
    NibbleOutOfRange(u8),
}

impl Error {
    /// Check if error is recoverable (retry might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedFrame { .. }
                | Self::NoSnapshotYet
                | Self::NibbleOutOfRange(_)
        )
    }
    
    /// Check if error requires reconnection
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::SessionLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::NoSnapshotYet.is_recoverable());
        assert!(Error::MalformedFrame { expected: 10, actual: 3 }.is_recoverable());
        assert!(!Error::SessionLost.is_recoverable());
        assert!(Error::SessionLost.requires_reconnect());
        assert!(!Error::NibbleOutOfRange(16).requires_reconnect());
    }

    #[test]
    fn test_error_display() {
        let err = Error::MalformedFrame { expected: 10, actual: 7 };
        assert_eq!(err.to_string(), "Malformed frame: expected 10 bytes, got 7 bytes");
    }
}
