//! Device information structures

use std::fmt;

/// Device information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Advertised name
    pub name: String,
    
    /// Link-layer address
    pub address: String,
    
    /// Opaque firmware tag (register bytes 0-1)
    pub firmware_tag: [u8; 2],
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, address: impl Into<String>, firmware_tag: [u8; 2]) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            firmware_tag,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[{} @ {}, FW: {}]",
            self.name,
            self.address,
            hex::encode(self.firmware_tag)
        )
    }
}
