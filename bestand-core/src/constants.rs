//! Protocol constants

use std::time::Duration;

/// Name the device advertises while in pairing mode
pub const DEVICE_NAME: &str = "Bestand";

/// Advertised service (HID over GATT)
pub const SERVICE_UUID_16: u16 = 0x1812;

/// Characteristic carrying the register image (notify + write)
pub const REGISTER_CHAR_UUID: &str = "00002a19-0000-1000-8000-00805f9b34fb";

/// Service-changed characteristic
pub const SERVICE_CHANGED_UUID: &str = "00002a05-0000-1000-8000-00805f9b34fb";

/// Register byte offsets
pub mod offset {
    pub const TAG_0: usize = 0;
    pub const TAG_1: usize = 1;
    pub const BATTERY: usize = 2;
    pub const ANGLE: usize = 3;
    pub const TARGET: usize = 4;
    pub const BUZZ: usize = 5;
    pub const DELAY: usize = 6;
    pub const STATUS: usize = 7;
    pub const CONTROL: usize = 8;
    pub const COUNTER: usize = 9;
}

/// Limits enforced by the command surface
pub mod limits {
    /// Largest meaningful angle (degrees)
    pub const TARGET_MAX: u8 = 90;
    
    /// Largest delay offered to the user (seconds)
    pub const DELAY_MAX: u8 = 60;
    
    /// Target nudge step (degrees)
    pub const TARGET_STEP: u8 = 5;
    
    /// Delay nudge step (seconds)
    pub const DELAY_STEP: u8 = 1;
}

/// Calibration handshake defaults
pub mod calibration {
    use super::Duration;
    
    /// Poll rounds before calibration is assumed complete
    pub const MAX_ROUNDS: u32 = 6;
    
    /// Sleep between polls
    pub const ROUND_INTERVAL: Duration = Duration::from_millis(500);
    
    /// Gap between the two identical calibration writes
    pub const RESEND_DELAY: Duration = Duration::from_millis(100);
}
