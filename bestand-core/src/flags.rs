//! Status and control register bits
//!
//! The status byte (offset 7) is what the device reports, the control byte
//! (offset 8) is what we ask it to do next. Undocumented bits are retained
//! as-is in both directions.

use bitflags::bitflags;

bitflags! {
    /// Device-reported status bits (read side)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        /// Calibration still in progress
        const CALIBRATING = 1;
        
        /// Vibration alert enabled
        const VIBRATING = 1 << 2;
    }
}

bitflags! {
    /// Request bits sent to the device (write side)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlFlags: u8 {
        /// Start calibration
        const CALIBRATE = 1;
        
        /// Turn vibration off
        const VIBRATION_OFF = 1 << 2;
        
        /// Turn vibration on
        const VIBRATION_ON = 1 << 3;
        
        /// Power the device off
        const POWER_OFF = 1 << 6;
    }
}
