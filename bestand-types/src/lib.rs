//! Type definitions for bestand

pub mod command;
pub mod device_info;
pub mod error;

pub use command::{Command, USAGE};
pub use device_info::DeviceInfo;
pub use error::{Error, Result};
