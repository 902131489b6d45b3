//! Pure command application
//!
//! Turns a command and the last-known snapshot into the image to write.
//! Nothing here touches the link; the controller decides when to send.
//! Quit, output mode and calibration act on the session rather than the
//! image and are left to the controller.

use bestand_core::constants::limits::{DELAY_MAX, DELAY_STEP, TARGET_MAX, TARGET_STEP};
use bestand_core::{Frame, RegisterImage};
use bestand_types::{Command, USAGE};

/// Effect of one command on a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Working copy after the command
    pub image: RegisterImage,
    
    /// Bytes to transmit, if the command writes
    pub frame: Option<Frame>,
    
    /// Text for the user
    pub message: String,
    
    /// False once the session should end
    pub keep_going: bool,
}

impl Applied {
    fn read_only(image: RegisterImage, message: impl Into<String>) -> Self {
        Self {
            image,
            frame: None,
            message: message.into(),
            keep_going: true,
        }
    }
    
    fn write(image: RegisterImage, message: impl Into<String>) -> Self {
        Self {
            image,
            frame: Some(image.encode()),
            message: message.into(),
            keep_going: true,
        }
    }
}

/// Apply `command` to a copy of `snapshot`
///
/// Returns `None` for commands that are not an image change.
pub fn apply(command: Command, snapshot: &RegisterImage) -> Option<Applied> {
    let mut image = *snapshot;
    
    let applied = match command {
        Command::Help => Applied::read_only(image, USAGE),
        Command::Status => Applied::read_only(image, format!("-- {} --", image)),
        Command::Quit | Command::ToggleOutput | Command::Calibrate => return None,
        Command::PowerOff => {
            image.power_off();
            Applied {
                keep_going: false,
                ..Applied::write(image, "Turning off.")
            }
        }
        Command::SetTarget(target) => set_target(image, target),
        Command::RaiseTarget => {
            let target = image.target().saturating_add(TARGET_STEP).min(TARGET_MAX);
            set_target(image, target)
        }
        Command::LowerTarget => {
            let target = image.target().saturating_sub(TARGET_STEP).min(TARGET_MAX);
            set_target(image, target)
        }
        Command::SetDelay(delay) => set_delay(image, delay),
        Command::RaiseDelay => {
            let delay = image.delay().saturating_add(DELAY_STEP).min(DELAY_MAX);
            set_delay(image, delay)
        }
        Command::LowerDelay => {
            let delay = image.delay().saturating_sub(DELAY_STEP).min(DELAY_MAX);
            set_delay(image, delay)
        }
        Command::ToggleBuzz => {
            image.toggle_vibration();
            let state = if image.is_vibrating() { "on" } else { "off" };
            Applied::write(image, format!("Setting buzzer to {}.", state))
        }
        Command::RaiseBuzz => {
            let strength = image.buzz_strength().raised();
            set_strength(image, strength)
        }
        Command::LowerBuzz => {
            let strength = image.buzz_strength().lowered();
            set_strength(image, strength)
        }
        Command::SetBuzzStrength(strength) => set_strength(image, strength),
        Command::SetBuzzPattern(pattern) => {
            image.set_pattern(pattern);
            Applied::write(image, format!("Setting buzz pattern to {}.", pattern))
        }
    };
    
    Some(applied)
}

fn set_target(mut image: RegisterImage, target: u8) -> Applied {
    image.set_target(target);
    Applied::write(image, format!("Setting target to {}.", target))
}

fn set_delay(mut image: RegisterImage, delay: u8) -> Applied {
    image.set_delay(delay);
    Applied::write(image, format!("Setting delay to {}.", delay))
}

fn set_strength(mut image: RegisterImage, strength: bestand_core::BuzzStrength) -> Applied {
    image.set_buzz_strength(strength);
    Applied::write(image, format!("Setting buzz strength to {}.", strength))
}
