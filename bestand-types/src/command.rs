//! Command vocabulary
//!
//! Commands arrive as console text, either in the short form typed at the
//! prompt (`t 45`, `b+`, `pa`) or spelled out (`set-target 45`,
//! `raise-buzz`, `set-buzz-pattern a`).

use std::fmt;
use std::str::FromStr;

use bestand_core::constants::limits::{DELAY_MAX, TARGET_MAX};
use bestand_core::{BuzzPattern, BuzzStrength};

use crate::error::{Error, Result};

/// Help text listing every command
pub const USAGE: &str = "\
h        : help
<enter>  : print state
q        : quit
x        : power off
s        : start/stop notifications
c        : calibrate
t <ang>  : set the target to angle ang (0-90)
t+ / t-  : raise/lower the target by 5
d <secs> : set delay to secs seconds (0-60)
d+ / d-  : raise/lower the delay by 1
b        : toggle buzzer
b+       : raise the buzz strength
b-       : lower the buzz strength
b[0-2]   : set the buzz strength
p[0-f]   : set the buzz pattern";

/// Commands understood by the controller
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Show the current snapshot
    Status,
    Quit,
    PowerOff,
    /// Start/stop echoing notifications
    ToggleOutput,
    Calibrate,
    SetTarget(u8),
    RaiseTarget,
    LowerTarget,
    SetDelay(u8),
    RaiseDelay,
    LowerDelay,
    ToggleBuzz,
    RaiseBuzz,
    LowerBuzz,
    SetBuzzStrength(BuzzStrength),
    SetBuzzPattern(BuzzPattern),
}

impl Command {
    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Status => "status",
            Self::Quit => "quit",
            Self::PowerOff => "power-off",
            Self::ToggleOutput => "toggle-output",
            Self::Calibrate => "calibrate",
            Self::SetTarget(_) => "set-target",
            Self::RaiseTarget => "raise-target",
            Self::LowerTarget => "lower-target",
            Self::SetDelay(_) => "set-delay",
            Self::RaiseDelay => "raise-delay",
            Self::LowerDelay => "lower-delay",
            Self::ToggleBuzz => "toggle-buzz",
            Self::RaiseBuzz => "raise-buzz",
            Self::LowerBuzz => "lower-buzz",
            Self::SetBuzzStrength(_) => "set-buzz-strength",
            Self::SetBuzzPattern(_) => "set-buzz-pattern",
        }
    }
    
    /// Whether the command can run before the first notification
    pub fn needs_snapshot(self) -> bool {
        !matches!(self, Self::Help | Self::Quit)
    }
    
    /// Whether the command ends the session
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Quit | Self::PowerOff)
    }
}

impl FromStr for Command {
    type Err = Error;
    
    fn from_str(input: &str) -> Result<Self> {
        let line = input.trim();
        
        let command = match line {
            "" | "status" => Self::Status,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" => Self::Quit,
            "x" | "power-off" => Self::PowerOff,
            "s" | "toggle-output" => Self::ToggleOutput,
            "c" | "calibrate" => Self::Calibrate,
            "t+" | "raise-target" => Self::RaiseTarget,
            "t-" | "lower-target" => Self::LowerTarget,
            "d+" | "raise-delay" => Self::RaiseDelay,
            "d-" | "lower-delay" => Self::LowerDelay,
            "b" | "toggle-buzz" => Self::ToggleBuzz,
            "b+" | "raise-buzz" => Self::RaiseBuzz,
            "b-" | "lower-buzz" => Self::LowerBuzz,
            "b0" => Self::SetBuzzStrength(BuzzStrength::LOW),
            "b1" => Self::SetBuzzStrength(BuzzStrength::MID),
            "b2" => Self::SetBuzzStrength(BuzzStrength::HIGH),
            _ => return parse_with_argument(line),
        };
        
        Ok(command)
    }
}

fn parse_with_argument(line: &str) -> Result<Command> {
    let unsupported = || Error::UnsupportedCommand(line.to_string());
    
    // Short pattern form: a single hex digit glued to `p`
    if let Some(digit) = line.strip_prefix('p') {
        if digit.len() == 1 {
            return parse_pattern("set-buzz-pattern", digit);
        }
    }
    
    let mut words = line.split_whitespace();
    let (Some(word), Some(arg), None) = (words.next(), words.next(), words.next()) else {
        return Err(unsupported());
    };
    
    match word {
        "t" | "set-target" => {
            let value = parse_int("set-target", arg, false)?;
            Ok(Command::SetTarget(clamp(value, TARGET_MAX)))
        }
        "d" | "set-delay" => {
            let value = parse_int("set-delay", arg, true)?;
            Ok(Command::SetDelay(clamp(value, DELAY_MAX)))
        }
        "set-buzz-strength" => match arg {
            "0" => Ok(Command::SetBuzzStrength(BuzzStrength::LOW)),
            "1" => Ok(Command::SetBuzzStrength(BuzzStrength::MID)),
            "2" => Ok(Command::SetBuzzStrength(BuzzStrength::HIGH)),
            _ => Err(invalid("set-buzz-strength", arg)),
        },
        "set-buzz-pattern" => parse_pattern("set-buzz-pattern", arg),
        _ => Err(unsupported()),
    }
}

fn parse_pattern(command: &'static str, arg: &str) -> Result<Command> {
    let value = u8::from_str_radix(arg, 16).map_err(|_| invalid(command, arg))?;
    let pattern = BuzzPattern::new(value).map_err(|_| invalid(command, arg))?;
    Ok(Command::SetBuzzPattern(pattern))
}

/// Parse a signed integer, optionally accepting `0x`/`0o`/`0b` prefixes
fn parse_int(command: &'static str, arg: &str, prefixed: bool) -> Result<i64> {
    let (negative, digits) = match arg.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, arg.strip_prefix('+').unwrap_or(arg)),
    };
    
    let (radix, digits) = if prefixed {
        match digits.get(..2) {
            Some("0x") | Some("0X") => (16, &digits[2..]),
            Some("0o") | Some("0O") => (8, &digits[2..]),
            Some("0b") | Some("0B") => (2, &digits[2..]),
            _ => (10, digits),
        }
    } else {
        (10, digits)
    };
    
    // from_str_radix accepts its own sign, which must not appear twice
    if digits.starts_with(['+', '-']) {
        return Err(invalid(command, arg));
    }
    
    let magnitude = i64::from_str_radix(digits, radix).map_err(|_| invalid(command, arg))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Clamp into `0..=max` without wrapping
fn clamp(value: i64, max: u8) -> u8 {
    value.clamp(0, i64::from(max)) as u8
}

fn invalid(command: &'static str, value: &str) -> Error {
    Error::InvalidArgument {
        command,
        value: value.to_string(),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetTarget(value) | Self::SetDelay(value) => {
                write!(f, "{} {}", self.name(), value)
            }
            Self::SetBuzzStrength(strength) => write!(f, "{} {}", self.name(), strength),
            Self::SetBuzzPattern(pattern) => write!(f, "{} {}", self.name(), pattern),
            _ => f.write_str(self.name()),
        }
    }
}
