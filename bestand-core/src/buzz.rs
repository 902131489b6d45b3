//! Buzz configuration byte (offset 5)
//!
//! ```text
//! ┌──────────────┬──────────────┐
//! │  bits 7..4   │  bits 3..0   │
//! │  strength    │  pattern     │
//! └──────────────┴──────────────┘
//! ```
//!
//! The firmware stores strength with the low and mid codes swapped:
//!
//! | stored | logical |
//! |--------|---------|
//! | 0      | 1 (mid) |
//! | 1      | 0 (low) |
//! | 2      | 2 (high)|
//! | n      | n       |
//!
//! This is reproduced exactly; devices in the field depend on it.

use std::fmt;

use crate::error::{Error, Result};

/// Logical buzz strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuzzStrength(u8);

impl BuzzStrength {
    pub const LOW: Self = Self(0);
    pub const MID: Self = Self(1);
    pub const HIGH: Self = Self(2);
    
    /// Create a strength from its logical value
    ///
    /// Values above 15 cannot be represented in the nibble.
    pub fn new(value: u8) -> Result<Self> {
        if value > 0x0F {
            return Err(Error::NibbleOutOfRange(value));
        }
        Ok(Self(value))
    }
    
    /// Logical value (0 = low, 1 = mid, 2 = high)
    pub fn value(self) -> u8 {
        self.0
    }
    
    /// Decode the stored high nibble
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0F {
            0 => Self::MID,
            1 => Self::LOW,
            other => Self(other),
        }
    }
    
    /// Stored high nibble for this strength
    pub fn to_nibble(self) -> u8 {
        match self.0 {
            0 => 1,
            1 => 0,
            other => other,
        }
    }
    
    /// One step stronger, saturating at high
    pub fn raised(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::HIGH.0))
    }
    
    /// One step weaker, saturating at low
    pub fn lowered(self) -> Self {
        Self(self.0.saturating_sub(1).min(Self::HIGH.0))
    }
}

impl fmt::Display for BuzzStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Buzz pattern, a single hex nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuzzPattern(u8);

impl BuzzPattern {
    pub fn new(value: u8) -> Result<Self> {
        if value > 0x0F {
            return Err(Error::NibbleOutOfRange(value));
        }
        Ok(Self(value))
    }
    
    pub(crate) fn from_nibble(nibble: u8) -> Self {
        Self(nibble & 0x0F)
    }
    
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for BuzzPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_strength_remap() {
        assert_eq!(BuzzStrength::from_nibble(0), BuzzStrength::MID);
        assert_eq!(BuzzStrength::from_nibble(1), BuzzStrength::LOW);
        assert_eq!(BuzzStrength::from_nibble(2), BuzzStrength::HIGH);
        
        assert_eq!(BuzzStrength::LOW.to_nibble(), 1);
        assert_eq!(BuzzStrength::MID.to_nibble(), 0);
        assert_eq!(BuzzStrength::HIGH.to_nibble(), 2);
    }
    
    #[test]
    fn test_strength_passthrough() {
        for nibble in 3..=15 {
            let strength = BuzzStrength::from_nibble(nibble);
            assert_eq!(strength.value(), nibble);
            assert_eq!(strength.to_nibble(), nibble);
        }
    }
    
    #[test]
    fn test_strength_steps() {
        assert_eq!(BuzzStrength::LOW.raised(), BuzzStrength::MID);
        assert_eq!(BuzzStrength::HIGH.raised(), BuzzStrength::HIGH);
        assert_eq!(BuzzStrength::LOW.lowered(), BuzzStrength::LOW);
        assert_eq!(BuzzStrength::HIGH.lowered(), BuzzStrength::MID);
        
        // Out-of-band firmware values fold back into the 0..=2 range
        let odd = BuzzStrength::from_nibble(7);
        assert_eq!(odd.raised(), BuzzStrength::HIGH);
        assert_eq!(odd.lowered(), BuzzStrength::HIGH);
    }
    
    #[test]
    fn test_nibble_range() {
        assert!(BuzzStrength::new(15).is_ok());
        assert_eq!(BuzzStrength::new(16), Err(Error::NibbleOutOfRange(16)));
        assert!(BuzzPattern::new(0x0F).is_ok());
        assert_eq!(BuzzPattern::new(0x10), Err(Error::NibbleOutOfRange(0x10)));
    }
    
    #[test]
    fn test_pattern_display_is_hex() {
        assert_eq!(BuzzPattern::new(11).unwrap().to_string(), "b");
    }
}
