//! Bestand register image and encoding/decoding

use bytes::{Buf, BufMut, Bytes};
use std::fmt;

use crate::{
    buzz::{BuzzPattern, BuzzStrength},
    error::{Error, Result},
    flags::{ControlFlags, StatusFlags},
    Frame, FRAME_LEN,
};

/// Snapshot of the device register
///
/// # Frame Structure
///
/// ```text
/// ┌──────┬──────┬──────┬──────┬────────┬──────┬───────┬────────┬─────────┬─────────┐
/// │ tag0 │ tag1 │ batt │ ang  │ target │ buzz │ delay │ status │ control │ counter │
/// │  0   │  1   │  2   │  3   │   4    │  5   │   6   │   7    │    8    │    9    │
/// └──────┴──────┴──────┴──────┴────────┴──────┴───────┴────────┴─────────┴─────────┘
/// ```
///
/// Every field is a single unsigned byte. The tag bytes are opaque and are
/// written back untouched. The counter is reported by the device but must be
/// zero for a write to be accepted, so [`RegisterImage::encode`] always clears
/// it.
///
/// # Examples
///
/// ```
/// use bestand_core::RegisterImage;
///
/// let raw = [0x0a, 0x07, 80, 30, 45, 0x10, 10, 0x00, 0x00, 0x03];
/// let image = RegisterImage::decode(&raw).unwrap();
/// assert_eq!(image.battery(), 80);
///
/// let encoded = image.encode();
/// assert_eq!(encoded[9], 0);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RegisterImage {
    tag: [u8; 2],
    battery: u8,
    angle: u8,
    target: u8,
    buzz: u8,
    delay: u8,
    status: StatusFlags,
    control: ControlFlags,
    counter: u8,
}

impl RegisterImage {
    /// Decode a notification buffer
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedFrame`] unless the buffer is exactly
    /// [`FRAME_LEN`] bytes long.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() != FRAME_LEN {
            return Err(Error::MalformedFrame {
                expected: FRAME_LEN,
                actual: buf.len(),
            });
        }
        
        Ok(Self {
            tag: [buf.get_u8(), buf.get_u8()],
            battery: buf.get_u8(),
            angle: buf.get_u8(),
            target: buf.get_u8(),
            buzz: buf.get_u8(),
            delay: buf.get_u8(),
            status: StatusFlags::from_bits_retain(buf.get_u8()),
            control: ControlFlags::from_bits_retain(buf.get_u8()),
            counter: buf.get_u8(),
        })
    }
    
    /// Encode for transmission
    ///
    /// The counter byte is always written as zero.
    pub fn encode(&self) -> Frame {
        let mut frame = [0u8; FRAME_LEN];
        let mut buf = &mut frame[..];
        
        buf.put_slice(&self.tag);
        buf.put_u8(self.battery);
        buf.put_u8(self.angle);
        buf.put_u8(self.target);
        buf.put_u8(self.buzz);
        buf.put_u8(self.delay);
        buf.put_u8(self.status.bits());
        buf.put_u8(self.control.bits());
        buf.put_u8(0);
        
        frame
    }
    
    /// Encode into a shareable buffer
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.encode())
    }
    
    /// Opaque firmware/protocol tag (bytes 0-1)
    pub fn tag(&self) -> [u8; 2] {
        self.tag
    }
    
    /// Battery charge in percent
    pub fn battery(&self) -> u8 {
        self.battery
    }
    
    /// Measured angle in degrees
    pub fn angle(&self) -> u8 {
        self.angle
    }
    
    /// Angle above which the device buzzes
    pub fn target(&self) -> u8 {
        self.target
    }
    
    pub fn set_target(&mut self, target: u8) {
        self.target = target;
    }
    
    /// Seconds of bad posture before buzzing
    pub fn delay(&self) -> u8 {
        self.delay
    }
    
    pub fn set_delay(&mut self, delay: u8) {
        self.delay = delay;
    }
    
    pub fn buzz_strength(&self) -> BuzzStrength {
        BuzzStrength::from_nibble(self.buzz >> 4)
    }
    
    /// Replace the strength nibble, keeping the pattern
    pub fn set_buzz_strength(&mut self, strength: BuzzStrength) {
        self.buzz = (strength.to_nibble() << 4) | (self.buzz & 0x0F);
    }
    
    pub fn buzz_pattern(&self) -> BuzzPattern {
        BuzzPattern::from_nibble(self.buzz)
    }
    
    /// Replace the pattern nibble, keeping the strength
    ///
    /// # Errors
    ///
    /// Values above `0xF` are rejected with [`Error::NibbleOutOfRange`] and
    /// leave the image unchanged.
    pub fn set_buzz_pattern(&mut self, pattern: u8) -> Result<()> {
        self.set_pattern(BuzzPattern::new(pattern)?);
        Ok(())
    }
    
    pub fn set_pattern(&mut self, pattern: BuzzPattern) {
        self.buzz = (self.buzz & 0xF0) | pattern.value();
    }
    
    pub fn status(&self) -> StatusFlags {
        self.status
    }
    
    pub fn control(&self) -> ControlFlags {
        self.control
    }
    
    /// Sequence counter as last reported by the device
    pub fn counter(&self) -> u8 {
        self.counter
    }
    
    /// Whether the device reports vibration as enabled
    pub fn is_vibrating(&self) -> bool {
        self.status.contains(StatusFlags::VIBRATING)
    }
    
    /// Request vibration on or off
    ///
    /// The status bit is mirrored so the image stays self-consistent until
    /// the device reports back; the device remains authoritative.
    pub fn set_vibration(&mut self, on: bool) {
        if on {
            self.control.remove(ControlFlags::VIBRATION_OFF);
            self.control.insert(ControlFlags::VIBRATION_ON);
        } else {
            self.control.remove(ControlFlags::VIBRATION_ON);
            self.control.insert(ControlFlags::VIBRATION_OFF);
        }
        self.status.set(StatusFlags::VIBRATING, on);
    }
    
    /// Flip vibration based on the reported status
    pub fn toggle_vibration(&mut self) {
        self.set_vibration(!self.is_vibrating());
    }
    
    /// Whether the device reports calibration in progress
    pub fn is_calibrating(&self) -> bool {
        self.status.contains(StatusFlags::CALIBRATING)
    }
    
    /// Set or clear the calibration request bit
    pub fn set_calibrating(&mut self, calibrating: bool) {
        self.control.set(ControlFlags::CALIBRATE, calibrating);
    }
    
    /// Whether this image carries a calibration request
    pub fn is_calibration_requested(&self) -> bool {
        self.control.contains(ControlFlags::CALIBRATE)
    }
    
    /// Request power-off, leaving other requests in place
    pub fn power_off(&mut self) {
        self.control.insert(ControlFlags::POWER_OFF);
    }
    
    pub fn is_power_off_requested(&self) -> bool {
        self.control.contains(ControlFlags::POWER_OFF)
    }
}

impl TryFrom<&[u8]> for RegisterImage {
    type Error = Error;
    
    fn try_from(buf: &[u8]) -> Result<Self> {
        Self::decode(buf)
    }
}

impl From<RegisterImage> for Frame {
    fn from(image: RegisterImage) -> Frame {
        image.encode()
    }
}

impl fmt::Debug for RegisterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterImage")
            .field("tag", &hex::encode(self.tag))
            .field("battery", &self.battery)
            .field("angle", &self.angle)
            .field("target", &self.target)
            .field("buzz", &format!("0x{:02X}", self.buzz))
            .field("delay", &self.delay)
            .field("status", &format!("0x{:02X}", self.status.bits()))
            .field("control", &format!("0x{:02X}", self.control.bits()))
            .field("counter", &self.counter)
            .finish()
    }
}

impl fmt::Display for RegisterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batt {:3}%  {:02}/{:02}  delay {:2}  buzz {} buzz_str {} buzz_pat {} status {:02x}",
            self.battery,
            self.angle,
            self.target,
            self.delay,
            if self.is_vibrating() { "on " } else { "off" },
            self.buzz_strength(),
            self.buzz_pattern(),
            self.status.bits()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    
    const SAMPLE: Frame = [0x0a, 0x07, 80, 30, 45, 0x10, 10, 0x00, 0x00, 0x00];
    
    #[test]
    fn test_decode_sample() {
        let image = RegisterImage::decode(&SAMPLE).unwrap();
        
        assert_eq!(image.tag(), [0x0a, 0x07]);
        assert_eq!(image.battery(), 80);
        assert_eq!(image.angle(), 30);
        assert_eq!(image.target(), 45);
        assert_eq!(image.buzz_strength(), BuzzStrength::LOW);
        assert_eq!(image.buzz_strength().value(), 0);
        assert_eq!(image.buzz_pattern().value(), 0);
        assert_eq!(image.delay(), 10);
        assert!(!image.is_calibrating());
        assert!(!image.is_vibrating());
    }
    
    #[test]
    fn test_decode_stored_zero_is_mid() {
        let mut raw = SAMPLE;
        raw[5] = 0x03;
        let image = RegisterImage::decode(&raw).unwrap();
        
        assert_eq!(image.buzz_strength(), BuzzStrength::MID);
        assert_eq!(image.buzz_pattern().value(), 3);
    }
    
    #[test]
    fn test_decode_wrong_length() {
        assert_eq!(
            RegisterImage::decode(&SAMPLE[..9]),
            Err(Error::MalformedFrame { expected: 10, actual: 9 })
        );
        assert_eq!(
            RegisterImage::decode(&[0u8; 11]),
            Err(Error::MalformedFrame { expected: 10, actual: 11 })
        );
        assert!(RegisterImage::decode(&[]).is_err());
    }
    
    #[test]
    fn test_encode_clears_counter() {
        let mut raw = SAMPLE;
        raw[9] = 0x7F;
        let image = RegisterImage::decode(&raw).unwrap();
        assert_eq!(image.counter(), 0x7F);
        
        let encoded = image.encode();
        assert_eq!(encoded[9], 0);
        assert_eq!(encoded[..9], raw[..9]);
    }
    
    #[test]
    fn test_toggle_vibration_on() {
        let mut image = RegisterImage::decode(&SAMPLE).unwrap();
        image.toggle_vibration();
        
        assert!(image.is_vibrating());
        let encoded = image.encode();
        assert_eq!(encoded[8], 0x08);
        assert_eq!(encoded[7], 0x04);
        assert_eq!(encoded[9], 0);
    }
    
    #[test]
    fn test_toggle_vibration_twice_restores_bits() {
        let mut raw = SAMPLE;
        raw[7] = 0x04;
        raw[8] = 0x08;
        let original = RegisterImage::decode(&raw).unwrap();
        
        let mut image = original;
        image.toggle_vibration();
        assert_eq!(image.control(), ControlFlags::VIBRATION_OFF);
        assert!(!image.is_vibrating());
        
        image.toggle_vibration();
        assert_eq!(image.control(), original.control());
        assert_eq!(image.status(), original.status());
    }
    
    #[test]
    fn test_vibration_keeps_other_control_bits() {
        let mut image = RegisterImage::decode(&SAMPLE).unwrap();
        image.power_off();
        image.set_vibration(true);
        
        assert!(image.is_power_off_requested());
        assert!(image.control().contains(ControlFlags::VIBRATION_ON));
    }
    
    #[test]
    fn test_calibration_request_bit() {
        let mut raw = SAMPLE;
        raw[8] = 0x08;
        let mut image = RegisterImage::decode(&raw).unwrap();
        
        image.set_calibrating(true);
        assert_eq!(image.encode()[8], 0x09);
        // Request side only; status is the device's business
        assert!(!image.is_calibrating());
        
        image.set_calibrating(false);
        assert_eq!(image.encode()[8], 0x08);
    }
    
    #[test]
    fn test_calibrating_status_is_read_side() {
        let mut raw = SAMPLE;
        raw[7] = 0x01;
        let image = RegisterImage::decode(&raw).unwrap();
        
        assert!(image.is_calibrating());
        assert!(!image.is_calibration_requested());
    }
    
    #[test]
    fn test_power_off_is_additive() {
        let mut raw = SAMPLE;
        raw[8] = 0x09;
        let mut image = RegisterImage::decode(&raw).unwrap();
        image.power_off();
        
        assert_eq!(image.encode()[8], 0x49);
    }
    
    #[test]
    fn test_buzz_strength_keeps_pattern() {
        let mut raw = SAMPLE;
        raw[5] = 0x1C;
        let mut image = RegisterImage::decode(&raw).unwrap();
        
        image.set_buzz_strength(BuzzStrength::HIGH);
        assert_eq!(image.encode()[5], 0x2C);
        
        image.set_buzz_strength(BuzzStrength::MID);
        assert_eq!(image.encode()[5], 0x0C);
    }
    
    #[test]
    fn test_buzz_pattern_keeps_strength() {
        let mut image = RegisterImage::decode(&SAMPLE).unwrap();
        
        image.set_buzz_pattern(0xA).unwrap();
        assert_eq!(image.encode()[5], 0x1A);
        assert_eq!(image.buzz_strength(), BuzzStrength::LOW);
    }
    
    #[test]
    fn test_buzz_pattern_out_of_range_rejected() {
        let mut image = RegisterImage::decode(&SAMPLE).unwrap();
        image.set_buzz_pattern(0x5).unwrap();
        
        assert_eq!(image.set_buzz_pattern(0x10), Err(Error::NibbleOutOfRange(0x10)));
        assert_eq!(image.buzz_pattern().value(), 0x5);
    }
    
    #[test]
    fn test_decode_is_deterministic() {
        let a = RegisterImage::decode(&SAMPLE).unwrap();
        let b = RegisterImage::decode(&SAMPLE).unwrap();
        assert_eq!(a, b);
    }
    
    #[test]
    fn test_display() {
        let mut raw = SAMPLE;
        raw[7] = 0x04;
        let image = RegisterImage::decode(&raw).unwrap();
        
        assert_eq!(
            image.to_string(),
            "batt  80%  30/45  delay 10  buzz on  buzz_str 0 buzz_pat 0 status 04"
        );
    }
    
    proptest! {
        #[test]
        fn prop_round_trip_clears_only_counter(raw in any::<[u8; 10]>()) {
            let encoded = RegisterImage::decode(&raw).unwrap().encode();
            
            let mut expected = raw;
            expected[9] = 0;
            prop_assert_eq!(encoded, expected);
        }
        
        #[test]
        fn prop_strength_identity_above_two(nibble in 3u8..=15, pattern in 0u8..=15) {
            let mut raw = SAMPLE;
            raw[5] = (nibble << 4) | pattern;
            let image = RegisterImage::decode(&raw).unwrap();
            
            prop_assert_eq!(image.buzz_strength().value(), nibble);
            
            let mut copy = image;
            copy.set_buzz_strength(image.buzz_strength());
            prop_assert_eq!(copy.encode()[5], raw[5]);
        }
    }
}
