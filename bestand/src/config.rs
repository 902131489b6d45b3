//! Controller configuration

use std::time::Duration;

use bestand_core::constants::calibration;

/// Timing of the calibration handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationPolicy {
    /// Poll rounds before calibration is assumed complete
    pub max_rounds: u32,
    
    /// Sleep before each poll
    pub round_interval: Duration,
    
    /// Gap between the two calibration writes
    pub resend_delay: Duration,
}

impl CalibrationPolicy {
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }
    
    pub fn with_round_interval(mut self, interval: Duration) -> Self {
        self.round_interval = interval;
        self
    }
    
    pub fn with_resend_delay(mut self, delay: Duration) -> Self {
        self.resend_delay = delay;
        self
    }
    
    /// Longest time the poll loop can take, saturating at `Duration::MAX`
    pub fn max_wait(&self) -> Duration {
        self.round_interval
            .checked_mul(self.max_rounds)
            .and_then(|wait| wait.checked_add(self.resend_delay))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            max_rounds: calibration::MAX_ROUNDS,
            round_interval: calibration::ROUND_INTERVAL,
            resend_delay: calibration::RESEND_DELAY,
        }
    }
}
