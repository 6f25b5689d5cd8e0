use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::settings::duration_ms;

/// Capped exponential backoff.
///
/// The delay after the `n`-th attempt (1-based) is
/// `min(base * multiplier^n, cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    #[serde(rename = "base_ms", with = "duration_ms")]
    pub base: Duration,
    pub multiplier: f64,
    #[serde(rename = "cap_ms", with = "duration_ms")]
    pub cap: Duration,
}

impl BackoffPolicy {
    pub const fn new(base: Duration, multiplier: f64, cap: Duration) -> Self {
        Self {
            base,
            multiplier,
            cap,
        }
    }

    /// Delay to wait after `attempt` attempts have been made.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let secs = self.base.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.cap.as_secs_f64() {
            return self.cap;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Check the policy can only grow and is bounded.
    pub fn is_well_formed(&self) -> bool {
        self.multiplier.is_finite() && self.multiplier >= 1.0 && self.cap >= self.base
    }
}
