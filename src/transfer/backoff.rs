use rand::Rng;
use std::time::Duration;

/// Exponential backoff: `base * 2^(attempt - 1)`, capped at `max`, with an
/// optional +/-25% jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
    pub jitter: bool,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter: bool) -> Self {
        Self { base, max, jitter }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self
            .base
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max);

        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let factor = rand::rng().random_range(0.75..=1.25);
        delay.mul_f64(factor).min(self.max)
    }
}
