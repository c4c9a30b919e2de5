//! Backoff policy for failed reversals.

use std::time::Duration;

use rand::Rng;
use warden_common::ReversalConfig;

/// Retry policy with exponential backoff and equal jitter.
///
/// Reversals never give up. After `alert_after` failures an operator alert is
/// raised and retries continue at no more than `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
    /// Number of failures that triggers an alert.
    pub alert_after: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ReversalConfig::default())
    }
}

impl From<&ReversalConfig> for RetryPolicy {
    fn from(config: &ReversalConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
            multiplier: config.multiplier,
            alert_after: config.alert_after_attempts,
        }
    }
}

impl RetryPolicy {
    /// Calculate delay for the given attempt number (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);

        // NaN or negative comes from a multiplier that bypassed config validation
        if !delay_secs.is_finite()
            || delay_secs < 0.0
            || delay_secs >= self.max_delay.as_secs_f64()
        {
            return self.max_delay;
        }

        Duration::from_secs_f64(delay_secs)
    }

    /// Delay for the given attempt with equal jitter applied, in `[delay / 2, delay]`.
    #[must_use]
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        let factor = rand::thread_rng().gen_range(0.5..=1.0);
        delay.mul_f64(factor)
    }

    /// Whether the given failure count is the one that raises the alert.
    #[must_use]
    pub const fn should_alert(&self, failures: u32) -> bool {
        failures == self.alert_after
    }
}
