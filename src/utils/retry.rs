//! Backoff configuration for provider calls that are safe to repeat.

use backon::ExponentialBuilder;
use std::time::Duration;

/// Exponential backoff settings used by
/// [`SmsRetryableProvider`](crate::SmsRetryableProvider).
///
/// The defaults keep the whole retry budget of a status check under the
/// default 5 second poll cadence, so a retried check never overlaps the next
/// scheduled one.
///
/// ```rust
/// use genie_otp::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_min_delay(Duration::from_millis(200))
///     .with_max_retries(4);
/// assert_eq!(config.max_retries, 4);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// First delay (default: 500 ms).
    pub min_delay: Duration,
    /// Upper bound for a single delay (default: 2 s).
    pub max_delay: Duration,
    /// Growth factor between attempts (default: 2.0).
    pub factor: f32,
    /// Retries after the first attempt (default: 2).
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
            max_retries: 2,
        }
    }
}

impl RetryConfig {
    /// No retries at all; every call is attempted once.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Worst-case time spent sleeping between attempts, ignoring jitter.
    pub fn total_delay_budget(&self) -> Duration {
        let mut total = Duration::ZERO;
        let mut delay = self.min_delay;
        for _ in 0..self.max_retries {
            total += delay.min(self.max_delay);
            delay = delay.mul_f32(self.factor);
        }
        total
    }

    pub(crate) fn build_strategy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times(self.max_retries)
    }
}
