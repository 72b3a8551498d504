//! Service configuration types.

use std::time::Duration;

/// Default interval between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default countdown before an order is reported as timed out.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Configuration for the OTP service.
///
/// Controls the polling cadence and the refund safety check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpServiceConfig {
    /// Countdown while waiting for an SMS.
    pub timeout: Duration,
    /// Interval between status checks.
    pub poll_interval: Duration,
    /// Re-check an order before cancelling it and refuse the refund when an
    /// SMS already arrived.
    pub verify_before_refund: bool,
}

impl Default for OtpServiceConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            verify_before_refund: false,
        }
    }
}

impl OtpServiceConfig {
    /// Create a new builder for OtpServiceConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use genie_otp::OtpServiceConfig;
    /// use std::time::Duration;
    ///
    /// let config = OtpServiceConfig::builder()
    ///     .timeout(Duration::from_secs(120))
    ///     .poll_interval(Duration::from_secs(3))
    ///     .verify_before_refund(true)
    ///     .build();
    ///
    /// assert_eq!(config.timeout, Duration::from_secs(120));
    /// assert!(config.verify_before_refund);
    /// ```
    pub fn builder() -> OtpServiceConfigBuilder {
        OtpServiceConfigBuilder::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_verify_before_refund(mut self, verify: bool) -> Self {
        self.verify_before_refund = verify;
        self
    }

    /// Status checks that fit in the countdown, the one due at the deadline
    /// included.
    pub fn max_polls(&self) -> u32 {
        if self.poll_interval.is_zero() {
            return 0;
        }
        u32::try_from(self.timeout.as_nanos() / self.poll_interval.as_nanos())
            .unwrap_or(u32::MAX)
    }
}

/// Builder for OtpServiceConfig.
#[derive(Debug, Clone, Default)]
pub struct OtpServiceConfigBuilder {
    pub(crate) config: OtpServiceConfig,
}

impl OtpServiceConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default: 180 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Default: 5 seconds
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Default: false
    pub fn verify_before_refund(mut self, verify: bool) -> Self {
        self.config.verify_before_refund = verify;
        self
    }

    pub fn build(self) -> OtpServiceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_default() {
        let config = OtpServiceConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(180));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(!config.verify_before_refund);
        assert_eq!(config.max_polls(), 36);
    }

    #[test]
    fn test_config_builder_default() {
        assert_eq!(OtpServiceConfigBuilder::new().build(), OtpServiceConfig::default());
    }

    #[test]
    fn test_config_with_methods() {
        let config = OtpServiceConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_poll_interval(Duration::from_secs(1))
            .with_verify_before_refund(true);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(config.verify_before_refund);
        assert_eq!(config.max_polls(), 60);
    }

    #[test]
    fn test_zero_interval_has_no_polls() {
        let config = OtpServiceConfig::default().with_poll_interval(Duration::ZERO);
        assert_eq!(config.max_polls(), 0);
    }

    #[test]
    fn test_max_polls_saturates() {
        let config = OtpServiceConfig::default()
            .with_timeout(Duration::MAX)
            .with_poll_interval(Duration::from_nanos(1));
        assert_eq!(config.max_polls(), u32::MAX);
    }
}
