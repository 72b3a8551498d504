//! Error classification shared across the provider and service layers.

/// Trait for errors that can be classified as transient or permanent.
///
/// Two levels are distinguished:
///
/// 1. **Call-level** (`is_retryable`): repeating the same request for the
///    same order may succeed (network failure, provider hiccup).
/// 2. **Order-level** (`should_retry_operation`): this order is lost, but
///    placing a fresh order might succeed (no free phones right now, order
///    banned by the provider).
///
/// # Examples
///
/// ```rust
/// use genie_otp::RetryableError;
///
/// enum BuyError {
///     Network,
///     NoFreePhones,
///     BadApiKey,
/// }
///
/// impl RetryableError for BuyError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, BuyError::Network)
///     }
///
///     fn should_retry_operation(&self) -> bool {
///         matches!(self, BuyError::Network | BuyError::NoFreePhones)
///     }
/// }
///
/// assert!(!BuyError::BadApiKey.should_retry_operation());
/// ```
pub trait RetryableError {
    /// True if the failed call may succeed when repeated as-is.
    fn is_retryable(&self) -> bool;

    /// True if a new order might succeed.
    ///
    /// Defaults to [`is_retryable`](Self::is_retryable).
    fn should_retry_operation(&self) -> bool {
        self.is_retryable()
    }
}
