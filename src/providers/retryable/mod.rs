//! Retryable provider wrapper.

use super::traits::Provider;
use crate::errors::RetryableError;
use crate::types::{CountrySlug, DialCode, OrderCheck, OrderId, ProductCode, PurchasedNumber};
use crate::utils::retry::RetryConfig;
use backon::Retryable;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Callback invoked before each retry with the error and the upcoming delay.
pub type OnRetryCallback<E> = Arc<dyn Fn(&E, Duration) + Send + Sync>;

/// Wrapper that retries status checks on transient errors.
///
/// Only [`Provider::check_order`] is retried, with exponential backoff, when
/// the error reports `is_retryable()`. Purchases are passed through untouched
/// because repeating one buys a second number; cancellations are passed
/// through so the caller sees the provider's verdict directly.
///
/// # Example
///
/// ```rust,ignore
/// use genie_otp::{RetryConfig, SmsRetryableProvider};
/// use genie_otp::five_sim::{FiveSim, FiveSimProvider};
///
/// let provider = FiveSimProvider::new(FiveSim::with_api_key("key")?);
/// let provider = SmsRetryableProvider::with_config(provider, RetryConfig::default())
///     .with_on_retry(|error, delay| eprintln!("retrying in {delay:?}: {error}"));
/// ```
pub struct SmsRetryableProvider<P: Provider> {
    inner: Arc<P>,
    retry_config: RetryConfig,
    on_retry: Option<OnRetryCallback<P::Error>>,
}

impl<P: Provider> Clone for SmsRetryableProvider<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            retry_config: self.retry_config.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<P: Provider + Debug> Debug for SmsRetryableProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsRetryableProvider")
            .field("inner", &self.inner)
            .field("retry_config", &self.retry_config)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "..."))
            .finish()
    }
}

impl<P: Provider> SmsRetryableProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_config(inner, RetryConfig::default())
    }

    pub fn with_config(inner: P, retry_config: RetryConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            retry_config,
            on_retry: None,
        }
    }

    pub fn with_on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&P::Error, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }
}

impl<P: Provider> Provider for SmsRetryableProvider<P>
where
    P::Error: Debug,
{
    type Error = P::Error;

    async fn buy_number(
        &self,
        country: &CountrySlug,
        operator: &str,
        product: &ProductCode,
    ) -> Result<PurchasedNumber, Self::Error> {
        self.inner.buy_number(country, operator, product).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsRetryableProvider::check_order",
            skip_all,
            fields(order_id = %order_id)
        )
    )]
    async fn check_order(&self, order_id: OrderId) -> Result<OrderCheck, Self::Error> {
        let inner = Arc::clone(&self.inner);
        let on_retry = self.on_retry.clone();
        (|| {
            let inner = Arc::clone(&inner);
            async move { inner.check_order(order_id).await }
        })
        .retry(self.retry_config.build_strategy())
        .when(|err: &Self::Error| err.is_retryable())
        .notify(move |err, duration| {
            if let Some(ref callback) = on_retry {
                callback(err, duration);
            }

            #[cfg(feature = "tracing")]
            debug!(
                error = ?err,
                order_id = %order_id,
                retry_after_secs = %duration.as_secs_f64(),
                "Retrying check_order"
            );
        })
        .await
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<(), Self::Error> {
        self.inner.cancel_order(order_id).await
    }

    fn dial_code(&self, country: &CountrySlug) -> Option<DialCode> {
        self.inner.dial_code(country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum FakeError {
        #[error("connection reset")]
        Transient,
        #[error("order not found")]
        Permanent,
    }

    impl RetryableError for FakeError {
        fn is_retryable(&self) -> bool {
            matches!(self, FakeError::Transient)
        }
    }

    #[derive(Debug, Clone, Default)]
    struct FlakyProvider {
        failures_before_success: usize,
        permanent: bool,
        checks: Arc<AtomicUsize>,
        buys: Arc<AtomicUsize>,
    }

    impl Provider for FlakyProvider {
        type Error = FakeError;

        async fn buy_number(
            &self,
            _country: &CountrySlug,
            _operator: &str,
            _product: &ProductCode,
        ) -> Result<PurchasedNumber, FakeError> {
            self.buys.fetch_add(1, Ordering::SeqCst);
            Err(FakeError::Transient)
        }

        async fn check_order(&self, _order_id: OrderId) -> Result<OrderCheck, FakeError> {
            let n = self.checks.fetch_add(1, Ordering::SeqCst);
            if self.permanent {
                return Err(FakeError::Permanent);
            }
            if n < self.failures_before_success {
                Err(FakeError::Transient)
            } else {
                Ok(OrderCheck::pending())
            }
        }

        async fn cancel_order(&self, _order_id: OrderId) -> Result<(), FakeError> {
            Ok(())
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig::default()
            .with_min_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
    }

    #[tokio::test]
    async fn test_check_order_retries_transient_errors() {
        let inner = FlakyProvider {
            failures_before_success: 2,
            ..Default::default()
        };
        let retries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&retries);
        let provider = SmsRetryableProvider::with_config(inner.clone(), fast())
            .with_on_retry(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let check = provider.check_order(OrderId::new(1)).await.unwrap();

        assert_eq!(check, OrderCheck::pending());
        assert_eq!(inner.checks.load(Ordering::SeqCst), 3);
        assert_eq!(retries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_check_order_gives_up_on_permanent_error() {
        let inner = FlakyProvider {
            permanent: true,
            ..Default::default()
        };
        let provider = SmsRetryableProvider::with_config(inner.clone(), fast());

        let result = provider.check_order(OrderId::new(1)).await;

        assert!(matches!(result, Err(FakeError::Permanent)));
        assert_eq!(inner.checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_buy_is_never_retried() {
        let inner = FlakyProvider::default();
        let provider = SmsRetryableProvider::with_config(inner.clone(), fast());

        let result = provider
            .buy_number(&CountrySlug::new("pakistan"), "any", &ProductCode::from("whatsapp"))
            .await;

        assert!(result.is_err());
        assert_eq!(inner.buys.load(Ordering::SeqCst), 1);
    }
}
