//! Provider trait definition.

use crate::errors::RetryableError;
use crate::types::{CountrySlug, DialCode, OrderCheck, OrderId, ProductCode, PurchasedNumber};
use std::error::Error as StdError;
use std::future::Future;

/// Operations required from an SMS-activation provider.
///
/// - Buying a number for a product in a country
/// - Checking an order for received messages
/// - Cancelling an order
///
/// Buying is not idempotent: every successful call reserves (and charges the
/// account for) a new number. Wrappers must never repeat it.
///
/// # Example
///
/// ```rust,ignore
/// use genie_otp::{Provider, OrderCheck, OrderId, PurchasedNumber};
///
/// #[derive(Clone)]
/// struct MyProvider { /* ... */ }
///
/// impl Provider for MyProvider {
///     type Error = MyError;
///
///     async fn buy_number(&self, country: &CountrySlug, operator: &str, product: &ProductCode)
///         -> Result<PurchasedNumber, Self::Error> { /* ... */ }
///
///     async fn check_order(&self, order_id: OrderId) -> Result<OrderCheck, Self::Error> { /* ... */ }
///
///     async fn cancel_order(&self, order_id: OrderId) -> Result<(), Self::Error> { /* ... */ }
/// }
/// ```
pub trait Provider: Send + Sync + Clone {
    /// Error type returned by provider operations.
    type Error: StdError + RetryableError + Send + Sync + 'static;

    /// Reserve a number.
    ///
    /// # Arguments
    /// * `country` - provider country slug
    /// * `operator` - carrier hint, `any` for no preference
    /// * `product` - provider product code of the target service
    fn buy_number(
        &self,
        country: &CountrySlug,
        operator: &str,
        product: &ProductCode,
    ) -> impl Future<Output = Result<PurchasedNumber, Self::Error>> + Send;

    /// Fetch the order status and the first received code, if any.
    fn check_order(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<OrderCheck, Self::Error>> + Send;

    /// Cancel the order at the provider.
    fn cancel_order(&self, order_id: OrderId)
    -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Calling code for numbers bought in `country`, when known.
    ///
    /// Used to split purchased numbers into dial code and national part.
    /// Default implementation knows no countries.
    fn dial_code(&self, country: &CountrySlug) -> Option<DialCode> {
        let _ = country;
        None
    }
}
