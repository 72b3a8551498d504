//! Service trait definition.

use crate::errors::RetryableError;
use crate::models::{AcquiredOrder, CancelOutcome, CancelRequest, NumberRequest};
use crate::types::{OrderCheck, OrderId};
use std::error::Error as StdError;

/// The order lifecycle: buy a number, check it, cancel it.
///
/// Abstracts the service interface so front ends can be tested against
/// other implementations.
pub trait OtpServiceTrait: Send + Sync {
    /// The error type for this service.
    type Error: StdError + RetryableError;

    /// Buy a number for a catalog service and charge the user for it.
    ///
    /// # Returns
    ///
    /// The provider order with its cost and the user's new balance.
    async fn acquire_number(&self, request: &NumberRequest) -> Result<AcquiredOrder, Self::Error>;

    /// One status check of an order. A received code is recorded in its log.
    async fn check_sms(&self, order_id: OrderId) -> Result<OrderCheck, Self::Error>;

    /// Cancel an order at the provider and refund its cost.
    async fn cancel_order(&self, request: &CancelRequest) -> Result<CancelOutcome, Self::Error>;
}
