//! Service-level error types.
//!
//! `Display` of every variant is the message shown to the end user.

use crate::errors::RetryableError;
use crate::session::{SessionError, TIMEOUT_MESSAGE};
use crate::store::StoreError;
use crate::types::{Coins, CountrySlug, OrderId, OrderStatus, UserId};
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;
use thiserror::Error;

/// Provider call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOperation {
    Buy,
    Check,
}

impl Display for ProviderOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ProviderOperation::Buy => f.write_str("buy"),
            ProviderOperation::Check => f.write_str("check"),
        }
    }
}

fn provider_message(operation: &ProviderOperation, message: &str) -> String {
    match operation {
        ProviderOperation::Buy => format!("Could not get a number: {message}."),
        ProviderOperation::Check => format!("Failed to check order status: {message}"),
    }
}

/// Errors of the order flows.
#[derive(Debug, Error)]
pub enum OtpServiceError {
    /// Missing or invalid input.
    #[error("{message}")]
    Validation { message: String },

    /// Service unknown, inactive, or not offered in the country.
    #[error("Configuration for the selected service not found.")]
    ConfigNotFound {
        service: String,
        country: CountrySlug,
    },

    #[error("Not enough coins. You need {required} coins.")]
    InsufficientBalance { balance: Coins, required: Coins },

    /// A provider call failed or returned nothing usable.
    #[error("{}", provider_message(operation, message))]
    ProviderUnavailable {
        operation: ProviderOperation,
        /// Provider message, passed through to the user.
        message: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
        is_retryable: bool,
        should_retry_operation: bool,
    },

    #[error("User not found.")]
    UserNotFound { uid: UserId },

    #[error("Your account has been banned.")]
    AccountBanned { uid: UserId },

    /// Provider refused or failed the cancellation; nothing was refunded.
    #[error("Cancellation failed: {message}")]
    CancellationFailed {
        order_id: OrderId,
        message: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
        is_retryable: bool,
    },

    /// An SMS arrived for the order, so it is no longer refundable.
    #[error("An SMS was already received for order {order_id}; it cannot be refunded.")]
    SmsAlreadyReceived { order_id: OrderId },

    /// Provider reported a terminal failure status while waiting.
    #[error("Order failed with status: {status}. Please cancel to try and get a refund.")]
    OrderFailed {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Countdown expired while waiting for the SMS.
    #[error("{}", TIMEOUT_MESSAGE)]
    SmsTimeout {
        order_id: OrderId,
        timeout: Duration,
        poll_count: u32,
    },

    /// Waiting was stopped by the caller.
    #[error("Waiting for SMS on order {order_id} was cancelled after {poll_count} checks")]
    Cancelled { order_id: OrderId, poll_count: u32 },

    #[error("Invalid order session transition: {0}")]
    Session(#[from] SessionError),

    #[error("Storage error: {0}")]
    Store(#[source] StoreError),
}

impl OtpServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        OtpServiceError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn provider<E>(operation: ProviderOperation, error: E) -> Self
    where
        E: StdError + RetryableError + Send + Sync + 'static,
    {
        OtpServiceError::ProviderUnavailable {
            operation,
            message: error.to_string(),
            is_retryable: error.is_retryable(),
            should_retry_operation: error.should_retry_operation(),
            source: Box::new(error),
        }
    }

    pub(crate) fn cancellation<E>(order_id: OrderId, error: E) -> Self
    where
        E: StdError + RetryableError + Send + Sync + 'static,
    {
        OtpServiceError::CancellationFailed {
            order_id,
            message: error.to_string(),
            is_retryable: error.is_retryable(),
            source: Box::new(error),
        }
    }
}

impl From<StoreError> for OtpServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UserNotFound { uid } => OtpServiceError::UserNotFound { uid },
            StoreError::InsufficientBalance {
                balance, required, ..
            } => OtpServiceError::InsufficientBalance { balance, required },
            other => OtpServiceError::Store(other),
        }
    }
}

impl RetryableError for OtpServiceError {
    fn is_retryable(&self) -> bool {
        match self {
            OtpServiceError::ProviderUnavailable { is_retryable, .. } => *is_retryable,
            OtpServiceError::CancellationFailed { is_retryable, .. } => *is_retryable,
            OtpServiceError::Validation { .. }
            | OtpServiceError::ConfigNotFound { .. }
            | OtpServiceError::InsufficientBalance { .. }
            | OtpServiceError::UserNotFound { .. }
            | OtpServiceError::AccountBanned { .. }
            | OtpServiceError::SmsAlreadyReceived { .. }
            | OtpServiceError::OrderFailed { .. }
            | OtpServiceError::SmsTimeout { .. }
            | OtpServiceError::Cancelled { .. }
            | OtpServiceError::Session(_)
            | OtpServiceError::Store(_) => false,
        }
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            OtpServiceError::ProviderUnavailable {
                should_retry_operation,
                ..
            } => *should_retry_operation,
            // The user retries by cancelling and buying again.
            OtpServiceError::SmsTimeout { .. } | OtpServiceError::OrderFailed { .. } => true,
            OtpServiceError::CancellationFailed { is_retryable, .. } => *is_retryable,
            OtpServiceError::Store(StoreError::Backend(_)) => true,
            OtpServiceError::Validation { .. }
            | OtpServiceError::ConfigNotFound { .. }
            | OtpServiceError::InsufficientBalance { .. }
            | OtpServiceError::UserNotFound { .. }
            | OtpServiceError::AccountBanned { .. }
            | OtpServiceError::SmsAlreadyReceived { .. }
            | OtpServiceError::Cancelled { .. }
            | OtpServiceError::Session(_)
            | OtpServiceError::Store(_) => false,
        }
    }
}
