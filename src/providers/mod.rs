//! SMS provider implementations.

pub(crate) mod retryable;
pub(crate) mod traits;

#[cfg(feature = "five-sim")]
pub mod five_sim;

pub use retryable::{OnRetryCallback, SmsRetryableProvider};
pub use traits::Provider;
