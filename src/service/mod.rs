//! Order lifecycle service: acquisition, SMS polling, cancellation and refund.

pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod structure;
pub(crate) mod traits;

pub use config::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, OtpServiceConfig, OtpServiceConfigBuilder};
pub use error::{OtpServiceError, ProviderOperation};
pub use structure::{OtpService, OtpServiceBuilder};
pub use traits::OtpServiceTrait;
