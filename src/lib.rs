//! # GenieOTP
//!
//! Coin-metered virtual phone numbers with SMS one-time passcode retrieval.
//!
//! Users spend coins on a number from an SMS-activation provider, wait for
//! the verification SMS, and get their coins back when they cancel before it
//! arrives. Every order is recorded in an OTP log.
//!
//! ## Supported Providers
//!
//! | Provider | Feature | Website |
//! |----------|---------|---------|
//! | 5sim | `five-sim` (default) | <https://5sim.net> |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use genie_otp::five_sim::{FiveSim, FiveSimProvider};
//! use genie_otp::{
//!     CancelRequest, MemoryStore, NumberRequest, OtpService, OtpServiceError,
//!     OtpServiceTrait, SmsRetryableProvider,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = SmsRetryableProvider::new(FiveSimProvider::new(FiveSim::from_env()?));
//!     let service = OtpService::builder(provider, MemoryStore::new()).build();
//!
//!     let request = NumberRequest::new("WhatsApp", "pakistan", "uid-1");
//!     let order = service.acquire_number(&request).await?;
//!     println!("Use {} and wait for the code", order.phone);
//!
//!     match service.wait_for_sms(&order, &CancellationToken::new()).await {
//!         Ok(code) => println!("Got code: {code}"),
//!         Err(OtpServiceError::SmsTimeout { .. }) => {
//!             let refund = service
//!                 .cancel_order(&CancelRequest::new(order.order_id, "uid-1", order.cost))
//!                 .await?;
//!             println!("{}", refund.message);
//!         }
//!         Err(e) => return Err(e.into()),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! OtpService<P, S> ──► OrderSession   (state machine, injected clock)
//!     │        │
//!     │        ▼
//!     │      Store                    (trait: MemoryStore, ...)
//!     ▼
//! SmsRetryableProvider<P>             (optional, retries status checks)
//!     │
//!     ▼
//! Provider                            (trait: FiveSimProvider, ...)
//! ```
//!
//! ## Features
//!
//! - `five-sim` - 5sim provider support (enabled by default)
//! - `tracing` - OpenTelemetry tracing instrumentation (enabled by default)

pub mod catalog;
pub mod errors;
pub mod models;
pub mod providers;
pub mod service;
pub mod session;
pub mod store;
pub mod types;
pub(crate) mod utils;

#[cfg(feature = "five-sim")]
pub use providers::five_sim;

pub use catalog::Catalog;
pub use errors::RetryableError;
pub use models::{
    AcquiredOrder, CancelOutcome, CancelRequest, LogStatus, NumberRequest, OtpLog, Service, User,
    UserStatus,
};
pub use providers::{OnRetryCallback, Provider, SmsRetryableProvider};
pub use service::{
    OtpService, OtpServiceBuilder, OtpServiceConfig, OtpServiceConfigBuilder, OtpServiceError,
    OtpServiceTrait,
};
pub use session::{Clock, ManualClock, OrderSession, SessionError, SessionState, TokioClock};
pub use store::{MemoryStore, Store, StoreError};
pub use types::{
    Coins, CountrySlug, DialCode, FullNumber, Number, OrderCheck, OrderId, OrderStatus,
    ProductCode, PurchasedNumber, SmsCode, UserId,
};
pub use utils::retry::RetryConfig;

// Re-export keshvar types for country lookups
pub use keshvar::{Alpha2, Country};
