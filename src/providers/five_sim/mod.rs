//! 5sim provider implementation.
//!
//! Integration with the [5sim](https://5sim.net) activation API.
//!
//! # Example
//!
//! ```rust,ignore
//! use genie_otp::five_sim::{FiveSim, FiveSimProvider};
//! use genie_otp::{MemoryStore, OtpService, OtpServiceConfig, SmsRetryableProvider};
//!
//! let provider = SmsRetryableProvider::new(FiveSimProvider::new(FiveSim::from_env()?));
//! let service = OtpService::new(provider, MemoryStore::new(), OtpServiceConfig::default());
//! ```

pub mod client;
pub mod countries;
pub mod errors;
pub mod provider;
mod response;
pub mod types;

pub use client::FiveSim;
pub use countries::CountrySlugExt;
pub use errors::{FiveSimError, FiveSimErrorCode};
pub use provider::FiveSimProvider;
