//! 5sim HTTP client.

use super::errors::{FiveSimError, Result};
use super::response::FiveSimResponse;
use super::types::OrderInfo;
use crate::types::{CountrySlug, OrderId, ProductCode};
use reqwest::header::ACCEPT;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::Span;
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Default 5sim API URL.
pub const DEFAULT_API_URL: &str = "https://5sim.net/v1";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "FIVESIM_API_KEY";

/// Environment variable overriding the API URL.
pub const API_URL_ENV: &str = "FIVESIM_API_URL";

/// Request timeout of the default HTTP client. Kept under the default poll
/// interval so a stalled check never overlaps the next one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// 5sim HTTP client.
///
/// Talks to the 5sim user API with bearer authentication. All three calls are
/// plain `GET`s with their arguments in the path.
///
/// # Example
///
/// ```rust,ignore
/// use genie_otp::five_sim::FiveSim;
/// use genie_otp::{CountrySlug, ProductCode};
///
/// let client = FiveSim::with_api_key("your_api_key")?;
///
/// let order = client
///     .buy_activation(&CountrySlug::new("pakistan"), "any", &ProductCode::from("whatsapp"))
///     .await?;
/// println!("Got number: {}", order.phone);
///
/// let order = client.check_order(order.id).await?;
/// ```
#[derive(Clone)]
pub struct FiveSim {
    http_client: ClientWithMiddleware,
    api_key: SecretString,
    base_url: Url,
}

impl std::fmt::Debug for FiveSim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiveSim")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Builder for configuring a [`FiveSim`] client.
pub struct FiveSimClientBuilder {
    api_key: String,
    base_url: Option<Url>,
    http_client: Option<ClientWithMiddleware>,
    request_timeout: Duration,
}

impl FiveSimClientBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            http_client: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set a custom API base URL.
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Request timeout of the default HTTP client (default: 4 s). Ignored
    /// when a custom client is set.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<FiveSim> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_API_URL).map_err(FiveSimError::InvalidUrl)?,
        };
        if base_url.cannot_be_a_base() {
            return Err(FiveSimError::CannotBeABase {
                url: base_url.to_string(),
            });
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let client = reqwest::Client::builder()
                    .timeout(self.request_timeout)
                    .build()
                    .map_err(FiveSimError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        Ok(FiveSim {
            http_client,
            api_key: SecretString::from(self.api_key),
            base_url,
        })
    }
}

impl FiveSim {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the 5sim API, e.g. `https://5sim.net/v1`
    /// * `api_key` - API key for bearer authentication
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let url = Url::parse(base_url.as_ref()).map_err(FiveSimError::InvalidUrl)?;
        Self::builder(api_key).base_url(url).build()
    }

    /// Create a new client with the default API URL.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Create a client from `FIVESIM_API_KEY` and, if set, `FIVESIM_API_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(FiveSimError::MissingEnv { name: API_KEY_ENV })?;

        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim(), api_key),
            _ => Self::with_api_key(api_key),
        }
    }

    pub fn builder(api_key: impl Into<String>) -> FiveSimClientBuilder {
        FiveSimClientBuilder::new(api_key)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL.
    fn build_request_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FiveSimError::CannotBeABase {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send an authenticated GET and decode the order in the response.
    async fn get_order(&self, url: Url, operation: &'static str) -> Result<Option<OrderInfo>> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.api_key.expose_secret())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(FiveSimError::HttpRequest)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(FiveSimError::ParseResponse)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(operation, status, body = %text, "5sim response");
        #[cfg(not(feature = "tracing"))]
        let _ = operation;

        FiveSimResponse::<Option<OrderInfo>>::from_parts(status, &text)
            .map_err(FiveSimError::DeserializeJson)?
            .into_result()
            .map_err(FiveSimError::Service)
    }

    /// Buy an activation number.
    ///
    /// # Arguments
    /// * `country` - 5sim country slug
    /// * `operator` - carrier, `any` for no preference
    /// * `product` - 5sim product code
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "FiveSim::buy_activation",
            skip_all,
            fields(country = %country, operator = %operator, product = %product)
        )
    )]
    pub async fn buy_activation(
        &self,
        country: &CountrySlug,
        operator: &str,
        product: &ProductCode,
    ) -> Result<OrderInfo> {
        let url = self.build_request_url(&[
            "user",
            "buy",
            "activation",
            country.as_str(),
            operator,
            product.as_str(),
        ])?;

        let order = self
            .get_order(url, "buy")
            .await?
            .ok_or(FiveSimError::EmptyPayload { operation: "buy" })?;

        #[cfg(feature = "tracing")]
        {
            Span::current()
                .record("order_id", order.id.get())
                .record("phone_number", order.phone.as_str())
                .set_status(Status::Ok);
        }

        Ok(order)
    }

    /// Check an order for received messages.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "FiveSim::check_order",
            skip_all,
            fields(order_id = %order_id)
        )
    )]
    pub async fn check_order(&self, order_id: OrderId) -> Result<OrderInfo> {
        let url = self.build_request_url(&["user", "check", &order_id.to_string()])?;

        let order = self
            .get_order(url, "check")
            .await?
            .ok_or(FiveSimError::EmptyPayload { operation: "check" })?;

        #[cfg(feature = "tracing")]
        {
            Span::current()
                .record("status", order.status.as_str())
                .set_status(Status::Ok);
        }

        Ok(order)
    }

    /// Cancel an order. Returns the updated order when 5sim sends one back.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "FiveSim::cancel_order",
            skip_all,
            fields(order_id = %order_id)
        )
    )]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Option<OrderInfo>> {
        let url = self.build_request_url(&["user", "cancel", &order_id.to_string()])?;

        let order = self.get_order(url, "cancel").await?;

        #[cfg(feature = "tracing")]
        Span::current().set_status(Status::Ok);

        Ok(order)
    }
}
