//! 5sim provider implementation.

use super::client::FiveSim;
use super::countries::CountrySlugExt;
use super::errors::{FiveSimError, Result};
use crate::providers::traits::Provider;
use crate::types::{
    CountrySlug, DialCode, FullNumber, OrderCheck, OrderId, ProductCode, PurchasedNumber,
};

#[cfg(feature = "tracing")]
use tracing::debug;

/// 5sim provider implementation.
///
/// Wraps a [`FiveSim`] client and implements the generic [`Provider`] trait.
///
/// # Example
///
/// ```rust,ignore
/// use genie_otp::five_sim::{FiveSim, FiveSimProvider};
/// use genie_otp::SmsRetryableProvider;
///
/// let provider = FiveSimProvider::new(FiveSim::from_env()?);
/// let provider = SmsRetryableProvider::new(provider);
/// ```
#[derive(Debug, Clone)]
pub struct FiveSimProvider {
    client: FiveSim,
}

impl FiveSimProvider {
    pub fn new(client: FiveSim) -> Self {
        Self { client }
    }

    /// Get reference to the inner client.
    pub fn client(&self) -> &FiveSim {
        &self.client
    }
}

impl Provider for FiveSimProvider {
    type Error = FiveSimError;

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "FiveSimProvider::buy_number",
            skip_all,
            fields(country = %country, product = %product)
        )
    )]
    async fn buy_number(
        &self,
        country: &CountrySlug,
        operator: &str,
        product: &ProductCode,
    ) -> Result<PurchasedNumber> {
        let order = self
            .client
            .buy_activation(country, operator, product)
            .await?;

        Ok(PurchasedNumber {
            order_id: order.id,
            phone: FullNumber::from(order.phone),
        })
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "FiveSimProvider::check_order",
            skip_all,
            fields(order_id = %order_id)
        )
    )]
    async fn check_order(&self, order_id: OrderId) -> Result<OrderCheck> {
        let order = self.client.check_order(order_id).await?;
        let check = order.to_check();

        #[cfg(feature = "tracing")]
        debug!(status = %check.status, has_code = check.code.is_some(), "Order checked");

        Ok(check)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "FiveSimProvider::cancel_order",
            skip_all,
            fields(order_id = %order_id)
        )
    )]
    async fn cancel_order(&self, order_id: OrderId) -> Result<()> {
        let _order = self.client.cancel_order(order_id).await?;

        #[cfg(feature = "tracing")]
        if let Some(order) = &_order {
            debug!(status = %order.status, "Order cancelled");
        }

        Ok(())
    }

    fn dial_code(&self, country: &CountrySlug) -> Option<DialCode> {
        CountrySlugExt::dial_code(country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::five_sim::errors::FiveSimErrorCode;
    use crate::types::OrderStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider_for(server: &MockServer) -> FiveSimProvider {
        let client = FiveSim::new(format!("{}/v1", server.uri()), "test_key").unwrap();
        FiveSimProvider::new(client)
    }

    #[tokio::test]
    async fn test_buy_number() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/buy/activation/england/any/telegram"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 4242,
                "phone": "+447700900123",
                "status": "PENDING",
                "sms": null
            })))
            .mount(&mock_server)
            .await;

        let provider = provider_for(&mock_server).await;
        let purchased = provider
            .buy_number(
                &CountrySlug::new("england"),
                "any",
                &ProductCode::from("telegram"),
            )
            .await
            .unwrap();

        assert_eq!(purchased.order_id, OrderId::new(4242));
        assert_eq!(purchased.phone, FullNumber::from("+447700900123"));
    }

    #[tokio::test]
    async fn test_check_order_failure_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/check/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 9,
                "phone": "+447700900123",
                "status": "BANNED",
                "sms": []
            })))
            .mount(&mock_server)
            .await;

        let provider = provider_for(&mock_server).await;
        let check = provider.check_order(OrderId::new(9)).await.unwrap();

        assert_eq!(check.status, OrderStatus::Banned);
        assert_eq!(check.code, None);
    }

    #[tokio::test]
    async fn test_cancel_order_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/cancel/9"))
            .respond_with(ResponseTemplate::new(404).set_body_string("order not found"))
            .mount(&mock_server)
            .await;

        let provider = provider_for(&mock_server).await;
        let err = provider.cancel_order(OrderId::new(9)).await.unwrap_err();

        assert_eq!(err.code(), Some(&FiveSimErrorCode::OrderNotFound));
    }

    #[test]
    fn test_dial_code_lookup() {
        let provider = FiveSimProvider::new(FiveSim::with_api_key("test_key").unwrap());

        assert_eq!(
            provider.dial_code(&CountrySlug::new("russia")),
            Some(DialCode::new("7").unwrap())
        );
        assert_eq!(provider.dial_code(&CountrySlug::new("nowhere")), None);
    }
}
