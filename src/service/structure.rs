//! Main service implementation.

use super::config::{OtpServiceConfig, OtpServiceConfigBuilder};
use super::error::{OtpServiceError, ProviderOperation};
use super::traits::OtpServiceTrait;
use crate::catalog::Catalog;
use crate::models::{
    AcquiredOrder, CancelOutcome, CancelRequest, LogStatus, NumberRequest, OtpLog,
};
use crate::providers::traits::Provider;
use crate::session::{CheckOutcome, OrderDetails, OrderSession, Tick};
use crate::store::Store;
use crate::types::{Coins, CountrySlug, Number, OrderCheck, OrderId, SmsCode, UserId};
use chrono::Utc;
use std::fmt::Debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::{debug, error, info, warn};

/// Order lifecycle service over any [`Provider`] and [`Store`].
///
/// Handles:
/// - Listing the catalog
/// - Buying a number and charging the user
/// - Waiting for the SMS code with a countdown
/// - Cancelling with refund
///
/// Cloning is cheap; clones share the provider and the store.
///
/// # Example
///
/// ```rust,ignore
/// use genie_otp::five_sim::{FiveSim, FiveSimProvider};
/// use genie_otp::{MemoryStore, NumberRequest, OtpService, OtpServiceTrait};
/// use tokio_util::sync::CancellationToken;
///
/// let provider = FiveSimProvider::new(FiveSim::from_env()?);
/// let service = OtpService::builder(provider, MemoryStore::new()).build();
///
/// let order = service
///     .acquire_number(&NumberRequest::new("WhatsApp", "pakistan", "uid-1"))
///     .await?;
/// let code = service.wait_for_sms(&order, &CancellationToken::new()).await?;
/// println!("Got code: {code}");
/// ```
#[derive(Debug)]
pub struct OtpService<P: Provider, S: Store> {
    provider: Arc<P>,
    store: Arc<S>,
    config: OtpServiceConfig,
}

impl<P: Provider, S: Store> Clone for OtpService<P, S> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<P: Provider, S: Store> OtpService<P, S>
where
    P::Error: Debug,
{
    pub fn new(provider: P, store: S, config: OtpServiceConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            store: Arc::new(store),
            config,
        }
    }

    pub fn builder(provider: P, store: S) -> OtpServiceBuilder<P, S> {
        OtpServiceBuilder::new(provider, store)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OtpServiceConfig {
        &self.config
    }

    /// Active services sorted by name.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "otp.catalog", skip_all)
    )]
    pub async fn catalog(&self) -> Result<Catalog, OtpServiceError> {
        let services = self.store.list_services().await?;
        Ok(Catalog::new(services))
    }

    /// Eligible countries of an active service; empty for unknown services.
    pub async fn countries_for(&self, service: &str) -> Result<Vec<CountrySlug>, OtpServiceError> {
        Ok(self
            .store
            .find_service(service)
            .await?
            .filter(|s| s.is_active)
            .map(|s| s.countries)
            .unwrap_or_default())
    }

    /// Administrator coin adjustment. Negative amounts take coins away.
    ///
    /// Returns the new balance.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "otp.adjust_coins", skip_all, fields(uid = %uid, amount = amount))
    )]
    pub async fn adjust_coins(&self, uid: &UserId, amount: Coins) -> Result<Coins, OtpServiceError> {
        if uid.as_str().trim().is_empty() {
            return Err(OtpServiceError::validation("User ID is required."));
        }
        if amount == 0 {
            return Err(OtpServiceError::validation(
                "Please enter a valid, non-zero amount.",
            ));
        }
        let balance = self.store.credit(uid, amount).await?;

        #[cfg(feature = "tracing")]
        info!(new_balance = balance, "Coins adjusted");

        Ok(balance)
    }

    /// The user's OTP logs, newest first.
    pub async fn order_history(&self, uid: &UserId) -> Result<Vec<OtpLog>, OtpServiceError> {
        Ok(self.store.logs_for_user(uid).await?)
    }

    /// Poll the provider until the SMS arrives, the order fails, the countdown
    /// expires or `token` is cancelled.
    ///
    /// Transport errors on a check are counted and treated as still pending.
    /// A timeout leaves the order and the debit untouched; the caller decides
    /// whether to cancel.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "otp.wait_for_sms",
            skip_all,
            fields(order_id = %order.order_id)
        )
    )]
    pub async fn wait_for_sms(
        &self,
        order: &AcquiredOrder,
        token: &CancellationToken,
    ) -> Result<SmsCode, OtpServiceError> {
        let order_id = order.order_id;
        let mut session = OrderSession::new(self.config.poll_interval, self.config.timeout);
        session.begin_request()?;
        session.start(OrderDetails {
            id: order_id,
            number: order.phone.clone(),
            cost: order.cost,
        })?;

        #[cfg(feature = "tracing")]
        debug!(
            timeout_secs = %self.config.timeout.as_secs_f64(),
            poll_interval_secs = %self.config.poll_interval.as_secs_f64(),
            max_polls = self.config.max_polls(),
            "Starting SMS polling"
        );

        loop {
            if token.is_cancelled() {
                session.stop();
                return Err(OtpServiceError::Cancelled {
                    order_id,
                    poll_count: session.polls(),
                });
            }

            match session.tick() {
                Tick::Wait(delay) => {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Tick::Poll => {
                    let Some(deadline) = session.deadline() else {
                        continue;
                    };
                    // A stalled check must not outlive the countdown or the token.
                    let result = tokio::select! {
                        biased;
                        _ = token.cancelled() => continue,
                        result = self.provider.check_order(order_id) => result,
                        _ = tokio::time::sleep_until(deadline) => continue,
                    };
                    match result {
                        Ok(check) => {
                            match session.apply_check(&check.status, check.code.as_ref()) {
                                CheckOutcome::Received(code) => {
                                    self.record_received(order_id, &code).await;

                                    #[cfg(feature = "tracing")]
                                    info!(polls = session.polls(), "SMS code received");

                                    return Ok(code);
                                }
                                CheckOutcome::Failed(status) => {
                                    #[cfg(feature = "tracing")]
                                    warn!(status = %status, "Order failed at provider");

                                    return Err(OtpServiceError::OrderFailed { order_id, status });
                                }
                                CheckOutcome::Pending | CheckOutcome::Ignored => {}
                            }
                        }
                        Err(_e) => {
                            session.record_poll_failure();

                            #[cfg(feature = "tracing")]
                            warn!(
                                error = %_e,
                                consecutive_failures = session.consecutive_failures(),
                                "Status check failed, treating as pending"
                            );
                        }
                    }
                }
                Tick::TimedOut => {
                    return Err(OtpServiceError::SmsTimeout {
                        order_id,
                        timeout: self.config.timeout,
                        poll_count: session.polls(),
                    });
                }
                Tick::Inactive => {
                    return Err(OtpServiceError::Cancelled {
                        order_id,
                        poll_count: session.polls(),
                    });
                }
            }
        }
    }

    /// Move the order's log to `RECEIVED`. Failures are logged only; the code
    /// is already in hand.
    async fn record_received(&self, order_id: OrderId, code: &SmsCode) {
        match self.store.mark_log_received(order_id, code, Utc::now()).await {
            Ok(_updated) => {
                #[cfg(feature = "tracing")]
                if !_updated {
                    debug!(order_id = %order_id, "No pending log to mark as received");
                }
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(order_id = %order_id, error = %_e, "Failed to record received SMS");
            }
        }
    }

    fn validate(request: &NumberRequest) -> Result<(), OtpServiceError> {
        if request.service.trim().is_empty() {
            return Err(OtpServiceError::validation("Service is required."));
        }
        if request.country.is_empty() {
            return Err(OtpServiceError::validation("Country is required."));
        }
        if request.uid.as_str().trim().is_empty() {
            return Err(OtpServiceError::validation("User ID is required."));
        }
        Ok(())
    }
}

impl<P: Provider, S: Store> OtpServiceTrait for OtpService<P, S>
where
    P::Error: Debug,
{
    type Error = OtpServiceError;

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "otp.acquire_number",
            skip_all,
            fields(service = %request.service, country = %request.country, uid = %request.uid)
        )
    )]
    async fn acquire_number(&self, request: &NumberRequest) -> Result<AcquiredOrder, Self::Error> {
        Self::validate(request)?;

        let service = self
            .store
            .find_service(&request.service)
            .await?
            .filter(|s| s.is_active && s.serves(&request.country))
            .ok_or_else(|| OtpServiceError::ConfigNotFound {
                service: request.service.clone(),
                country: request.country.clone(),
            })?;

        let user = self
            .store
            .get_user(&request.uid)
            .await?
            .ok_or_else(|| OtpServiceError::UserNotFound {
                uid: request.uid.clone(),
            })?;

        if user.is_banned() {
            return Err(OtpServiceError::AccountBanned {
                uid: request.uid.clone(),
            });
        }

        if user.coins < service.price {
            #[cfg(feature = "tracing")]
            debug!(balance = user.coins, price = service.price, "Balance too low");

            return Err(OtpServiceError::InsufficientBalance {
                balance: user.coins,
                required: service.price,
            });
        }

        let purchased = self
            .provider
            .buy_number(&request.country, service.operator_or_any(), &service.product)
            .await
            .map_err(|e| OtpServiceError::provider(ProviderOperation::Buy, e))?;

        let new_balance = match self
            .store
            .debit_if_sufficient(&request.uid, service.price)
            .await
        {
            Ok(balance) => balance,
            Err(debit_error) => {
                #[cfg(feature = "tracing")]
                warn!(
                    order_id = %purchased.order_id,
                    error = %debit_error,
                    "Debit failed after purchase, cancelling order"
                );

                if let Err(_cancel_error) = self.provider.cancel_order(purchased.order_id).await {
                    #[cfg(feature = "tracing")]
                    error!(
                        order_id = %purchased.order_id,
                        error = %_cancel_error,
                        "Failed to cancel unpaid order"
                    );
                }
                return Err(debit_error.into());
            }
        };

        let log = OtpLog {
            uid: request.uid.clone(),
            user_email: user.email.clone(),
            order_id: purchased.order_id,
            service: service.name.clone(),
            country: request.country.clone(),
            number: purchased.phone.clone(),
            cost: service.price,
            status: LogStatus::Pending,
            sms_code: None,
            request_timestamp: Utc::now(),
            received_timestamp: None,
            cancelled_timestamp: None,
        };
        if let Err(_e) = self.store.append_log(log).await {
            #[cfg(feature = "tracing")]
            warn!(order_id = %purchased.order_id, error = %_e, "Failed to write OTP log");
        }

        let dial_code = self.provider.dial_code(&request.country);
        let number = dial_code
            .as_ref()
            .and_then(|dc| Number::from_full_number(&purchased.phone, dc).ok());

        #[cfg(feature = "tracing")]
        info!(
            order_id = %purchased.order_id,
            cost = service.price,
            new_balance,
            "Number acquired"
        );

        Ok(AcquiredOrder {
            order_id: purchased.order_id,
            phone: purchased.phone,
            dial_code,
            number,
            cost: service.price,
            new_balance,
        })
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "otp.check_sms", skip_all, fields(order_id = %order_id))
    )]
    async fn check_sms(&self, order_id: OrderId) -> Result<OrderCheck, Self::Error> {
        let check = self
            .provider
            .check_order(order_id)
            .await
            .map_err(|e| OtpServiceError::provider(ProviderOperation::Check, e))?;

        if let Some(code) = check.received_code() {
            self.record_received(order_id, code).await;
        }

        Ok(check)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "otp.cancel_order",
            skip_all,
            fields(order_id = %request.order_id, uid = %request.uid, cost = request.cost)
        )
    )]
    async fn cancel_order(&self, request: &CancelRequest) -> Result<CancelOutcome, Self::Error> {
        if request.uid.as_str().trim().is_empty() || request.cost < 0 {
            return Err(OtpServiceError::validation("Invalid input."));
        }
        let order_id = request.order_id;

        if self.config.verify_before_refund {
            match self.provider.check_order(order_id).await {
                Ok(check) if check.received_code().is_some() => {
                    #[cfg(feature = "tracing")]
                    warn!("Refund refused, SMS already received");

                    return Err(OtpServiceError::SmsAlreadyReceived { order_id });
                }
                Ok(_) => {}
                Err(_e) => {
                    // The provider will refuse the cancel itself if the order
                    // has an SMS, so an unreachable check does not block it.
                    #[cfg(feature = "tracing")]
                    warn!(error = %_e, "Pre-refund check failed, cancelling anyway");
                }
            }
        }

        self.provider
            .cancel_order(order_id)
            .await
            .map_err(|e| OtpServiceError::cancellation(order_id, e))?;

        let new_balance = self.store.credit(&request.uid, request.cost).await?;

        match self.store.mark_log_cancelled(order_id, Utc::now()).await {
            Ok(_) => {}
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, "Failed to mark OTP log as cancelled");
            }
        }

        #[cfg(feature = "tracing")]
        info!(refunded = request.cost, new_balance, "Order cancelled");

        Ok(CancelOutcome {
            order_id,
            refunded: request.cost,
            new_balance,
            message: format!(
                "Order cancelled successfully. {} coins refunded.",
                request.cost
            ),
        })
    }
}

/// Builder for OtpService.
///
/// # Example
///
/// ```rust,ignore
/// use genie_otp::{MemoryStore, OtpService};
/// use std::time::Duration;
///
/// let service = OtpService::builder(provider, MemoryStore::new())
///     .timeout(Duration::from_secs(120))
///     .poll_interval(Duration::from_secs(3))
///     .build();
/// ```
#[derive(Debug)]
pub struct OtpServiceBuilder<P: Provider, S: Store> {
    provider: P,
    store: S,
    config_builder: OtpServiceConfigBuilder,
}

impl<P: Provider, S: Store> OtpServiceBuilder<P, S>
where
    P::Error: Debug,
{
    pub fn new(provider: P, store: S) -> Self {
        Self {
            provider,
            store,
            config_builder: OtpServiceConfigBuilder::default(),
        }
    }

    /// Default: 180 seconds
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Default: 5 seconds
    pub fn poll_interval(mut self, interval: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.poll_interval(interval);
        self
    }

    /// Default: false
    pub fn verify_before_refund(mut self, verify: bool) -> Self {
        self.config_builder = self.config_builder.verify_before_refund(verify);
        self
    }

    /// Set the full configuration.
    pub fn config(mut self, config: OtpServiceConfig) -> Self {
        self.config_builder = OtpServiceConfigBuilder { config };
        self
    }

    pub fn build(self) -> OtpService<P, S> {
        OtpService::new(self.provider, self.store, self.config_builder.build())
    }
}
