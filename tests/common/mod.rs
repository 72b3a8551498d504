//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use genie_otp::{
    Coins, CountrySlug, DialCode, MemoryStore, OrderCheck, OrderId, OtpLog, ProductCode, Provider,
    PurchasedNumber, RetryableError, Service, SmsCode, Store, StoreError, User, UserId,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum FakeProviderError {
    #[error("no free phones")]
    NoFreePhones,
    #[error("connection reset")]
    Transport,
    #[error("order has sms")]
    OrderHasSms,
}

impl RetryableError for FakeProviderError {
    fn is_retryable(&self) -> bool {
        matches!(self, FakeProviderError::Transport)
    }

    fn should_retry_operation(&self) -> bool {
        matches!(
            self,
            FakeProviderError::Transport | FakeProviderError::NoFreePhones
        )
    }
}

#[derive(Debug, Default)]
struct FakeState {
    buy_error: Option<FakeProviderError>,
    cancel_error: Option<FakeProviderError>,
    checks: VecDeque<Result<OrderCheck, FakeProviderError>>,
    check_delay: Option<Duration>,
    buy_calls: Vec<(CountrySlug, String, ProductCode)>,
    check_calls: u32,
    cancel_calls: Vec<OrderId>,
}

/// Scripted in-process provider.
///
/// Status checks pop scripted results in order; once the script runs out
/// every check answers `PENDING`.
#[derive(Debug, Clone)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
    next_id: Arc<AtomicU64>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            next_id: Arc::new(AtomicU64::new(1000)),
        }
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_buy(&self, error: FakeProviderError) {
        self.state.lock().unwrap().buy_error = Some(error);
    }

    pub fn fail_cancel(&self, error: FakeProviderError) {
        self.state.lock().unwrap().cancel_error = Some(error);
    }

    pub fn script_checks(&self, checks: impl IntoIterator<Item = Result<OrderCheck, FakeProviderError>>) {
        self.state.lock().unwrap().checks.extend(checks);
    }

    /// Every status check sleeps `delay` before answering.
    pub fn stall_checks(&self, delay: Duration) {
        self.state.lock().unwrap().check_delay = Some(delay);
    }

    pub fn buy_calls(&self) -> Vec<(CountrySlug, String, ProductCode)> {
        self.state.lock().unwrap().buy_calls.clone()
    }

    pub fn check_calls(&self) -> u32 {
        self.state.lock().unwrap().check_calls
    }

    pub fn cancel_calls(&self) -> Vec<OrderId> {
        self.state.lock().unwrap().cancel_calls.clone()
    }
}

impl Provider for FakeProvider {
    type Error = FakeProviderError;

    async fn buy_number(
        &self,
        country: &CountrySlug,
        operator: &str,
        product: &ProductCode,
    ) -> Result<PurchasedNumber, FakeProviderError> {
        let mut state = self.state.lock().unwrap();
        state
            .buy_calls
            .push((country.clone(), operator.to_string(), product.clone()));
        if let Some(error) = state.buy_error.clone() {
            return Err(error);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(PurchasedNumber {
            order_id: OrderId::new(id),
            phone: "+923001234567".into(),
        })
    }

    async fn check_order(&self, _order_id: OrderId) -> Result<OrderCheck, FakeProviderError> {
        let (delay, result) = {
            let mut state = self.state.lock().unwrap();
            state.check_calls += 1;
            let result = state
                .checks
                .pop_front()
                .unwrap_or_else(|| Ok(OrderCheck::pending()));
            (state.check_delay, result)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<(), FakeProviderError> {
        let mut state = self.state.lock().unwrap();
        state.cancel_calls.push(order_id);
        match state.cancel_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn dial_code(&self, country: &CountrySlug) -> Option<DialCode> {
        match country.as_str() {
            "pakistan" => DialCode::new("92").ok(),
            _ => None,
        }
    }
}

/// Memory store with switchable write failures.
#[derive(Debug, Clone, Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    fail_debits: bool,
    fail_log_writes: bool,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Debits fail, to exercise the compensating cancel.
    pub fn failing_debits(mut self) -> Self {
        self.fail_debits = true;
        self
    }

    /// Log inserts and updates fail; balances still work.
    pub fn failing_log_writes(mut self) -> Self {
        self.fail_log_writes = true;
        self
    }

    fn backend_error() -> StoreError {
        StoreError::Backend("write conflict".to_string())
    }
}

impl Store for FaultyStore {
    async fn get_user(&self, uid: &UserId) -> Result<Option<User>, StoreError> {
        self.inner.get_user(uid).await
    }

    async fn put_user(&self, user: User) -> Result<(), StoreError> {
        self.inner.put_user(user).await
    }

    async fn debit_if_sufficient(&self, uid: &UserId, amount: Coins) -> Result<Coins, StoreError> {
        if self.fail_debits {
            return Err(Self::backend_error());
        }
        self.inner.debit_if_sufficient(uid, amount).await
    }

    async fn credit(&self, uid: &UserId, amount: Coins) -> Result<Coins, StoreError> {
        self.inner.credit(uid, amount).await
    }

    async fn find_service(&self, name: &str) -> Result<Option<Service>, StoreError> {
        self.inner.find_service(name).await
    }

    async fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        self.inner.list_services().await
    }

    async fn put_service(&self, service: Service) -> Result<(), StoreError> {
        self.inner.put_service(service).await
    }

    async fn append_log(&self, log: OtpLog) -> Result<(), StoreError> {
        if self.fail_log_writes {
            return Err(Self::backend_error());
        }
        self.inner.append_log(log).await
    }

    async fn find_log(&self, order_id: OrderId) -> Result<Option<OtpLog>, StoreError> {
        self.inner.find_log(order_id).await
    }

    async fn mark_log_received(
        &self,
        order_id: OrderId,
        code: &SmsCode,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, StoreError> {
        if self.fail_log_writes {
            return Err(Self::backend_error());
        }
        self.inner.mark_log_received(order_id, code, at).await
    }

    async fn mark_log_cancelled(
        &self,
        order_id: OrderId,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, StoreError> {
        if self.fail_log_writes {
            return Err(Self::backend_error());
        }
        self.inner.mark_log_cancelled(order_id, at).await
    }

    async fn logs_for_user(&self, uid: &UserId) -> Result<Vec<OtpLog>, StoreError> {
        self.inner.logs_for_user(uid).await
    }
}

pub const USER: &str = "user-1";

/// The catalog used across tests: WhatsApp 50 in pakistan/india, Telegram 40
/// in russia, and an inactive Facebook.
pub fn catalog() -> Vec<Service> {
    vec![
        Service::new("WhatsApp", "whatsapp", 50, ["pakistan", "india"]),
        Service::new("Telegram", "telegram", 40, ["russia"]).with_operator("virtual21"),
        Service::new("Facebook", "facebook", 30, ["usa"]).inactive(),
    ]
}

pub fn store_with_balance(coins: Coins) -> MemoryStore {
    MemoryStore::with_data([User::new(USER, "user-1@example.com", coins)], catalog())
}
