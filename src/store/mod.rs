//! Persistence seam for users, the service catalog and OTP logs.
//!
//! Balance changes go through [`Store::debit_if_sufficient`] and
//! [`Store::credit`], which implementations must apply atomically. A
//! read-then-write of the balance is never performed by callers.

mod memory;

pub use memory::MemoryStore;

use crate::models::{OtpLog, Service, User};
use crate::types::{Coins, OrderId, SmsCode, UserId};
use chrono::{DateTime, Utc};
use std::future::Future;
use thiserror::Error;

/// Errors raised by a [`Store`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("user {uid} not found")]
    UserNotFound { uid: UserId },

    #[error("user {uid} has {balance} coins, {required} required")]
    InsufficientBalance {
        uid: UserId,
        balance: Coins,
        required: Coins,
    },

    #[error("invalid amount {amount}")]
    InvalidAmount { amount: Coins },

    /// Failure of the underlying database.
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage operations the order lifecycle depends on.
pub trait Store: Send + Sync {
    fn get_user(&self, uid: &UserId) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Insert or replace a user record.
    fn put_user(&self, user: User) -> impl Future<Output = Result<()>> + Send;

    /// Subtract `amount` only if the balance covers it. Returns the new balance.
    fn debit_if_sufficient(
        &self,
        uid: &UserId,
        amount: Coins,
    ) -> impl Future<Output = Result<Coins>> + Send;

    /// Add `amount` (which may be negative for administrator corrections).
    /// Returns the new balance.
    fn credit(&self, uid: &UserId, amount: Coins) -> impl Future<Output = Result<Coins>> + Send;

    fn find_service(&self, name: &str) -> impl Future<Output = Result<Option<Service>>> + Send;

    /// Every service, active or not, in storage order.
    fn list_services(&self) -> impl Future<Output = Result<Vec<Service>>> + Send;

    /// Insert or replace a service keyed by name.
    fn put_service(&self, service: Service) -> impl Future<Output = Result<()>> + Send;

    fn append_log(&self, log: OtpLog) -> impl Future<Output = Result<()>> + Send;

    /// First log recorded for `order_id`.
    fn find_log(&self, order_id: OrderId) -> impl Future<Output = Result<Option<OtpLog>>> + Send;

    /// Move the first log for `order_id` from `PENDING` to `RECEIVED`.
    ///
    /// Returns `false` when no log exists or it already left `PENDING`, so a
    /// repeated poll can never overwrite a recorded code.
    fn mark_log_received(
        &self,
        order_id: OrderId,
        code: &SmsCode,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Set the first log for `order_id` to `CANCELLED`. Returns `false` when
    /// no log exists.
    fn mark_log_cancelled(
        &self,
        order_id: OrderId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Logs of one user, newest request first.
    fn logs_for_user(&self, uid: &UserId) -> impl Future<Output = Result<Vec<OtpLog>>> + Send;
}
