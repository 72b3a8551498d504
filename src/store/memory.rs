//! In-process [`Store`] backed by a single lock.

use super::{Result, Store, StoreError};
use crate::models::{LogStatus, OtpLog, Service, User};
use crate::types::{Coins, OrderId, SmsCode, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    services: Vec<Service>,
    logs: Vec<OtpLog>,
}

/// Memory-resident store. Cloning shares the same data.
///
/// Every mutation runs under one write lock, which makes the balance
/// operations atomic with respect to each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with users and services.
    pub fn with_data(
        users: impl IntoIterator<Item = User>,
        services: impl IntoIterator<Item = Service>,
    ) -> Self {
        let inner = Inner {
            users: users.into_iter().map(|u| (u.uid.clone(), u)).collect(),
            services: services.into_iter().collect(),
            logs: Vec::new(),
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Every log in insertion order.
    pub async fn all_logs(&self) -> Vec<OtpLog> {
        self.inner.read().await.logs.clone()
    }

    /// Current balance, or `None` for an unknown user.
    pub async fn balance(&self, uid: &UserId) -> Option<Coins> {
        self.inner.read().await.users.get(uid).map(|u| u.coins)
    }
}

impl Store for MemoryStore {
    async fn get_user(&self, uid: &UserId) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(uid).cloned())
    }

    async fn put_user(&self, user: User) -> Result<()> {
        self.inner
            .write()
            .await
            .users
            .insert(user.uid.clone(), user);
        Ok(())
    }

    async fn debit_if_sufficient(&self, uid: &UserId, amount: Coins) -> Result<Coins> {
        if amount < 0 {
            return Err(StoreError::InvalidAmount { amount });
        }
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(uid)
            .ok_or_else(|| StoreError::UserNotFound { uid: uid.clone() })?;

        if user.coins < amount {
            return Err(StoreError::InsufficientBalance {
                uid: uid.clone(),
                balance: user.coins,
                required: amount,
            });
        }
        user.coins -= amount;
        Ok(user.coins)
    }

    async fn credit(&self, uid: &UserId, amount: Coins) -> Result<Coins> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(uid)
            .ok_or_else(|| StoreError::UserNotFound { uid: uid.clone() })?;
        user.coins = user
            .coins
            .checked_add(amount)
            .ok_or(StoreError::InvalidAmount { amount })?;
        Ok(user.coins)
    }

    async fn find_service(&self, name: &str) -> Result<Option<Service>> {
        Ok(self
            .inner
            .read()
            .await
            .services
            .iter()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        Ok(self.inner.read().await.services.clone())
    }

    async fn put_service(&self, service: Service) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.services.iter_mut().find(|s| s.name == service.name) {
            Some(existing) => *existing = service,
            None => inner.services.push(service),
        }
        Ok(())
    }

    async fn append_log(&self, log: OtpLog) -> Result<()> {
        self.inner.write().await.logs.push(log);
        Ok(())
    }

    async fn find_log(&self, order_id: OrderId) -> Result<Option<OtpLog>> {
        Ok(self
            .inner
            .read()
            .await
            .logs
            .iter()
            .find(|l| l.order_id == order_id)
            .cloned())
    }

    async fn mark_log_received(
        &self,
        order_id: OrderId,
        code: &SmsCode,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(log) = inner.logs.iter_mut().find(|l| l.order_id == order_id) else {
            return Ok(false);
        };
        if log.status != LogStatus::Pending {
            return Ok(false);
        }
        log.status = LogStatus::Received;
        log.sms_code = Some(code.clone());
        log.received_timestamp = Some(at);
        Ok(true)
    }

    async fn mark_log_cancelled(&self, order_id: OrderId, at: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(log) = inner.logs.iter_mut().find(|l| l.order_id == order_id) else {
            return Ok(false);
        };
        log.status = LogStatus::Cancelled;
        log.cancelled_timestamp = Some(at);
        Ok(true)
    }

    async fn logs_for_user(&self, uid: &UserId) -> Result<Vec<OtpLog>> {
        let mut logs: Vec<OtpLog> = self
            .inner
            .read()
            .await
            .logs
            .iter()
            .filter(|l| &l.uid == uid)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.request_timestamp.cmp(&a.request_timestamp));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CountrySlug, FullNumber};
    use chrono::Duration;

    fn log(uid: &str, order: u64, at: DateTime<Utc>) -> OtpLog {
        OtpLog {
            uid: UserId::from(uid),
            user_email: format!("{uid}@example.com"),
            order_id: OrderId::new(order),
            service: "WhatsApp".to_string(),
            country: CountrySlug::new("pakistan"),
            number: FullNumber::new("+923001234567"),
            cost: 50,
            status: LogStatus::Pending,
            sms_code: None,
            request_timestamp: at,
            received_timestamp: None,
            cancelled_timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_debit_if_sufficient() {
        let store = MemoryStore::with_data([User::new("u1", "u1@example.com", 100)], []);
        let uid = UserId::from("u1");

        assert_eq!(store.debit_if_sufficient(&uid, 60).await, Ok(40));
        assert_eq!(
            store.debit_if_sufficient(&uid, 60).await,
            Err(StoreError::InsufficientBalance {
                uid: uid.clone(),
                balance: 40,
                required: 60
            })
        );
        assert_eq!(store.balance(&uid).await, Some(40));
    }

    #[tokio::test]
    async fn test_debit_unknown_user() {
        let store = MemoryStore::new();
        let result = store.debit_if_sufficient(&UserId::from("ghost"), 1).await;
        assert!(matches!(result, Err(StoreError::UserNotFound { .. })));
    }

    #[tokio::test]
    async fn test_credit_rejects_overflow() {
        let store = MemoryStore::with_data([User::new("u1", "u1@example.com", 100)], []);
        let uid = UserId::from("u1");

        assert_eq!(
            store.credit(&uid, i64::MAX).await,
            Err(StoreError::InvalidAmount { amount: i64::MAX })
        );
        assert_eq!(store.balance(&uid).await, Some(100));
        assert_eq!(store.credit(&uid, -30).await, Ok(70));
    }

    #[tokio::test]
    async fn test_concurrent_debits_never_overdraw() {
        let store = MemoryStore::with_data([User::new("u1", "u1@example.com", 100)], []);
        let uid = UserId::from("u1");

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            let uid = uid.clone();
            handles.push(tokio::spawn(async move {
                store.debit_if_sufficient(&uid, 30).await.is_ok()
            }));
        }
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(store.balance(&uid).await, Some(10));
    }

    #[tokio::test]
    async fn test_put_service_replaces_by_name() {
        let store = MemoryStore::new();
        store
            .put_service(Service::new("WhatsApp", "whatsapp", 50, ["pakistan"]))
            .await
            .unwrap();
        store
            .put_service(Service::new("WhatsApp", "whatsapp", 70, ["pakistan"]))
            .await
            .unwrap();

        let services = store.list_services().await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].price, 70);
    }

    #[tokio::test]
    async fn test_mark_received_only_from_pending() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.append_log(log("u1", 7, now)).await.unwrap();

        let first = store
            .mark_log_received(OrderId::new(7), &SmsCode::from("1111"), now)
            .await
            .unwrap();
        let second = store
            .mark_log_received(OrderId::new(7), &SmsCode::from("2222"), now)
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        let stored = store.find_log(OrderId::new(7)).await.unwrap().unwrap();
        assert_eq!(stored.sms_code, Some(SmsCode::from("1111")));
    }

    #[tokio::test]
    async fn test_log_updates_hit_first_match() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.append_log(log("u1", 9, now)).await.unwrap();
        store.append_log(log("u1", 9, now)).await.unwrap();

        assert!(store.mark_log_cancelled(OrderId::new(9), now).await.unwrap());

        let logs = store.all_logs().await;
        assert_eq!(logs[0].status, LogStatus::Cancelled);
        assert_eq!(logs[1].status, LogStatus::Pending);
        assert!(!store.mark_log_cancelled(OrderId::new(10), now).await.unwrap());
    }

    #[tokio::test]
    async fn test_logs_for_user_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.append_log(log("u1", 1, now - Duration::minutes(5))).await.unwrap();
        store.append_log(log("u2", 2, now)).await.unwrap();
        store.append_log(log("u1", 3, now)).await.unwrap();

        let logs = store.logs_for_user(&UserId::from("u1")).await.unwrap();
        let ids: Vec<u64> = logs.iter().map(|l| l.order_id.get()).collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
