//! Records kept by the store (users, catalog services, OTP logs) and the
//! request and result types of the order flows.

use crate::types::{
    Coins, CountrySlug, DialCode, FullNumber, Number, OrderId, ProductCode, SmsCode, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Account status managed by administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserStatus {
    #[default]
    Active,
    Banned,
}

/// A user profile with its coin balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub coins: Coins,
    #[serde(default)]
    pub status: UserStatus,
    pub join_date: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl User {
    /// A fresh active user with the given balance.
    pub fn new(uid: impl Into<UserId>, email: impl Into<String>, coins: Coins) -> Self {
        let now = Utc::now();
        Self {
            uid: uid.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            phone_number: None,
            coins,
            status: UserStatus::Active,
            join_date: now,
            last_login: now,
        }
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_banned(&self) -> bool {
        self.status == UserStatus::Banned
    }
}

/// A purchasable service in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Display name, also the lookup key used by acquisition requests.
    pub name: String,
    /// Product code understood by the provider.
    #[serde(rename = "apiProduct")]
    pub product: ProductCode,
    /// Price per number in coins.
    pub price: Coins,
    /// Country slugs numbers may be bought in.
    pub countries: Vec<CountrySlug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    pub is_active: bool,
}

impl Service {
    pub fn new<I>(name: impl Into<String>, product: impl Into<String>, price: Coins, countries: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            name: name.into(),
            product: ProductCode::new(product),
            price,
            countries: countries.into_iter().map(|c| CountrySlug::new(c)).collect(),
            operator: None,
            is_active: true,
        }
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn serves(&self, country: &CountrySlug) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    /// Operator sent to the provider; `any` when no hint is configured.
    pub fn operator_or_any(&self) -> &str {
        match self.operator.as_deref().map(str::trim) {
            Some(op) if !op.is_empty() => op,
            _ => "any",
        }
    }
}

/// Lifecycle status recorded in an OTP log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogStatus {
    Pending,
    Received,
    Cancelled,
}

impl Display for LogStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogStatus::Pending => "PENDING",
            LogStatus::Received => "RECEIVED",
            LogStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Audit record of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpLog {
    pub uid: UserId,
    pub user_email: String,
    pub order_id: OrderId,
    pub service: String,
    pub country: CountrySlug,
    pub number: FullNumber,
    pub cost: Coins,
    pub status: LogStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_code: Option<SmsCode>,
    pub request_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_timestamp: Option<DateTime<Utc>>,
}

// =============================================================================
// Order requests and results
// =============================================================================

/// Request to buy a number for a catalog service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberRequest {
    /// Catalog service name.
    pub service: String,
    pub country: CountrySlug,
    pub uid: UserId,
}

impl NumberRequest {
    pub fn new(
        service: impl Into<String>,
        country: impl AsRef<str>,
        uid: impl Into<UserId>,
    ) -> Self {
        Self {
            service: service.into().trim().to_string(),
            country: CountrySlug::new(country),
            uid: uid.into(),
        }
    }
}

/// A number bought and paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredOrder {
    pub order_id: OrderId,
    pub phone: FullNumber,
    /// Calling code of the order's country, when it is known.
    pub dial_code: Option<DialCode>,
    /// `phone` without the calling code, when it could be split.
    pub number: Option<Number>,
    pub cost: Coins,
    /// Balance right after the debit.
    pub new_balance: Coins,
}

/// Request to cancel an order and refund its cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    pub order_id: OrderId,
    pub uid: UserId,
    /// Coins to refund, normally the cost charged at acquisition.
    pub cost: Coins,
}

impl CancelRequest {
    pub fn new(order_id: OrderId, uid: impl Into<UserId>, cost: Coins) -> Self {
        Self {
            order_id,
            uid: uid.into(),
            cost,
        }
    }
}

impl From<(&AcquiredOrder, &UserId)> for CancelRequest {
    fn from((order, uid): (&AcquiredOrder, &UserId)) -> Self {
        Self::new(order.order_id, uid.clone(), order.cost)
    }
}

/// Result of a successful cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    pub order_id: OrderId,
    pub refunded: Coins,
    /// Balance right after the refund.
    pub new_balance: Coins,
    /// Confirmation for the user.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_or_any() {
        let svc = Service::new("WhatsApp", "whatsapp", 50, ["pakistan"]);
        assert_eq!(svc.operator_or_any(), "any");
        assert_eq!(svc.clone().with_operator("  ").operator_or_any(), "any");
        assert_eq!(svc.with_operator("virtual21").operator_or_any(), "virtual21");
    }

    #[test]
    fn test_service_serves_country() {
        let svc = Service::new("WhatsApp", "whatsapp", 50, ["pakistan", "russia"]);
        assert!(svc.serves(&CountrySlug::new("Pakistan")));
        assert!(!svc.serves(&CountrySlug::new("england")));
    }

    #[test]
    fn test_service_document_shape() {
        let json = serde_json::json!({
            "name": "Telegram",
            "apiProduct": "telegram",
            "price": 40,
            "countries": ["india", "russia"],
            "isActive": true
        });
        let svc: Service = serde_json::from_value(json).unwrap();
        assert_eq!(svc.product.as_str(), "telegram");
        assert_eq!(svc.operator, None);
        assert_eq!(svc.countries.len(), 2);
    }

    #[test]
    fn test_log_status_serde() {
        assert_eq!(
            serde_json::to_string(&LogStatus::Cancelled).unwrap(),
            r#""CANCELLED""#
        );
        assert_eq!(LogStatus::Pending.to_string(), "PENDING");
    }

    #[test]
    fn test_user_ban() {
        let user = User::new("u1", "a@b.c", 10).with_status(UserStatus::Banned);
        assert!(user.is_banned());
    }

    #[test]
    fn test_number_request_normalizes() {
        let request = NumberRequest::new(" WhatsApp ", "Pakistan", "u1");
        assert_eq!(request.service, "WhatsApp");
        assert_eq!(request.country.as_str(), "pakistan");
    }
}
