//! 5sim API payloads.

use crate::types::{OrderCheck, OrderId, OrderStatus, SmsCode};
use serde::{Deserialize, Deserializer};

/// Order as returned by buy, check and cancel.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderInfo {
    pub id: OrderId,
    pub phone: String,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    pub status: OrderStatus,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sms: Vec<SmsInfo>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// One received message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmsInfo {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub code: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<SmsInfo>, D::Error> {
    Ok(Option::<Vec<SmsInfo>>::deserialize(d)?.unwrap_or_default())
}

impl OrderInfo {
    /// Code of the first received message, if it has one.
    pub fn first_code(&self) -> Option<SmsCode> {
        self.sms
            .first()
            .map(|sms| sms.code.trim())
            .filter(|code| !code.is_empty())
            .map(SmsCode::from)
    }

    pub fn to_check(&self) -> OrderCheck {
        OrderCheck {
            status: self.status.clone(),
            code: self.first_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_with_sms() {
        let json = r#"{
            "id": 11631253,
            "phone": "+79000381454",
            "status": "RECEIVED",
            "sms": [
                {"created_at": "2018-10-13T08:20:38Z", "date": "2018-10-13T08:19:38Z",
                 "sender": "VKcom", "text": "VK: 09363 - use this code", "code": "09363"},
                {"sender": "VKcom", "text": "VK: 11111", "code": "11111"}
            ]
        }"#;
        let order: OrderInfo = serde_json::from_str(json).unwrap();

        assert_eq!(order.id, OrderId::new(11631253));
        assert_eq!(order.to_check(), OrderCheck::received("09363"));
    }

    #[test]
    fn test_null_sms_and_missing_fields() {
        let json = r#"{"id": 5, "phone": "+923001234567", "status": "PENDING", "sms": null}"#;
        let order: OrderInfo = serde_json::from_str(json).unwrap();

        assert!(order.sms.is_empty());
        assert_eq!(order.to_check(), OrderCheck::pending());
    }

    #[test]
    fn test_empty_code_is_ignored() {
        let json = r#"{"id": 5, "phone": "+1", "status": "RECEIVED", "sms": [{"text": "hi"}]}"#;
        let order: OrderInfo = serde_json::from_str(json).unwrap();

        assert_eq!(order.first_code(), None);
    }
}
