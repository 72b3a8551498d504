//! Core value types shared by the provider, store and service layers.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Coin amounts. Balances are signed so that administrator corrections can be
/// expressed as negative adjustments.
pub type Coins = i64;

// =============================================================================
// OrderId
// =============================================================================

/// Provider-issued identifier of a virtual number order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for OrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

// =============================================================================
// UserId
// =============================================================================

/// Identifier of a user record, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// =============================================================================
// CountrySlug
// =============================================================================

/// Provider country identifier in its lowercase slug form (e.g. `pakistan`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CountrySlug(String);

impl CountrySlug {
    /// Create a slug, trimming and lowercasing the input.
    pub fn new(slug: impl AsRef<str>) -> Self {
        Self(slug.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for CountrySlug {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CountrySlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CountrySlug {
    fn from(slug: &str) -> Self {
        Self::new(slug)
    }
}

impl<'de> Deserialize<'de> for CountrySlug {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(CountrySlug::new(raw))
    }
}

// =============================================================================
// ProductCode
// =============================================================================

/// Provider product code for a service (e.g. `whatsapp`, `telegram`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCode(String);

impl ProductCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProductCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

// =============================================================================
// SmsCode (OTP)
// =============================================================================

/// One-time passcode extracted from a received SMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SmsCode(String);

impl SmsCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SmsCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SmsCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

// =============================================================================
// FullNumber
// =============================================================================

/// Phone number as returned by the provider, usually `+` and the dial code
/// followed by the national number (e.g. `+923001234567`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullNumber(String);

impl FullNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits only, without the leading `+`.
    pub fn digits(&self) -> &str {
        self.0.trim().trim_start_matches('+')
    }
}

impl Display for FullNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FullNumber {
    fn from(number: &str) -> Self {
        Self(number.to_string())
    }
}

impl From<String> for FullNumber {
    fn from(number: String) -> Self {
        Self(number)
    }
}

// =============================================================================
// DialCode
// =============================================================================

/// Error when parsing a dial code.
#[derive(Debug, Clone, Error)]
pub enum DialCodeError {
    #[error("dial code must contain only digits")]
    NonDigit,
    #[error("dial code cannot be empty")]
    Empty,
}

/// Country calling code without the leading `+` (e.g. `92` for Pakistan).
///
/// ```rust
/// use genie_otp::DialCode;
///
/// let dc = DialCode::new("+92").unwrap();
/// assert_eq!(dc.to_string(), "92");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DialCode(String);

impl DialCode {
    /// Create a dial code, stripping a leading `+`.
    pub fn new(s: impl AsRef<str>) -> Result<Self, DialCodeError> {
        let n = s.as_ref().trim().trim_start_matches('+');
        if n.is_empty() {
            return Err(DialCodeError::Empty);
        }
        if !n.chars().all(|c| c.is_ascii_digit()) {
            return Err(DialCodeError::NonDigit);
        }
        Ok(Self(n.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DialCode {
    type Err = DialCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for DialCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for DialCode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        DialCode::new(raw).map_err(de::Error::custom)
    }
}

impl Serialize for DialCode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

// =============================================================================
// Number
// =============================================================================

/// Error when splitting a phone number.
#[derive(Debug, Clone, Error)]
pub enum NumberError {
    #[error("number must contain only digits")]
    NonDigit,
    #[error("number must be between 4 and 14 digits")]
    InvalidLength,
    #[error("dial code not found at the beginning of the number")]
    MissingDialCode,
}

/// National part of a phone number, without the dial code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Number(String);

impl Number {
    pub fn new(s: impl AsRef<str>) -> Result<Self, NumberError> {
        let s = s.as_ref().trim();
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(NumberError::NonDigit);
        }
        if !(4..=14).contains(&s.len()) {
            return Err(NumberError::InvalidLength);
        }
        Ok(Self(s.to_string()))
    }

    /// Strip `dial_code` from the front of `full`.
    pub fn from_full_number(full: &FullNumber, dial_code: &DialCode) -> Result<Self, NumberError> {
        let national = full
            .digits()
            .strip_prefix(dial_code.as_str())
            .ok_or(NumberError::MissingDialCode)?;

        Self::new(national)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// OrderStatus
// =============================================================================

/// Order status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Number reserved, waiting for a message.
    Pending,
    /// At least one message arrived.
    Received,
    /// Cancelled by the buyer or the provider.
    Canceled,
    /// The provider's own reservation window elapsed.
    Timeout,
    /// Completed by the buyer.
    Finished,
    /// Number banned by the target service.
    Banned,
    /// Any status this crate does not know about.
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Timeout => "TIMEOUT",
            OrderStatus::Finished => "FINISHED",
            OrderStatus::Banned => "BANNED",
            OrderStatus::Other(raw) => raw.as_str(),
        }
    }

    /// Statuses that end an order without a usable code.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OrderStatus::Canceled | OrderStatus::Timeout | OrderStatus::Banned
        )
    }
}

impl FromStr for OrderStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => OrderStatus::Pending,
            "RECEIVED" => OrderStatus::Received,
            "CANCELED" | "CANCELLED" => OrderStatus::Canceled,
            "TIMEOUT" => OrderStatus::Timeout,
            "FINISHED" => OrderStatus::Finished,
            "BANNED" => OrderStatus::Banned,
            _ => OrderStatus::Other(s.trim().to_string()),
        };
        Ok(status)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(raw.parse().unwrap_or(OrderStatus::Other(raw)))
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

// =============================================================================
// Provider results
// =============================================================================

/// A number reserved at the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasedNumber {
    pub order_id: OrderId,
    pub phone: FullNumber,
}

/// Result of one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCheck {
    pub status: OrderStatus,
    /// Code of the first received message, if any.
    pub code: Option<SmsCode>,
}

impl OrderCheck {
    pub fn pending() -> Self {
        Self {
            status: OrderStatus::Pending,
            code: None,
        }
    }

    pub fn received(code: impl Into<String>) -> Self {
        Self {
            status: OrderStatus::Received,
            code: Some(SmsCode::new(code)),
        }
    }

    pub fn with_status(status: OrderStatus) -> Self {
        Self { status, code: None }
    }

    /// The code, when the order is `RECEIVED` and carries one.
    pub fn received_code(&self) -> Option<&SmsCode> {
        match self.status {
            OrderStatus::Received => self.code.as_ref(),
            _ => None,
        }
    }
}
