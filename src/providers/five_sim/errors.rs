//! Error types for the 5sim provider.

use crate::errors::RetryableError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::warn;

/// Error messages returned by the 5sim API.
///
/// 5sim answers failures with short lowercase phrases (`no free phones`,
/// `order not found`), sometimes wrapped in JSON as `message` or `msg`.
#[derive(Debug, Clone, PartialEq)]
pub enum FiveSimErrorCode {
    // === Transient ===
    /// No numbers available for the product in the country.
    NoFreePhones,
    /// Provider side outage.
    ServerOffline,
    /// HTTP 429.
    RateLimited,

    // === Account ===
    /// Provider account balance too low.
    NotEnoughUserBalance,
    /// Provider account rating too low to buy.
    NotEnoughRating,
    /// HTTP 401, bad or missing API key.
    Unauthorized,

    // === Request ===
    SelectCountry,
    SelectOperator,
    BadCountry,
    BadOperator,
    NoProduct,

    // === Order ===
    OrderNotFound,
    OrderExpired,
    /// A message already arrived, cancelling is refused.
    OrderHasSms,
    HostingOrder,

    /// Any other message.
    Unknown { raw: String },
}

static KNOWN_MESSAGES: Lazy<Vec<(Regex, FiveSimErrorCode)>> = Lazy::new(|| {
    [
        (r"^no free phones", FiveSimErrorCode::NoFreePhones),
        (r"^server offline", FiveSimErrorCode::ServerOffline),
        (r"^not enough (user )?balance", FiveSimErrorCode::NotEnoughUserBalance),
        (r"^not enough rating", FiveSimErrorCode::NotEnoughRating),
        (r"^select country", FiveSimErrorCode::SelectCountry),
        (r"^select operator", FiveSimErrorCode::SelectOperator),
        (r"^bad country", FiveSimErrorCode::BadCountry),
        (r"^bad operator", FiveSimErrorCode::BadOperator),
        (r"^(no|bad) product", FiveSimErrorCode::NoProduct),
        (r"^order not found", FiveSimErrorCode::OrderNotFound),
        (r"^order expired", FiveSimErrorCode::OrderExpired),
        (r"^order has sms", FiveSimErrorCode::OrderHasSms),
        (r"^hosting order", FiveSimErrorCode::HostingOrder),
    ]
    .into_iter()
    .filter_map(|(pattern, code)| {
        Regex::new(&format!("(?i){pattern}"))
            .ok()
            .map(|re| (re, code))
    })
    .collect()
});

impl FiveSimErrorCode {
    /// The API message this code stands for.
    pub fn code_name(&self) -> &str {
        match self {
            Self::NoFreePhones => "no free phones",
            Self::ServerOffline => "server offline",
            Self::RateLimited => "too many requests",
            Self::NotEnoughUserBalance => "not enough user balance",
            Self::NotEnoughRating => "not enough rating",
            Self::Unauthorized => "unauthorized",
            Self::SelectCountry => "select country",
            Self::SelectOperator => "select operator",
            Self::BadCountry => "bad country",
            Self::BadOperator => "bad operator",
            Self::NoProduct => "no product",
            Self::OrderNotFound => "order not found",
            Self::OrderExpired => "order expired",
            Self::OrderHasSms => "order has sms",
            Self::HostingOrder => "hosting order",
            Self::Unknown { raw } => raw.as_str(),
        }
    }

    /// Returns human-readable description.
    pub fn description(&self) -> String {
        match self {
            Self::NoFreePhones => "No free phones".to_string(),
            Self::ServerOffline => "Server offline".to_string(),
            Self::RateLimited => "Too many requests".to_string(),
            Self::NotEnoughUserBalance => "Not enough provider balance".to_string(),
            Self::NotEnoughRating => "Not enough provider rating".to_string(),
            Self::Unauthorized => "Invalid API key".to_string(),
            Self::SelectCountry => "Country not selected".to_string(),
            Self::SelectOperator => "Operator not selected".to_string(),
            Self::BadCountry => "Unknown country".to_string(),
            Self::BadOperator => "Unknown operator".to_string(),
            Self::NoProduct => "Unknown product".to_string(),
            Self::OrderNotFound => "Order not found".to_string(),
            Self::OrderExpired => "Order expired".to_string(),
            Self::OrderHasSms => "Order already received an SMS".to_string(),
            Self::HostingOrder => "Hosting order".to_string(),
            Self::Unknown { raw } => raw.clone(),
        }
    }

    /// Classify a message. Unrecognized text becomes [`FiveSimErrorCode::Unknown`].
    pub fn from_message(message: &str) -> Self {
        let s = message.trim();
        KNOWN_MESSAGES
            .iter()
            .find(|(re, _)| re.is_match(s))
            .map(|(_, code)| code.clone())
            .unwrap_or_else(|| Self::Unknown { raw: s.to_string() })
    }

    /// Parse a known error phrase; `None` when the text is not one.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match Self::from_message(raw) {
            Self::Unknown { .. } => None,
            code => Some(code),
        }
    }

    /// Map an HTTP status that carries no usable message.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(Self::Unauthorized),
            429 => Some(Self::RateLimited),
            503 => Some(Self::ServerOffline),
            _ => None,
        }
    }

    /// Returns true if this error is transient and the request should be repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerOffline | Self::RateLimited)
    }

    /// Returns true if a fresh operation might succeed.
    pub fn should_retry_operation(&self) -> bool {
        match self {
            Self::NoFreePhones | Self::ServerOffline | Self::RateLimited => true,
            Self::NotEnoughUserBalance
            | Self::NotEnoughRating
            | Self::Unauthorized
            | Self::SelectCountry
            | Self::SelectOperator
            | Self::BadCountry
            | Self::BadOperator
            | Self::NoProduct
            | Self::OrderNotFound
            | Self::OrderExpired
            | Self::OrderHasSms
            | Self::HostingOrder => false,
            Self::Unknown { .. } => false,
        }
    }
}

impl Display for FiveSimErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_name())
    }
}

/// Error returned by the 5sim service.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FiveSimServiceError {
    /// Classified error.
    pub code: FiveSimErrorCode,
    /// HTTP status, if the error came with a non-success one.
    pub status: Option<u16>,
    /// Message as reported by the service, fit for end users.
    pub message: String,
    /// Original raw response text.
    pub raw: String,
}

impl FiveSimServiceError {
    pub fn new(code: FiveSimErrorCode, status: Option<u16>, message: String, raw: String) -> Self {
        Self {
            code,
            status,
            message,
            raw,
        }
    }

    /// Build from a failed response body.
    ///
    /// The message is taken from a JSON `message` or `msg` field when present,
    /// the raw text otherwise, and `HTTP <status>` for an empty body.
    pub fn from_body(status: Option<u16>, body: &str) -> Self {
        let message = extract_message(body)
            .or_else(|| status.map(|s| format!("HTTP {s}")))
            .unwrap_or_else(|| "empty response".to_string());

        let code = match FiveSimErrorCode::from_raw(&message) {
            Some(code) => code,
            None => status
                .and_then(FiveSimErrorCode::from_status)
                .unwrap_or_else(|| FiveSimErrorCode::Unknown {
                    raw: message.clone(),
                }),
        };

        let error = Self::new(code, status, message, body.to_string());

        #[cfg(feature = "tracing")]
        warn!(
            code = %error.code,
            status = ?error.status,
            message = %error.message,
            "5sim service returned error"
        );

        error
    }
}

/// Pull a human message out of an error body.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let field = value
            .get("message")
            .or_else(|| value.get("msg"))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|m| !m.is_empty());
        if let Some(message) = field {
            return Some(message.to_string());
        }
    }
    Some(trimmed.to_string())
}

/// Recognize a plain-text error phrase in an otherwise successful response.
pub(crate) fn parse_five_sim_error(raw: &str) -> Option<FiveSimServiceError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return None;
    }
    FiveSimErrorCode::from_raw(trimmed)?;
    Some(FiveSimServiceError::from_body(None, trimmed))
}

/// Main error type for 5sim client operations.
#[derive(Debug, Error)]
pub enum FiveSimError {
    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Invalid API base URL.
    #[error("Invalid 5sim API URL: {0}")]
    InvalidUrl(#[source] url::ParseError),

    /// The base URL cannot carry path segments.
    #[error("5sim API URL cannot be a base: {url}")]
    CannotBeABase { url: String },

    /// `FIVESIM_API_KEY` missing from the environment.
    #[error("Missing environment variable {name}")]
    MissingEnv { name: &'static str },

    /// Failed to send HTTP request.
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("Failed to read response: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// 5sim service error.
    #[error("{0}")]
    Service(#[source] FiveSimServiceError),

    /// Successful response without an order in it.
    #[error("No usable payload in 5sim response for {operation}")]
    EmptyPayload { operation: &'static str },

    /// Failed to deserialize JSON response.
    #[error("Failed to deserialize JSON response: {0}")]
    DeserializeJson(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FiveSimError>;

impl FiveSimError {
    /// Service error code, when this is a service error.
    pub fn code(&self) -> Option<&FiveSimErrorCode> {
        match self {
            FiveSimError::Service(error) => Some(&error.code),
            _ => None,
        }
    }
}

impl RetryableError for FiveSimError {
    fn is_retryable(&self) -> bool {
        match self {
            FiveSimError::Service(error) => error.code.is_retryable(),
            FiveSimError::HttpRequest(_) => true,
            FiveSimError::BuildHttpClient(_)
            | FiveSimError::InvalidUrl(_)
            | FiveSimError::CannotBeABase { .. }
            | FiveSimError::MissingEnv { .. }
            | FiveSimError::ParseResponse(_)
            | FiveSimError::EmptyPayload { .. }
            | FiveSimError::DeserializeJson(_) => false,
        }
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            FiveSimError::Service(error) => error.code.should_retry_operation(),
            FiveSimError::HttpRequest(_) => true,
            FiveSimError::BuildHttpClient(_)
            | FiveSimError::InvalidUrl(_)
            | FiveSimError::CannotBeABase { .. }
            | FiveSimError::MissingEnv { .. }
            | FiveSimError::ParseResponse(_)
            | FiveSimError::EmptyPayload { .. }
            | FiveSimError::DeserializeJson(_) => false,
        }
    }
}
