//! Response parsing for the 5sim API.

use super::errors::{FiveSimServiceError, parse_five_sim_error};
use serde::de::DeserializeOwned;

/// Unified response type for 5sim API calls.
#[derive(Debug)]
pub enum FiveSimResponse<T> {
    Success(T),
    Error(FiveSimServiceError),
}

impl<T> FiveSimResponse<T> {
    pub fn into_result(self) -> Result<T, FiveSimServiceError> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Error(e) => Err(e),
        }
    }
}

impl<T: DeserializeOwned> FiveSimResponse<T> {
    /// Parse a response from its HTTP status and body text.
    ///
    /// Non-2xx responses are always errors. Successful ones may still carry a
    /// plain-text error phrase; anything else is decoded as JSON, with an
    /// empty body read as `null`.
    pub fn from_parts(status: u16, text: &str) -> Result<Self, serde_json::Error> {
        if !(200..300).contains(&status) {
            return Ok(Self::Error(FiveSimServiceError::from_body(
                Some(status),
                text,
            )));
        }

        if let Some(error) = parse_five_sim_error(text) {
            return Ok(Self::Error(error));
        }

        let body = match text.trim() {
            "" => "null",
            trimmed => trimmed,
        };

        match serde_json::from_str::<T>(body) {
            Ok(data) => Ok(Self::Success(data)),
            // Plain text that is not JSON at all is still a service message.
            Err(_) if !body.starts_with(['{', '[']) && body != "null" => Ok(Self::Error(
                FiveSimServiceError::from_body(Some(status), body),
            )),
            Err(e) => Err(e),
        }
    }
}
