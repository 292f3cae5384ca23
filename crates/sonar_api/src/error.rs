use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

/// Failure taxonomy for one streamed exchange.
///
/// HTTP status failures are raised once, before any stream event is read.
/// Transport failures during iteration surface as [`SonarApiError::Timeout`]
/// or [`SonarApiError::Request`] and are never retried at this layer.
#[derive(Debug)]
pub enum SonarApiError {
    MissingApiKey,
    InvalidBaseUrl(String),
    /// HTTP 401: credentials are wrong; retrying cannot help.
    Authentication(String),
    /// HTTP 402: the account balance is exhausted.
    InsufficientBalance(String),
    /// HTTP 429: caller may retry after backing off.
    RateLimited(String),
    /// Any other >=400 status.
    Status(StatusCode, String),
    Timeout,
    Request(reqwest::Error),
    Serde(JsonError),
    Cancelled,
    Unknown(String),
}

impl SonarApiError {
    /// Maps a pre-stream HTTP status to its failure kind.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = parse_error_message(status, body);
        match status.as_u16() {
            401 => Self::Authentication(message),
            402 => Self::InsufficientBalance(message),
            429 => Self::RateLimited(message),
            _ => Self::Status(status, message),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}

impl ErrorPayloadFields {
    pub fn message_or_type(&self) -> Option<String> {
        let explicit = self
            .message
            .as_deref()
            .and_then(non_empty_string)
            .or_else(|| self.type_.as_deref().and_then(non_empty_string))?;
        Some(explicit.to_owned())
    }
}

impl fmt::Display for SonarApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "API key is required"),
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::Authentication(message) => write!(f, "authentication failed: {message}"),
            Self::InsufficientBalance(message) => write!(f, "insufficient balance: {message}"),
            Self::RateLimited(message) => write!(f, "rate limited: {message}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Timeout => write!(f, "request timed out waiting for the server"),
            Self::Request(error) => write!(f, "network error: {error}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::Cancelled => write!(f, "request was cancelled"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for SonarApiError {}

impl From<reqwest::Error> for SonarApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(error)
        }
    }
}

impl From<JsonError> for SonarApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extract a human-readable message from an error response body, falling
/// back to the raw body and then the status line.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = parsed.value.and_then(|error| error.message_or_type()) {
            return message;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
