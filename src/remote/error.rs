//! Failed REST calls and their conversion into `ConsoleError`.

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::ConsoleError;

use super::AsHttpError;

/// A failed request, with HTTP status information kept for retry decisions.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code, absent when no response arrived
    pub status: Option<StatusCode>,
    /// Retry-After header value in seconds, if available
    pub retry_after: Option<u64>,
    /// Machine-readable code from the error body
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    /// A failure without a response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            retry_after: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_status(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Self::new(message)
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Build the error for a non-success response from its status and body.
    ///
    /// The message comes from the structured body when there is one and falls
    /// back to the status reason phrase.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match parse_error_body(body) {
            Some(ErrorBody { message, code }) => {
                let message = message.unwrap_or_else(|| reason(status));
                let error = Self::with_status(message, status);
                match code {
                    Some(code) => error.with_code(code),
                    None => error,
                }
            }
            None => Self::with_status(reason(status), status),
        }
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status.as_u16(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl AsHttpError for ApiError {
    fn as_http_error(&self) -> Option<(StatusCode, Option<u64>)> {
        self.status.map(|s| (s, self.retry_after))
    }

    fn is_transient(&self) -> bool {
        match self.status {
            Some(status) => status.is_server_error(),
            None => true,
        }
    }

    fn is_rate_limited(&self) -> bool {
        self.status == Some(StatusCode::TOO_MANY_REQUESTS)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {error}")
        } else if error.is_connect() {
            format!("could not connect: {error}")
        } else {
            error.to_string()
        };
        match error.status() {
            Some(status) => Self::with_status(message, status),
            None => Self::new(message),
        }
    }
}

impl From<ApiError> for ConsoleError {
    fn from(error: ApiError) -> Self {
        match error.status {
            Some(status) => ConsoleError::Remote {
                status: status.as_u16(),
                code: error.code,
                message: error.message,
            },
            None => ConsoleError::Transport(error.message),
        }
    }
}

/// Message and code pulled from an error response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub code: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawErrorBody {
    Nested { error: RawErrorDetail },
    Text { error: String },
    Flat(RawErrorDetail),
}

#[derive(Deserialize)]
struct RawErrorDetail {
    message: Option<String>,
    #[serde(default, deserialize_with = "code_as_string")]
    code: Option<String>,
}

/// Codes arrive as strings or numbers.
fn code_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parse `{"message", "code"}`, `{"error": {"message", "code"}}` or
/// `{"error": "text"}`. Returns `None` for anything else, including bodies
/// that carry neither a message nor a code.
pub fn parse_error_body(body: &str) -> Option<ErrorBody> {
    let parsed: RawErrorBody = serde_json::from_str(body).ok()?;
    let (message, code) = match parsed {
        RawErrorBody::Nested { error } => (error.message, error.code),
        RawErrorBody::Text { error } => (Some(error), None),
        RawErrorBody::Flat(detail) => (detail.message, detail.code),
    };
    let message = message.filter(|m| !m.trim().is_empty());
    if message.is_none() && code.is_none() {
        return None;
    }
    Some(ErrorBody { message, code })
}
