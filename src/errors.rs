//! Trading API error differentiation
//!
//! Parses trading API error responses into structured types so the loop,
//! the CLI and the proxy can log and map them consistently.

use serde::Deserialize;
use thiserror::Error;

/// Errors from a single signed call against the trading API
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transport failure (timeout, DNS, connection refused, ...)
    #[error("network error: {0}")]
    Network(String),
    /// Throttled by the trading API
    #[error("rate limited by trading API ({status}): {message}")]
    RateLimited { status: u16, message: String },
    /// API key or signature rejected
    #[error("authentication failed ({status}): {message}")]
    AuthenticationFailed { status: u16, message: String },
    /// Any other non-2xx response
    #[error("trading API error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body was not the JSON we expected
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Quote response was empty or carried an unusable price
    #[error("market data error: {0}")]
    MarketData(String),
}

/// Errors from submitting an order
#[derive(Debug, Clone, Error)]
pub enum OrderError {
    /// Rejected locally, before any network call
    #[error("invalid order: {0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Fatal startup errors. The trading loop never starts with any of these.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Error body shapes the trading API is known to return
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    detail: Option<String>,
}

impl ApiError {
    /// Classify a non-2xx response
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed
                .error
                .or(parsed.message)
                .or(parsed.detail)
                .or_else(|| parsed.errors.into_iter().find_map(|e| e.detail))
                .unwrap_or_else(|| body.to_string()),
            Err(_) => body.to_string(),
        };

        let lower = message.to_lowercase();

        if status == 429 || lower.contains("rate limit") || lower.contains("too many requests") {
            return ApiError::RateLimited { status, message };
        }

        if status == 401
            || status == 403
            || lower.contains("invalid api key")
            || lower.contains("invalid signature")
        {
            return ApiError::AuthenticationFailed { status, message };
        }

        ApiError::Http {
            status,
            body: message,
        }
    }

    /// Classify a reqwest transport error
    pub fn from_network_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("connection failed".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }

    /// HTTP status reported by the upstream, if there was a response at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RateLimited { status, .. }
            | ApiError::AuthenticationFailed { status, .. }
            | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
