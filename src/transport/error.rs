use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Classification of a failed scoring call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    RateLimited,
    Unauthorized,
    Forbidden,
    ServerError,
    NetworkError,
    MalformedResponse,
    Unknown,
}

impl ErrorClass {
    /// Short label for structured logs.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::RateLimited => "rate_limited",
            ErrorClass::Unauthorized => "unauthorized",
            ErrorClass::Forbidden => "forbidden",
            ErrorClass::ServerError => "server_error",
            ErrorClass::NetworkError => "network_error",
            ErrorClass::MalformedResponse => "malformed_response",
            ErrorClass::Unknown => "unknown",
        }
    }

    /// Returns `true` for authentication/authorization failures.
    #[inline]
    pub fn is_auth(&self) -> bool {
        matches!(self, ErrorClass::Unauthorized | ErrorClass::Forbidden)
    }

    /// Maps an HTTP status code to a class.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => ErrorClass::RateLimited,
            401 => ErrorClass::Unauthorized,
            403 => ErrorClass::Forbidden,
            500..=599 => ErrorClass::ServerError,
            _ => ErrorClass::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by a [`Transport`](super::Transport).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("server error: {0}")]
    ServerError(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Unknown(String),
}

impl TransportError {
    /// Returns the error's class.
    pub fn class(&self) -> ErrorClass {
        match self {
            TransportError::RateLimited(_) => ErrorClass::RateLimited,
            TransportError::Unauthorized(_) => ErrorClass::Unauthorized,
            TransportError::Forbidden(_) => ErrorClass::Forbidden,
            TransportError::ServerError(_) => ErrorClass::ServerError,
            TransportError::Network(_) => ErrorClass::NetworkError,
            TransportError::MalformedResponse(_) => ErrorClass::MalformedResponse,
            TransportError::Unknown(_) => ErrorClass::Unknown,
        }
    }

    /// Builds an error of the given class.
    pub fn from_class(class: ErrorClass, message: impl Into<String>) -> Self {
        let message = message.into();
        match class {
            ErrorClass::RateLimited => TransportError::RateLimited(message),
            ErrorClass::Unauthorized => TransportError::Unauthorized(message),
            ErrorClass::Forbidden => TransportError::Forbidden(message),
            ErrorClass::ServerError => TransportError::ServerError(message),
            ErrorClass::NetworkError => TransportError::Network(message),
            ErrorClass::MalformedResponse => TransportError::MalformedResponse(message),
            ErrorClass::Unknown => TransportError::Unknown(message),
        }
    }

    /// Classifies an opaque provider error message.
    ///
    /// Provider clients surface HTTP failures as formatted text, so the status code
    /// and well-known phrases are recovered from the message.
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_lowercase();

        let class = if let Some(status) = find_status_code(&lower) {
            ErrorClass::from_status(status)
        } else if lower.contains("rate limit")
            || lower.contains("rate_limit")
            || lower.contains("too many requests")
            || lower.contains("overloaded")
        {
            ErrorClass::RateLimited
        } else if lower.contains("unauthorized")
            || lower.contains("invalid api key")
            || lower.contains("invalid x-api-key")
            || lower.contains("authentication")
        {
            ErrorClass::Unauthorized
        } else if lower.contains("forbidden") || lower.contains("permission") {
            ErrorClass::Forbidden
        } else if lower.contains("connect")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("dns")
            || lower.contains("connection reset")
        {
            ErrorClass::NetworkError
        } else if lower.contains("internal server error") || lower.contains("bad gateway") {
            ErrorClass::ServerError
        } else {
            ErrorClass::Unknown
        };

        Self::from_class(class, message)
    }
}

/// A standalone 4xx/5xx HTTP status inside a provider message.
static STATUS_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([45]\d\d)\b").expect("status pattern is a valid regex"));

fn find_status_code(text: &str) -> Option<u16> {
    STATUS_CODE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub type TransportResult<T> = Result<T, TransportError>;
