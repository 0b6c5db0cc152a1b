//! Error types for the music service client.

use reqwest::{header::RETRY_AFTER, Response, StatusCode};
use std::fmt;
use thiserror::Error;

/// Errors returned by the music service.
///
/// The client never retries; callers decide whether and how to recover.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteServiceError {
    /// Token missing, expired or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The target output device is gone or no device is active
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Network failure, server error or unreadable response
    #[error("Transient failure: {0}")]
    Transient(String),
}

/// Coarse classification of a [`RemoteServiceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    Unauthorized,
    RateLimited,
    NotFound,
    DeviceUnavailable,
    Transient,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate-limited",
            Self::NotFound => "not-found",
            Self::DeviceUnavailable => "device-unavailable",
            Self::Transient => "transient",
        };
        f.write_str(name)
    }
}

impl RemoteServiceError {
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::Unauthorized(_) => RemoteErrorKind::Unauthorized,
            Self::RateLimited { .. } => RemoteErrorKind::RateLimited,
            Self::NotFound(_) => RemoteErrorKind::NotFound,
            Self::DeviceUnavailable(_) => RemoteErrorKind::DeviceUnavailable,
            Self::Transient(_) => RemoteErrorKind::Transient,
        }
    }

    pub fn is_device_unavailable(&self) -> bool {
        matches!(self, Self::DeviceUnavailable(_))
    }
}

impl From<reqwest::Error> for RemoteServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Transient(format!("Failed to parse response: {}", err))
        } else {
            Self::Transient(err.to_string())
        }
    }
}

/// Errors building a [`SpotifyClient`](crate::SpotifyClient).
#[derive(Error, Debug)]
pub enum ClientBuildError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Which kind of endpoint produced an error response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    /// Accounts service token exchange
    Token,
    /// Catalog lookups (search, tracks)
    Catalog,
    /// Player commands and player state
    Player,
}

/// Reason code the Web API attaches when no device can take a command
const NO_ACTIVE_DEVICE: &str = "NO_ACTIVE_DEVICE";

/// Convert a non-success response into a typed error.
pub(crate) async fn error_from_response(response: Response, endpoint: Endpoint) -> RemoteServiceError {
    let status = response.status();
    let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();

    classify(status, retry_after_secs, &body, endpoint)
}

pub(crate) fn classify(
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: &str,
    endpoint: Endpoint,
) -> RemoteServiceError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteServiceError::Unauthorized(message),
        StatusCode::BAD_REQUEST if endpoint == Endpoint::Token => {
            RemoteServiceError::Unauthorized(message)
        }
        StatusCode::TOO_MANY_REQUESTS => RemoteServiceError::RateLimited {
            retry_after_secs: retry_after_secs.unwrap_or(1),
        },
        StatusCode::NOT_FOUND if endpoint == Endpoint::Player || body.contains(NO_ACTIVE_DEVICE) => {
            RemoteServiceError::DeviceUnavailable(message)
        }
        StatusCode::NOT_FOUND => RemoteServiceError::NotFound(message),
        _ => RemoteServiceError::Transient(message),
    }
}

/// Result type for music service operations.
pub type Result<T> = std::result::Result<T, RemoteServiceError>;
