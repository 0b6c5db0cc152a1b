/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jukebox_core::RoomId;
use jukebox_spotify::{RemoteErrorKind, RemoteServiceError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Failures of the credential lifecycle
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    /// The room never completed the authorization-code flow
    #[error("No refresh token held; a clerk must re-authorize")]
    NoRefreshToken,

    #[error("Token exchange rejected: {0}")]
    ExchangeRejected(#[source] RemoteServiceError),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteServiceError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("No playback device bound to room {0}")]
    DeviceNotBound(RoomId),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::DeviceNotBound(ref room) => (
                StatusCode::CONFLICT,
                format!("No playback device available for room {}", room),
            ),
            ServerError::Remote(ref e) => {
                tracing::error!("Remote service error: {}", e);
                let status = match e.kind() {
                    RemoteErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                    RemoteErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                    RemoteErrorKind::NotFound => StatusCode::NOT_FOUND,
                    RemoteErrorKind::DeviceUnavailable => StatusCode::CONFLICT,
                    RemoteErrorKind::Transient => StatusCode::BAD_GATEWAY,
                };
                (status, "Music service error".to_string())
            }
            ServerError::Credential(ref e) => {
                tracing::warn!("Credential error: {}", e);
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            ServerError::Jwt(ref e) => {
                tracing::error!("JWT error: {:?}", e);
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
