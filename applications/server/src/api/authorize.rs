/// Authorization redirect routes - clerk login and service callback
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    response::Redirect,
};
use jukebox_core::RoomId;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Clerk session token
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// Room id passed through the authorization page
    pub state: Option<String>,
    /// Set by the service when the user declined
    pub error: Option<String>,
}

/// GET /login - Send a clerk to the service's authorization page
pub async fn login(State(app_state): State<AppState>, Query(query): Query<LoginQuery>) -> Redirect {
    let Some(token) = query.token.filter(|token| !token.is_empty()) else {
        tracing::debug!("Login without session token");
        return Redirect::to(&app_state.frontend_url);
    };

    match app_state.sessions.resolve_clerk_room(&token).await {
        Some(room) => {
            tracing::info!(room = %room, "Redirecting clerk to authorization page");
            Redirect::to(&app_state.service.authorize_url(room.as_str()))
        }
        None => {
            tracing::warn!("Login rejected: token does not belong to a clerk");
            Redirect::to(&app_state.frontend_url)
        }
    }
}

/// GET /callback - Finish authorization, bind a device and open the room page
pub async fn callback(
    State(app_state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    if let Some(error) = query.error {
        return Err(ServerError::BadRequest(format!("Authorization declined: {}", error)));
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Missing authorization code".to_string()))?;
    let room_id = query
        .state
        .filter(|state| !state.is_empty())
        .map(RoomId::new)
        .ok_or_else(|| ServerError::BadRequest("Missing room state".to_string()))?;

    let handle = app_state.registry.get_or_create(&room_id).await;
    let token = app_state
        .credentials
        .exchange_authorization_code(&handle, &code)
        .await?;

    match app_state.credentials.bind_device(&handle, &token).await {
        Ok(Some(device)) => {
            if let Err(e) = app_state.service.transfer_playback(&token, &device, true).await {
                tracing::warn!(room = %room_id, device = %device, "Playback transfer failed: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(room = %room_id, "Device lookup failed: {}", e),
    }

    Ok(Redirect::to(&format!(
        "{}/shop/{}",
        app_state.frontend_url, room_id
    )))
}
