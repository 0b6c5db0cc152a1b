//! Credential Lifecycle Manager.
//!
//! Obtains, refreshes and exposes each room's access token and bound output
//! device. Rooms move `Unauthenticated -> ClientAuthorized -> UserAuthorized`;
//! nothing else writes [`Credentials`](crate::rooms::Credentials).

use crate::error::CredentialError;
use crate::rooms::{AccessToken, RoomHandle};
use jukebox_core::DeviceId;
use jukebox_spotify::{MusicService, RemoteServiceError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct CredentialManager {
    service: Arc<dyn MusicService>,
    token_lifetime_ms: i64,
}

impl CredentialManager {
    pub fn new(service: Arc<dyn MusicService>, token_lifetime: Duration) -> Self {
        Self {
            service,
            token_lifetime_ms: token_lifetime.as_millis() as i64,
        }
    }

    pub fn token_lifetime_ms(&self) -> i64 {
        self.token_lifetime_ms
    }

    /// Token for catalog reads.
    ///
    /// Returns whatever token the room already holds (a user token serves
    /// catalog reads too); otherwise runs the client-credentials exchange.
    /// Concurrent exchanges race harmlessly, but a client token never
    /// replaces a user token that landed in the meantime.
    pub async fn ensure_client_token(&self, room: &RoomHandle) -> Result<String, CredentialError> {
        if let Some(token) = &room.lock().await.credentials.access_token {
            return Ok(token.secret().to_string());
        }

        debug!(room = %room.id(), "Requesting client credentials token");
        let grant = self
            .service
            .client_credentials_token()
            .await
            .map_err(CredentialError::ExchangeRejected)?;

        let mut guard = room.lock().await;
        match &guard.credentials.access_token {
            Some(existing) if existing.is_user() => Ok(existing.secret().to_string()),
            _ => {
                guard.credentials.access_token = Some(AccessToken::Client(grant.access_token.clone()));
                Ok(grant.access_token)
            }
        }
    }

    /// Drop a client token the service rejected so the next
    /// [`ensure_client_token`](Self::ensure_client_token) re-exchanges it.
    pub async fn invalidate_client_token(&self, room: &RoomHandle, token: &str) {
        let mut guard = room.lock().await;
        if matches!(&guard.credentials.access_token, Some(AccessToken::Client(held)) if held == token) {
            debug!(room = %room.id(), "Dropping rejected client token");
            guard.credentials.access_token = None;
        }
    }

    /// Trade an authorization code for a user token pair and start the
    /// validity countdown. Returns the new access token.
    pub async fn exchange_authorization_code(
        &self,
        room: &RoomHandle,
        code: &str,
    ) -> Result<String, CredentialError> {
        let grant = self
            .service
            .exchange_authorization_code(code)
            .await
            .map_err(|e| {
                warn!(room = %room.id(), error = %e, "Authorization code exchange failed");
                CredentialError::ExchangeRejected(e)
            })?;

        let mut guard = room.lock().await;
        let credentials = &mut guard.credentials;
        credentials.access_token = Some(AccessToken::User(grant.access_token.clone()));
        if grant.refresh_token.is_some() {
            credentials.refresh_token = grant.refresh_token;
        }
        credentials.validity_remaining_ms = self.token_lifetime_ms;

        info!(room = %room.id(), "Room authorized for playback control");
        Ok(grant.access_token)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Leaves the device binding and the queue untouched whether or not it
    /// succeeds.
    pub async fn refresh(&self, room: &RoomHandle) -> Result<(), CredentialError> {
        let refresh_token = room
            .lock()
            .await
            .credentials
            .refresh_token
            .clone()
            .ok_or(CredentialError::NoRefreshToken)?;

        let grant = self
            .service
            .refresh_access_token(&refresh_token)
            .await
            .map_err(CredentialError::ExchangeRejected)?;

        let mut guard = room.lock().await;
        let credentials = &mut guard.credentials;
        credentials.access_token = Some(AccessToken::User(grant.access_token));
        if let Some(rotated) = grant.refresh_token {
            credentials.refresh_token = Some(rotated);
        }
        credentials.validity_remaining_ms = self.token_lifetime_ms;

        info!(room = %room.id(), "Access token refreshed");
        Ok(())
    }

    /// Bind the first available output device to the room, or record that
    /// none is available.
    pub async fn bind_device(
        &self,
        room: &RoomHandle,
        access_token: &str,
    ) -> Result<Option<DeviceId>, RemoteServiceError> {
        let devices = self.service.devices(access_token).await?;
        let device = devices.into_iter().next().map(|device| device.id);

        match &device {
            Some(id) => info!(room = %room.id(), device = %id, "Bound output device"),
            None => warn!(room = %room.id(), "No output device available"),
        }

        room.lock().await.credentials.device_id = device.clone();
        Ok(device)
    }
}
