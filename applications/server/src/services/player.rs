/// Player control - command dispatch with device-loss recovery
use crate::credentials::CredentialManager;
use crate::error::{Result, ServerError};
use crate::rooms::RoomHandle;
use jukebox_core::{DeviceId, TrackId};
use jukebox_spotify::{MusicService, RemoteServiceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A command for a room's remote player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Replace whatever is playing with this track
    Play(TrackId),
    /// Add this track to the player's up-next queue
    Enqueue(TrackId),
    Resume,
    Pause,
}

impl PlayerCommand {
    /// Whether playback should run after moving to a new device
    fn plays_after_transfer(&self) -> bool {
        !matches!(self, Self::Pause)
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Play(track) => write!(f, "play {}", track),
            Self::Enqueue(track) => write!(f, "enqueue {}", track),
            Self::Resume => f.write_str("resume"),
            Self::Pause => f.write_str("pause"),
        }
    }
}

/// Clerk's manual play/pause action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackAction {
    Resume,
    Pause,
}

pub struct PlayerControl {
    service: Arc<dyn MusicService>,
    credentials: Arc<CredentialManager>,
}

impl PlayerControl {
    pub fn new(service: Arc<dyn MusicService>, credentials: Arc<CredentialManager>) -> Self {
        Self {
            service,
            credentials,
        }
    }

    /// Send `command` to the room's bound device.
    ///
    /// When the device is gone (or none is bound) the available devices are
    /// re-queried, playback is transferred to the first one and the command is
    /// retried exactly once.
    pub async fn send(&self, room: &RoomHandle, token: &str, command: &PlayerCommand) -> Result<()> {
        let device = room.lock().await.credentials.device_id.clone();

        let first_attempt = match &device {
            Some(device) => self.dispatch(token, device, command).await,
            None => Err(RemoteServiceError::DeviceUnavailable(
                "no device bound".to_string(),
            )),
        };

        match first_attempt {
            Ok(()) => Ok(()),
            Err(e) if e.is_device_unavailable() => {
                warn!(room = %room.id(), command = %command, error = %e, "Device unavailable, recovering");
                let device = self.recover(room, token, command).await?;
                self.dispatch(token, &device, command).await?;
                info!(room = %room.id(), device = %device, command = %command, "Command succeeded after device recovery");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Clerk play/pause.
    ///
    /// Returns the applied action, or `None` when the room has no player to
    /// drive. The paused flag is aligned with the reported player state first
    /// so a failed command leaves it truthful.
    pub async fn play_pause(
        &self,
        room: &RoomHandle,
        action: PlaybackAction,
    ) -> Result<Option<PlaybackAction>> {
        let (token, device) = {
            let guard = room.lock().await;
            (
                guard.credentials.user_token().map(str::to_owned),
                guard.credentials.device_id.clone(),
            )
        };

        let (Some(token), Some(_)) = (token, device) else {
            info!(room = %room.id(), action = ?action, "No device bound, ignoring play/pause");
            return Ok(None);
        };

        let state = self.service.playback_state(&token).await?;

        if let Some(state) = &state {
            room.lock().await.paused = !state.is_playing;
        }

        match (action, &state) {
            (_, None) => debug!(room = %room.id(), "Nothing loaded on the player"),
            (PlaybackAction::Resume, Some(_)) => {
                self.send(room, &token, &PlayerCommand::Resume).await?;
            }
            (PlaybackAction::Pause, Some(state)) if state.is_playing => {
                self.send(room, &token, &PlayerCommand::Pause).await?;
            }
            (PlaybackAction::Pause, Some(_)) => debug!(room = %room.id(), "Player already paused"),
        }

        room.lock().await.paused = action == PlaybackAction::Pause;
        info!(room = %room.id(), action = ?action, "Applied manual playback action");
        Ok(Some(action))
    }

    async fn recover(&self, room: &RoomHandle, token: &str, command: &PlayerCommand) -> Result<DeviceId> {
        let device = self
            .credentials
            .bind_device(room, token)
            .await?
            .ok_or_else(|| ServerError::DeviceNotBound(room.id().clone()))?;

        self.service
            .transfer_playback(token, &device, command.plays_after_transfer())
            .await?;

        Ok(device)
    }

    async fn dispatch(
        &self,
        token: &str,
        device: &DeviceId,
        command: &PlayerCommand,
    ) -> jukebox_spotify::Result<()> {
        match command {
            PlayerCommand::Play(track) => self.service.play_track(token, device, track).await,
            PlayerCommand::Enqueue(track) => self.service.enqueue(token, device, track).await,
            PlayerCommand::Resume => self.service.resume(token, device).await,
            PlayerCommand::Pause => self.service.pause(token, device).await,
        }
    }
}
