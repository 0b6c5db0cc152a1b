//! Player endpoints: state, devices and playback commands.

use crate::error::{error_from_response, Endpoint, Result, RemoteServiceError};
use crate::types::{Device, DevicesResponse, PlayRequest, PlaybackState, RawDevice, RawPlayback, TransferRequest};
use jukebox_core::{DeviceId, TrackId};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;

/// Player client for the Web API, acting on behalf of an authorized user.
pub struct PlayerClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    access_token: &'a str,
}

impl<'a> PlayerClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, access_token: &'a str) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/me/player{}", self.base_url, path)
    }

    /// Current playback state. `204 No Content` means nothing is loaded.
    pub async fn state(&self) -> Result<Option<PlaybackState>> {
        let url = self.url("");
        debug!(url = %url, "Fetching playback state");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.access_token)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if status.is_success() {
            let raw: RawPlayback = response.json().await.map_err(|e| {
                RemoteServiceError::Transient(format!("Failed to parse playback state: {}", e))
            })?;
            Ok(Some(raw.into()))
        } else {
            Err(error_from_response(response, Endpoint::Player).await)
        }
    }

    /// Devices the user can currently play on.
    pub async fn devices(&self) -> Result<Vec<Device>> {
        let url = self.url("/devices");
        debug!(url = %url, "Listing devices");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.access_token)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let list: DevicesResponse = response.json().await.map_err(|e| {
                RemoteServiceError::Transient(format!("Failed to parse device list: {}", e))
            })?;
            let devices: Vec<Device> = list
                .devices
                .into_iter()
                .filter_map(RawDevice::into_device)
                .collect();
            debug!(count = devices.len(), "Devices listed");
            Ok(devices)
        } else {
            Err(error_from_response(response, Endpoint::Player).await)
        }
    }

    /// Start `track_id` on `device`, replacing the current context.
    pub async fn play(&self, device: &DeviceId, track_id: &TrackId) -> Result<()> {
        let url = self.url("/play");
        debug!(url = %url, device = %device, track_id = %track_id, "Starting track");

        let body = PlayRequest {
            uris: vec![track_id.to_uri()],
        };
        let request = self
            .http
            .put(&url)
            .query(&[("device_id", device.as_str())])
            .json(&body);

        self.send_command(request).await
    }

    /// Resume whatever is loaded on `device`.
    pub async fn resume(&self, device: &DeviceId) -> Result<()> {
        let url = self.url("/play");
        debug!(url = %url, device = %device, "Resuming playback");

        let request = self
            .http
            .put(&url)
            .query(&[("device_id", device.as_str())])
            .header(reqwest::header::CONTENT_LENGTH, 0);

        self.send_command(request).await
    }

    pub async fn pause(&self, device: &DeviceId) -> Result<()> {
        let url = self.url("/pause");
        debug!(url = %url, device = %device, "Pausing playback");

        let request = self
            .http
            .put(&url)
            .query(&[("device_id", device.as_str())])
            .header(reqwest::header::CONTENT_LENGTH, 0);

        self.send_command(request).await
    }

    /// Move playback to `device`.
    pub async fn transfer(&self, device: &DeviceId, play: bool) -> Result<()> {
        let url = self.url("");
        debug!(url = %url, device = %device, play, "Transferring playback");

        let body = TransferRequest {
            device_ids: vec![device.as_str().to_string()],
            play,
        };
        let request = self.http.put(&url).json(&body);

        self.send_command(request).await
    }

    /// Append `track_id` to the player's up-next queue.
    pub async fn enqueue(&self, device: &DeviceId, track_id: &TrackId) -> Result<()> {
        let url = self.url("/queue");
        debug!(url = %url, device = %device, track_id = %track_id, "Queueing track on player");

        let uri = track_id.to_uri();
        let request = self
            .http
            .post(&url)
            .query(&[("uri", uri.as_str()), ("device_id", device.as_str())])
            .header(reqwest::header::CONTENT_LENGTH, 0);

        self.send_command(request).await
    }

    /// Commands answer 200, 202 or 204 with no body of interest.
    async fn send_command(&self, request: RequestBuilder) -> Result<()> {
        let response = request.bearer_auth(self.access_token).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response, Endpoint::Player).await)
        }
    }
}
