//! Catalog lookups: track search and track details.

use crate::error::{error_from_response, Endpoint, Result, RemoteServiceError};
use crate::types::{RawTrack, SearchResponse, Track, SEARCH_PAGE_SIZE};
use jukebox_core::TrackId;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Catalog client for the Web API.
pub struct CatalogClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    access_token: &'a str,
}

impl<'a> CatalogClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, access_token: &'a str) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Search tracks by free text.
    ///
    /// An empty query returns no tracks without calling the service.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/search", self.base_url);
        debug!(url = %url, query = %query, "Searching tracks");

        let limit = SEARCH_PAGE_SIZE.to_string();
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.access_token)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let search: SearchResponse = response.json().await.map_err(|e| {
                RemoteServiceError::Transient(format!("Failed to parse search response: {}", e))
            })?;

            let tracks: Vec<Track> = search
                .tracks
                .items
                .into_iter()
                .filter_map(RawTrack::into_track)
                .take(SEARCH_PAGE_SIZE)
                .collect();

            debug!(results = tracks.len(), "Search complete");
            Ok(tracks)
        } else {
            Err(error_from_response(response, Endpoint::Catalog).await)
        }
    }

    /// Get a single track by ID.
    ///
    /// The id travels as a single percent-encoded path segment, so it can
    /// never address another endpoint.
    pub async fn get_track(&self, track_id: &TrackId) -> Result<Track> {
        let url = self.track_url(track_id)?;
        debug!(url = %url, track_id = %track_id, "Fetching track");

        let response = self
            .http
            .get(url)
            .bearer_auth(self.access_token)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let raw: RawTrack = response.json().await.map_err(|e| {
                RemoteServiceError::Transient(format!("Failed to parse track response: {}", e))
            })?;

            raw.into_track()
                .ok_or_else(|| RemoteServiceError::NotFound(format!("Track {} has no id", track_id)))
        } else {
            Err(error_from_response(response, Endpoint::Catalog).await)
        }
    }

    fn track_url(&self, track_id: &TrackId) -> Result<Url> {
        let id = track_id.as_str();
        if matches!(id, "" | "." | "..") {
            return Err(RemoteServiceError::NotFound(format!("Invalid track id {:?}", id)));
        }

        let mut url = Url::parse(self.base_url)
            .map_err(|e| RemoteServiceError::Transient(format!("Invalid API url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|()| RemoteServiceError::Transient("API url cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(["v1", "tracks", id]);
        Ok(url)
    }
}
