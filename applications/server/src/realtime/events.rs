//! Wire events of the room socket, tagged by `type`.

use crate::services::{PlaybackAction, QueueSnapshot};
use jukebox_core::{RoomId, TrackId};
use jukebox_spotify::Track;
use serde::{Deserialize, Serialize};

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    Join {
        room_id: RoomId,
        #[serde(default)]
        token: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Leave { room_id: RoomId },
    #[serde(rename_all = "camelCase")]
    Search { room_id: RoomId, query: String },
    #[serde(rename_all = "camelCase")]
    EnqueueRequest {
        #[serde(default)]
        token: Option<String>,
        room_id: RoomId,
        track_id: TrackId,
    },
    #[serde(rename_all = "camelCase")]
    Vote {
        #[serde(default)]
        token: Option<String>,
        room_id: RoomId,
        track_id: TrackId,
        agree: bool,
    },
    #[serde(rename_all = "camelCase")]
    PlayPause {
        token: String,
        room_id: RoomId,
        action: PlaybackAction,
    },
}

/// Events sent to room members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    Joined {
        room_id: RoomId,
        /// True until a clerk has authorized playback and a device is bound
        needs_authorization: bool,
    },
    /// `tracks` is null for an empty query
    #[serde(rename_all = "camelCase")]
    SearchResults {
        room_id: RoomId,
        tracks: Option<Vec<Track>>,
    },
    QueueSnapshot(QueueSnapshot),
    #[serde(rename_all = "camelCase")]
    CurrentTrack { room_id: RoomId, track: Track },
    #[serde(rename_all = "camelCase")]
    PlayerStateChanged {
        room_id: RoomId,
        action: PlaybackAction,
    },
}
