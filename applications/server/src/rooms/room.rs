//! Per-venue room state.

use jukebox_core::{ConnectionId, DeviceId, PatronId, RoomId, TrackId};
use jukebox_queue::VoteQueue;
use std::collections::HashMap;

/// Access token held by a room, tagged with the flow that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessToken {
    /// Client-credentials token: catalog reads only
    Client(String),
    /// Authorization-code token: catalog reads and player control
    User(String),
}

impl AccessToken {
    pub fn secret(&self) -> &str {
        match self {
            Self::Client(token) | Self::User(token) => token,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

/// Where a room stands in the credential lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPhase {
    Unauthenticated,
    ClientAuthorized,
    UserAuthorized { device_bound: bool },
}

impl CredentialPhase {
    pub fn is_user_authorized(self) -> bool {
        matches!(self, Self::UserAuthorized { .. })
    }
}

/// Credential state of one room. Written only by the credential manager.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<String>,
    /// Milliseconds until the user token is refreshed; may go negative
    pub validity_remaining_ms: i64,
    pub device_id: Option<DeviceId>,
}

impl Credentials {
    pub fn phase(&self) -> CredentialPhase {
        match &self.access_token {
            None => CredentialPhase::Unauthenticated,
            Some(AccessToken::Client(_)) => CredentialPhase::ClientAuthorized,
            Some(AccessToken::User(_)) => CredentialPhase::UserAuthorized {
                device_bound: self.device_id.is_some(),
            },
        }
    }

    /// Token usable for player control
    pub fn user_token(&self) -> Option<&str> {
        self.access_token
            .as_ref()
            .filter(|token| token.is_user())
            .map(AccessToken::secret)
    }
}

/// A venue's playback room.
///
/// Created only by [`RoomRegistry`](super::RoomRegistry); membership is
/// changed only through the registry so its connection index stays in sync.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    pub credentials: Credentials,
    /// Set by the clerk's manual pause; the loop leaves the player alone
    pub paused: bool,
    /// Track picked during the staging window, handed to the player at commit
    pub staged: Option<TrackId>,
    pub queue: VoteQueue,
    members: HashMap<ConnectionId, PatronId>,
}

impl Room {
    pub(super) fn new(id: RoomId) -> Self {
        Self {
            id,
            credentials: Credentials::default(),
            paused: false,
            staged: None,
            queue: VoteQueue::new(),
            members: HashMap::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn member(&self, connection: &ConnectionId) -> Option<&PatronId> {
        self.members.get(connection)
    }

    pub fn members(&self) -> impl Iterator<Item = (&ConnectionId, &PatronId)> {
        self.members.iter()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub(super) fn insert_member(&mut self, connection: ConnectionId, patron: PatronId) {
        self.members.insert(connection, patron);
    }

    pub(super) fn remove_member(&mut self, connection: &ConnectionId) -> Option<PatronId> {
        self.members.remove(connection)
    }
}
