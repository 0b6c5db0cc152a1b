/// Resolved identity of whoever holds a session token
use super::{PatronId, RoomId};
use serde::{Deserialize, Serialize};

/// Role attached to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular venue patron: may enqueue and vote
    Patron,
    /// Venue staff: may additionally authorize and control playback
    Clerk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub patron_id: PatronId,
    pub role: Role,
    /// Venue the clerk is bound to (patrons carry none)
    pub venue: Option<RoomId>,
}

impl Identity {
    pub fn patron(patron_id: impl Into<PatronId>) -> Self {
        Self {
            patron_id: patron_id.into(),
            role: Role::Patron,
            venue: None,
        }
    }

    pub fn clerk(patron_id: impl Into<PatronId>, venue: impl Into<RoomId>) -> Self {
        Self {
            patron_id: patron_id.into(),
            role: Role::Clerk,
            venue: Some(venue.into()),
        }
    }

    /// True when this identity is the controlling clerk of `room`
    pub fn controls(&self, room: &RoomId) -> bool {
        self.role == Role::Clerk && self.venue.as_ref() == Some(room)
    }
}
