/// ID types for Jukebox entities
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Venue identifier; one playback room exists per venue
    RoomId
);

string_id!(
    /// Opaque track identifier issued by the music service
    TrackId
);

string_id!(
    /// Patron identifier, or the `guest` pseudo-identifier
    PatronId
);

string_id!(
    /// Realtime connection identifier (one per open socket)
    ConnectionId
);

string_id!(
    /// Output device identifier issued by the music service
    DeviceId
);

/// Identifier used for patrons without a valid session
pub const GUEST: &str = "guest";

impl PatronId {
    /// The shared `guest` pseudo-identity
    pub fn guest() -> Self {
        Self(GUEST.to_string())
    }

    pub fn is_guest(&self) -> bool {
        self.0 == GUEST
    }
}

impl ConnectionId {
    /// Generate a new random connection ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl TrackId {
    /// URI form expected by the player endpoints
    pub fn to_uri(&self) -> String {
        format!("spotify:track:{}", self.0)
    }
}
