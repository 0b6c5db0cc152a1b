//! Session collaborator boundary

use crate::types::{Identity, PatronId, RoomId};
use async_trait::async_trait;

/// Resolves opaque session tokens issued by the user/session service.
///
/// The playback core never stores sessions itself. Implementations decide how
/// tokens are validated (signed claims, a remote lookup, ...); an unknown or
/// expired token simply resolves to `None`.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Resolve a token to the identity it was issued for
    async fn resolve(&self, token: &str) -> Option<Identity>;

    /// Resolve a token to a patron, falling back to the guest identity
    async fn resolve_patron(&self, token: Option<&str>) -> PatronId {
        match token {
            Some(token) if !token.is_empty() => self
                .resolve(token)
                .await
                .map_or_else(PatronId::guest, |identity| identity.patron_id),
            _ => PatronId::guest(),
        }
    }

    /// Resolve a clerk token to the room the clerk is bound to
    async fn resolve_clerk_room(&self, token: &str) -> Option<RoomId> {
        self.resolve(token).await.and_then(|identity| match identity.venue {
            Some(room) if identity.controls(&room) => Some(room),
            _ => None,
        })
    }
}
