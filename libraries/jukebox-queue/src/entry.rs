//! Queue entries and vote tallies

use jukebox_core::{PatronId, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A proposed track together with the patrons who voted on it
///
/// A patron appears in at most one of the two sets, and the first vote a
/// patron casts on an entry is final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    track_id: TrackId,
    agree: BTreeSet<PatronId>,
    disagree: BTreeSet<PatronId>,
}

impl QueueEntry {
    /// New entry proposed by `patron`, who implicitly agrees with it
    pub fn new(track_id: TrackId, patron: PatronId) -> Self {
        Self {
            track_id,
            agree: BTreeSet::from([patron]),
            disagree: BTreeSet::new(),
        }
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    pub fn agree_count(&self) -> usize {
        self.agree.len()
    }

    pub fn disagree_count(&self) -> usize {
        self.disagree.len()
    }

    pub fn agrees(&self, patron: &PatronId) -> bool {
        self.agree.contains(patron)
    }

    pub fn disagrees(&self, patron: &PatronId) -> bool {
        self.disagree.contains(patron)
    }

    /// Whether `patron` has already voted on this entry either way
    pub fn has_voted(&self, patron: &PatronId) -> bool {
        self.agrees(patron) || self.disagrees(patron)
    }

    /// Entries with at least as many disagree votes as agree votes are
    /// dropped when the next track is staged.
    pub fn is_rejected(&self) -> bool {
        self.disagree.len() >= self.agree.len()
    }

    /// Record a vote. Returns `false` when the patron had already voted.
    pub(crate) fn record(&mut self, patron: PatronId, agree: bool) -> bool {
        if self.has_voted(&patron) {
            return false;
        }

        if agree {
            self.agree.insert(patron)
        } else {
            self.disagree.insert(patron)
        }
    }

    pub fn tally(&self) -> VoteTally {
        VoteTally {
            track_id: self.track_id.clone(),
            agree: self.agree_count(),
            disagree: self.disagree_count(),
        }
    }
}

/// Vote counts for one entry, in the shape published to room members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub track_id: TrackId,
    pub agree: usize,
    pub disagree: usize,
}

/// Result of scanning the queue for the next track to stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Rejected entries removed from the front of the queue
    pub discarded: Vec<QueueEntry>,
    /// First surviving entry, still in the queue
    pub next: Option<TrackId>,
}
