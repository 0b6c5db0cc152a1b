//! Voteable FIFO queue
//!
//! Ordering is strictly insertion order. Votes never move an entry; they only
//! decide whether an entry survives when the next track is staged.

use crate::entry::{QueueEntry, Selection, VoteTally};
use jukebox_core::{PatronId, TrackId};

/// What `VoteQueue::add` did with a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Track was not queued yet and has been appended
    Appended,
    /// Track was already queued; the proposal counted as an agree vote
    Voted,
    /// Track was already queued and the patron had already voted on it
    AlreadyVoted,
}

/// Ordered list of track proposals for one room
///
/// ```text
/// front ──► [A  +2 -0]  [B  +1 -1]  [C  +1 -0] ◄── back (add appends here)
/// ```
#[derive(Debug, Clone, Default)]
pub struct VoteQueue {
    entries: Vec<QueueEntry>,

    /// Bumped by every change, so published views can be ordered
    revision: u64,
}

impl VoteQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Propose a track.
    ///
    /// Appends a new entry when the track is not queued yet, otherwise this is
    /// the same as an agree vote by `patron`.
    pub fn add(&mut self, track_id: TrackId, patron: PatronId) -> AddOutcome {
        if self.contains(&track_id) {
            return if self.vote(&track_id, patron, true) {
                AddOutcome::Voted
            } else {
                AddOutcome::AlreadyVoted
            };
        }

        self.entries.push(QueueEntry::new(track_id, patron));
        self.bump();
        AddOutcome::Appended
    }

    /// Vote on a queued track.
    ///
    /// Returns `false` (and changes nothing) if the track is not queued or the
    /// patron already voted on it.
    pub fn vote(&mut self, track_id: &TrackId, patron: PatronId, agree: bool) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.track_id() == track_id) else {
            return false;
        };

        let recorded = entry.record(patron, agree);
        if recorded {
            self.bump();
        }
        recorded
    }

    /// Peek at the front entry without removing it
    pub fn peek_front(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    /// Remove and return the front entry
    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        if self.entries.is_empty() {
            return None;
        }

        let entry = self.entries.remove(0);
        self.bump();
        Some(entry)
    }

    /// Remove a track wherever it sits, keeping the relative order of the rest
    pub fn remove(&mut self, track_id: &TrackId) -> Option<QueueEntry> {
        let index = self.position(track_id)?;
        let entry = self.entries.remove(index);
        self.bump();
        Some(entry)
    }

    /// Pick the track to stage after the one currently playing.
    ///
    /// Scans from the front, removing every rejected entry it meets, and stops
    /// at the first entry that is not rejected. That entry stays queued.
    pub fn select_next(&mut self) -> Selection {
        let mut selection = Selection::default();

        while let Some(front) = self.entries.first() {
            if !front.is_rejected() {
                selection.next = Some(front.track_id().clone());
                break;
            }
            selection.discarded.push(self.entries.remove(0));
        }

        if !selection.discarded.is_empty() {
            self.bump();
        }
        selection
    }

    /// Vote counts for every entry, front to back.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn tallies(&self) -> impl Iterator<Item = VoteTally> + Clone + '_ {
        self.entries.iter().map(QueueEntry::tally)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    pub fn get(&self, track_id: &TrackId) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.track_id() == track_id)
    }

    pub fn position(&self, track_id: &TrackId) -> Option<usize> {
        self.entries.iter().position(|e| e.track_id() == track_id)
    }

    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.position(track_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Monotonic change counter
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
