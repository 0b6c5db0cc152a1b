//! Jukebox - Vote Queue
//!
//! The shared, voteable track queue of a playback room.
//!
//! This crate provides:
//! - Insertion-ordered queue of track proposals (duplicates fold into votes)
//! - Per-entry agree/disagree voter sets with sticky first votes
//! - The staging scan that drops rejected entries ahead of the next track
//! - Lazy vote tallies for publishing
//!
//! It performs no I/O; enriching tallies with track metadata is left to the
//! caller.
//!
//! # Example
//!
//! ```rust
//! use jukebox_core::{PatronId, TrackId};
//! use jukebox_queue::VoteQueue;
//!
//! let mut queue = VoteQueue::new();
//! queue.add(TrackId::new("a"), PatronId::new("alice"));
//! queue.add(TrackId::new("b"), PatronId::new("alice"));
//! queue.vote(&TrackId::new("a"), PatronId::new("bob"), false);
//!
//! // "a" is tied 1-1 and gets dropped, "b" is staged
//! let selection = queue.select_next();
//! assert_eq!(selection.next, Some(TrackId::new("b")));
//! assert_eq!(queue.len(), 1);
//! ```

mod entry;
mod queue;

pub use entry::{QueueEntry, Selection, VoteTally};
pub use queue::{AddOutcome, VoteQueue};
