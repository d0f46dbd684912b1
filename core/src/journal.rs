//! Journal trait and related types.
//!
//! The journal is the append-only record of committed transitions: the
//! "ledger store" seen from the outside. Each committed command occupies one
//! [`JournalEntry`] at the next [`Sequence`], carrying the events it emitted.
//! Observers that need history (the oracle relay replays every
//! `OracleRequest` ever emitted) read entries back with
//! [`EventJournal::load_from`].
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures so runtimes can hold an
//! `Arc<dyn EventJournal>` and swap the in-memory journal for a durable one.

use crate::event::SerializedEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by journal operations.
pub type JournalFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, JournalError>> + Send + 'a>>;

/// Position of a committed transition in the journal.
///
/// `Sequence::GENESIS` (0) is the position before the first transition;
/// the first committed transition is at sequence 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sequence(u64);

impl Sequence {
    /// The position before any transition was committed.
    pub const GENESIS: Self = Self(0);

    /// Create a sequence from its raw value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the following position
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One committed transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position of the transition
    pub sequence: Sequence,
    /// Name of the command that produced the transition
    pub command: String,
    /// Events emitted by the transition, in emission order
    pub events: Vec<SerializedEvent>,
}

/// Errors that can occur during journal operations.
#[derive(Error, Debug)]
pub enum JournalError {
    /// The journal head moved between reading it and appending.
    ///
    /// Runtimes serialize transitions, so this indicates a second writer on
    /// the same journal.
    #[error("Sequence conflict: expected head {expected}, found {actual}")]
    SequenceConflict {
        /// The head the writer expected.
        expected: Sequence,
        /// The actual head of the journal.
        actual: Sequence,
    },

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Append-only storage of committed transitions.
pub trait EventJournal: Send + Sync {
    /// Append a transition after `expected_head`.
    ///
    /// Returns the sequence assigned to the new entry (`expected_head + 1`).
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::SequenceConflict`] if the journal head is not
    /// `expected_head`.
    fn append(
        &self,
        expected_head: Sequence,
        command: String,
        events: Vec<SerializedEvent>,
    ) -> JournalFuture<'_, Sequence>;

    /// Load every entry with a sequence strictly greater than `after`.
    ///
    /// `load_from(Sequence::GENESIS)` returns the complete history.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::Storage`] if the backend cannot be read.
    fn load_from(&self, after: Sequence) -> JournalFuture<'_, Vec<JournalEntry>>;

    /// Returns the sequence of the last committed entry.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::Storage`] if the backend cannot be read.
    fn head(&self) -> JournalFuture<'_, Sequence>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_before_first_entry() {
        assert_eq!(Sequence::GENESIS.next(), Sequence::new(1));
        assert!(Sequence::GENESIS < Sequence::new(1));
    }

    #[test]
    fn sequence_display() {
        assert_eq!(Sequence::new(42).to_string(), "#42");
    }
}
