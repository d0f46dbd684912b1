//! In-memory journal.
//!
//! The default [`EventJournal`] used by [`Store::new`](crate::Store::new).
//! Entries live for the lifetime of the process; durable backends implement
//! the same trait.

use flight_surety_core::event::SerializedEvent;
use flight_surety_core::journal::{EventJournal, JournalEntry, JournalError, JournalFuture, Sequence};
use std::sync::{Arc, RwLock};

/// Vector-backed journal.
///
/// Cloning shares the underlying entries.
#[derive(Clone, Debug, Default)]
pub struct InMemoryJournal {
    entries: Arc<RwLock<Vec<JournalEntry>>>,
}

impl InMemoryJournal {
    /// Create an empty journal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed entries.
    ///
    /// A poisoned journal reports zero entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether no transition has been committed yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> JournalError {
    JournalError::Storage("journal lock poisoned".to_string())
}

impl EventJournal for InMemoryJournal {
    fn append(
        &self,
        expected_head: Sequence,
        command: String,
        events: Vec<SerializedEvent>,
    ) -> JournalFuture<'_, Sequence> {
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(|_| poisoned())?;
            let actual = entries.last().map_or(Sequence::GENESIS, |entry| entry.sequence);
            if actual != expected_head {
                return Err(JournalError::SequenceConflict {
                    expected: expected_head,
                    actual,
                });
            }

            let sequence = actual.next();
            entries.push(JournalEntry {
                sequence,
                command,
                events,
            });
            Ok(sequence)
        })
    }

    fn load_from(&self, after: Sequence) -> JournalFuture<'_, Vec<JournalEntry>> {
        Box::pin(async move {
            let entries = self.entries.read().map_err(|_| poisoned())?;
            Ok(entries
                .iter()
                .filter(|entry| entry.sequence > after)
                .cloned()
                .collect())
        })
    }

    fn head(&self) -> JournalFuture<'_, Sequence> {
        Box::pin(async move {
            let entries = self.entries.read().map_err(|_| poisoned())?;
            Ok(entries.last().map_or(Sequence::GENESIS, |entry| entry.sequence))
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn event(name: &str) -> SerializedEvent {
        SerializedEvent::new(format!("{name}.v1"), vec![1, 2, 3])
    }

    #[tokio::test]
    async fn append_assigns_consecutive_sequences() {
        let journal = InMemoryJournal::new();
        assert!(journal.is_empty());

        let first = journal
            .append(Sequence::GENESIS, "FundAirline".to_string(), vec![event("AirlineFunded")])
            .await
            .unwrap();
        let second = journal
            .append(first, "WithdrawCredits".to_string(), vec![])
            .await
            .unwrap();

        assert_eq!(first, Sequence::new(1));
        assert_eq!(second, Sequence::new(2));
        assert_eq!(journal.head().await.unwrap(), second);
        assert_eq!(journal.len(), 2);
    }

    #[tokio::test]
    async fn stale_head_is_rejected() {
        let journal = InMemoryJournal::new();
        journal
            .append(Sequence::GENESIS, "RegisterOracle".to_string(), vec![])
            .await
            .unwrap();

        let result = journal
            .append(Sequence::GENESIS, "RegisterOracle".to_string(), vec![])
            .await;

        assert!(matches!(
            result,
            Err(JournalError::SequenceConflict { actual, .. }) if actual == Sequence::new(1)
        ));
        assert_eq!(journal.len(), 1);
    }

    #[tokio::test]
    async fn load_from_skips_entries_at_or_before_cursor() {
        let journal = InMemoryJournal::new();
        let mut head = Sequence::GENESIS;
        for name in ["A", "B", "C"] {
            head = journal.append(head, name.to_string(), vec![event(name)]).await.unwrap();
        }

        let all = journal.load_from(Sequence::GENESIS).await.unwrap();
        assert_eq!(all.len(), 3);

        let tail = journal.load_from(Sequence::new(2)).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].command, "C");
    }
}
