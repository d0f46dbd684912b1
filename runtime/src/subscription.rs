//! Event subscriptions with history replay.
//!
//! A [`Subscription`] first yields every journaled event after its starting
//! sequence, then switches to live events from the store's broadcast channel
//! without gaps or duplicates. If the live channel lags, missed events are
//! re-read from the journal.

use flight_surety_core::event::{Event, EventError};
use flight_surety_core::journal::{EventJournal, JournalEntry, JournalError, Sequence};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// An event together with its position in the journal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded<E> {
    /// Sequence of the transition that emitted the event
    pub sequence: Sequence,
    /// Index of the event within its transition
    pub index: usize,
    /// The event itself
    pub event: E,
}

impl<E> Recorded<E> {
    const fn position(&self) -> (Sequence, usize) {
        (self.sequence, self.index)
    }
}

/// Errors surfaced while reading a subscription.
#[derive(Error, Debug)]
pub enum SubscriptionError {
    /// A journaled payload did not decode.
    #[error("Failed to decode journaled event: {0}")]
    Event(#[from] EventError),

    /// The journal could not be re-read after the live channel lagged.
    #[error("Failed to reload journal: {0}")]
    Journal(#[from] JournalError),
}

/// Ordered stream of recorded events.
pub struct Subscription<E> {
    backlog: VecDeque<Recorded<E>>,
    live: broadcast::Receiver<Recorded<E>>,
    journal: Arc<dyn EventJournal>,
    /// Position of the last delivered event.
    cursor: (Sequence, usize),
}

impl<E> Subscription<E>
where
    E: Event + DeserializeOwned + Clone,
{
    pub(crate) fn new(
        after: Sequence,
        history: Vec<JournalEntry>,
        live: broadcast::Receiver<Recorded<E>>,
        journal: Arc<dyn EventJournal>,
    ) -> Result<Self, SubscriptionError> {
        let mut subscription = Self {
            backlog: VecDeque::new(),
            live,
            journal,
            cursor: (after, usize::MAX),
        };
        subscription.enqueue(history)?;
        Ok(subscription)
    }

    /// Wait for the next event.
    ///
    /// Returns `Ok(None)` once the store has been dropped and every
    /// journaled event was delivered.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError`] if journaled events cannot be decoded or
    /// the journal cannot be re-read after lagging.
    pub async fn next(&mut self) -> Result<Option<Recorded<E>>, SubscriptionError> {
        loop {
            if let Some(recorded) = self.backlog.pop_front() {
                self.cursor = recorded.position();
                return Ok(Some(recorded));
            }

            match self.live.recv().await {
                Ok(recorded) if recorded.position() > self.cursor => {
                    self.cursor = recorded.position();
                    return Ok(Some(recorded));
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, cursor = %self.cursor.0, "Subscription lagged, replaying from journal");
                    let resume = Sequence::new(self.cursor.0.value().saturating_sub(1));
                    let entries = self.journal.load_from(resume).await?;
                    self.enqueue(entries)?;
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    fn enqueue(&mut self, entries: Vec<JournalEntry>) -> Result<(), SubscriptionError> {
        for entry in entries {
            for (index, serialized) in entry.events.iter().enumerate() {
                if (entry.sequence, index) <= self.cursor {
                    continue;
                }
                self.backlog.push_back(Recorded {
                    sequence: entry.sequence,
                    index,
                    event: serialized.decode()?,
                });
            }
        }
        Ok(())
    }
}
