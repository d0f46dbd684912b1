//! # Flight Surety Runtime
//!
//! Runtime hosting for Flight Surety reducers.
//!
//! The [`Store`] plays the part of the transactional ledger: it owns the
//! state, runs one command at a time, and makes every transition
//! all-or-nothing.
//!
//! ## Core Components
//!
//! - **Store**: serialized, atomic command execution plus read-only queries
//! - **Journal**: append-only record of committed transitions
//!   ([`InMemoryJournal`] by default)
//! - **Subscription**: replay-from-genesis plus live event delivery
//!
//! ## Example
//!
//! ```ignore
//! use flight_surety_runtime::Store;
//!
//! let store = Store::new(initial_state, reducer, environment);
//!
//! // Submit a command; the receipt carries the emitted events
//! let receipt = store.submit(command).await?;
//!
//! // Read state
//! let operational = store.state(|s| s.gate.is_operational()).await;
//!
//! // Replay every event since genesis, then follow live events
//! let mut events = store.subscribe_from(Sequence::GENESIS).await?;
//! while let Some(recorded) = events.next().await? {
//!     // ...
//! }
//! ```

use flight_surety_core::command::Command;
use flight_surety_core::event::{Event, EventError, SerializedEvent};
use flight_surety_core::journal::{EventJournal, JournalError, Sequence};
use flight_surety_core::query::Queryable;
use flight_surety_core::reducer::Reducer;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// In-memory journal implementation
pub mod journal;

/// Prometheus metrics for observability
pub mod metrics;

/// Event subscriptions with history replay
pub mod subscription;

pub use error::StoreError;
pub use journal::InMemoryJournal;
pub use store::{Receipt, Store};
pub use subscription::{Recorded, Subscription, SubscriptionError};

/// Error types for the Store runtime
pub mod error {
    use super::{EventError, JournalError};
    use crate::subscription::SubscriptionError;
    use thiserror::Error;

    /// Errors returned by [`Store`](crate::Store) operations.
    ///
    /// `E` is the reducer's rejection type.
    #[derive(Error, Debug)]
    pub enum StoreError<E> {
        /// The reducer rejected the command. Nothing was committed.
        #[error("Transition rejected: {0}")]
        Rejected(E),

        /// An emitted event could not be serialized. Nothing was committed.
        #[error("Event encoding failed: {0}")]
        Event(#[from] EventError),

        /// The journal refused the transition. Nothing was committed.
        #[error("Journal error: {0}")]
        Journal(#[from] JournalError),

        /// Journaled history could not be replayed for a subscription.
        #[error("Subscription error: {0}")]
        Subscription(#[from] SubscriptionError),
    }

    impl<E> StoreError<E> {
        /// Returns the reducer's rejection, if that is what this error is
        #[must_use]
        pub const fn rejection(&self) -> Option<&E> {
            match self {
                Self::Rejected(error) => Some(error),
                Self::Event(_) | Self::Journal(_) | Self::Subscription(_) => None,
            }
        }

        /// Consumes the error, returning the reducer's rejection if present
        pub fn into_rejection(self) -> Option<E> {
            match self {
                Self::Rejected(error) => Some(error),
                Self::Event(_) | Self::Journal(_) | Self::Subscription(_) => None,
            }
        }
    }
}

/// Store module - the runtime coordinator
pub mod store {
    use super::{
        Arc, Command, DeserializeOwned, Event, EventJournal, InMemoryJournal, Queryable, Reducer,
        Recorded, RwLock, Sequence, SerializedEvent, Serialize, StoreError, Subscription, broadcast,
    };
    use std::time::Instant;

    /// Default capacity of the live event channel.
    const BROADCAST_CAPACITY: usize = 256;

    /// Result of a committed transition.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Receipt<E> {
        /// Journal position of the transition
        pub sequence: Sequence,
        /// Events emitted, in emission order
        pub events: Vec<E>,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; writers hold the lock for a whole transition)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Journal and live event fan-out
    ///
    /// Cloning a Store yields another handle to the same state.
    pub struct Store<R: Reducer> {
        inner: Arc<Inner<R>>,
    }

    struct Inner<R: Reducer> {
        state: RwLock<R::State>,
        reducer: R,
        environment: R::Environment,
        journal: Arc<dyn EventJournal>,
        events: broadcast::Sender<Recorded<R::Event>>,
    }

    impl<R: Reducer> Clone for Store<R> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<R> Store<R>
    where
        R: Reducer + Send + Sync + 'static,
        R::State: Clone + Send + Sync + 'static,
        R::Command: Command + Send + 'static,
        R::Event: Event + Serialize + DeserializeOwned + Clone,
        R::Error: std::fmt::Display + Send + 'static,
        R::Environment: Send + Sync + 'static,
    {
        /// Create a store backed by a fresh [`InMemoryJournal`].
        #[must_use]
        pub fn new(initial_state: R::State, reducer: R, environment: R::Environment) -> Self {
            Self::with_journal(
                initial_state,
                reducer,
                environment,
                Arc::new(InMemoryJournal::new()),
            )
        }

        /// Create a store over an existing journal.
        ///
        /// `initial_state` must be the state the journal's history leads to.
        #[must_use]
        pub fn with_journal(
            initial_state: R::State,
            reducer: R,
            environment: R::Environment,
            journal: Arc<dyn EventJournal>,
        ) -> Self {
            let (events, _) = broadcast::channel(BROADCAST_CAPACITY);
            Self {
                inner: Arc::new(Inner {
                    state: RwLock::new(initial_state),
                    reducer,
                    environment,
                    journal,
                    events,
                }),
            }
        }

        /// Submit a command as one atomic transition.
        ///
        /// The reducer runs against a working copy of the state while the
        /// write lock is held. The copy replaces the state only after the
        /// events are journaled, so a rejected command, an unencodable event or
        /// a journal failure leaves no trace.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Rejected`]: the reducer refused the command
        /// - [`StoreError::Event`]: an event could not be serialized
        /// - [`StoreError::Journal`]: the journal refused the append
        #[tracing::instrument(skip(self, command), fields(command = command.name()), name = "store_submit")]
        pub async fn submit(
            &self,
            command: R::Command,
        ) -> Result<Receipt<R::Event>, StoreError<R::Error>> {
            let name = command.name();
            metrics::counter!("store.commands.total").increment(1);

            let mut state = self.inner.state.write().await;
            tracing::trace!("Acquired write lock on state");

            let mut working = state.clone();
            let start = Instant::now();
            let outcome = self
                .inner
                .reducer
                .reduce(&mut working, command, &self.inner.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            let events = match outcome {
                Ok(events) => events,
                Err(error) => {
                    tracing::warn!(%error, "Transition rejected");
                    metrics::counter!("store.commands.rejected", "command" => name).increment(1);
                    return Err(StoreError::Rejected(error));
                }
            };

            let serialized = events
                .iter()
                .map(|event| SerializedEvent::from_event(event))
                .collect::<Result<Vec<_>, _>>()?;
            let head = self.inner.journal.head().await?;
            let sequence = self
                .inner
                .journal
                .append(head, name.to_string(), serialized)
                .await?;

            *state = working;

            // Publish under the lock so live order matches journal order.
            for (index, event) in events.iter().enumerate() {
                // No receivers is not an error.
                let _ = self.inner.events.send(Recorded {
                    sequence,
                    index,
                    event: event.clone(),
                });
            }
            drop(state);

            // Note: Precision loss acceptable for metrics (event counts < 2^52)
            #[allow(clippy::cast_precision_loss)]
            metrics::histogram!("store.events.count").record(events.len() as f64);
            tracing::debug!(%sequence, events = events.len(), "Transition committed");

            Ok(Receipt {
                sequence,
                events: events.into_vec(),
            })
        }

        /// Answer a read-only query against the current state.
        ///
        /// Queries wait for an in-flight transition to finish and never
        /// observe a partially applied one.
        pub async fn query(
            &self,
            query: &<R::State as Queryable>::Query,
        ) -> <R::State as Queryable>::Answer
        where
            R::State: Queryable,
        {
            let state = self.inner.state.read().await;
            state.answer(query)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let policies = store.state(|s| s.policies.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&R::State) -> T,
        {
            let state = self.inner.state.read().await;
            f(&*state)
        }

        /// Sequence of the last committed transition.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Journal`] if the journal cannot be read.
        pub async fn head(&self) -> Result<Sequence, StoreError<R::Error>> {
            Ok(self.inner.journal.head().await?)
        }

        /// Subscribe to every event committed after `after`, then to live events.
        ///
        /// `subscribe_from(Sequence::GENESIS)` replays the full history. The
        /// hand-over from history to live events happens while no transition
        /// is in flight, so nothing is missed or repeated.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Journal`] or [`StoreError::Subscription`] if
        /// history cannot be loaded or decoded.
        pub async fn subscribe_from(
            &self,
            after: Sequence,
        ) -> Result<Subscription<R::Event>, StoreError<R::Error>> {
            let quiescent = self.inner.state.read().await;
            let live = self.inner.events.subscribe();
            let history = self.inner.journal.load_from(after).await?;
            drop(quiescent);

            tracing::debug!(%after, replayed = history.len(), "Subscription opened");
            Ok(Subscription::new(
                after,
                history,
                live,
                Arc::clone(&self.inner.journal),
            )?)
        }

        /// Subscribe to events committed from now on.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Journal`] if the journal head cannot be read.
        pub async fn subscribe(&self) -> Result<Subscription<R::Event>, StoreError<R::Error>> {
            let head = self.head().await?;
            self.subscribe_from(head).await
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use flight_surety_core::reducer::Events;
    use flight_surety_core::smallvec;
    use flight_surety_macros::{Command, DomainEvent};
    use serde::Deserialize;

    #[derive(Clone, Debug, Default)]
    struct TankState {
        litres: u32,
        open: bool,
    }

    #[derive(Command, Clone, Debug)]
    enum TankCommand {
        Fill(u32),
        Drain(u32),
        #[ungated]
        Inspect,
    }

    #[derive(DomainEvent, Clone, Debug, PartialEq, Serialize, Deserialize)]
    enum TankEvent {
        Filled { litres: u32 },
        Drained { litres: u32 },
    }

    struct TankReducer;

    impl Reducer for TankReducer {
        type State = TankState;
        type Command = TankCommand;
        type Event = TankEvent;
        type Error = String;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut TankState,
            command: TankCommand,
            _env: &(),
        ) -> Result<Events<TankEvent>, String> {
            match command {
                TankCommand::Fill(litres) => {
                    state.litres += litres;
                    Ok(smallvec![TankEvent::Filled { litres }])
                }
                TankCommand::Drain(litres) => {
                    // Mutate before validating to prove the working copy is discarded.
                    state.open = true;
                    state.litres = state
                        .litres
                        .checked_sub(litres)
                        .ok_or_else(|| "not enough water".to_string())?;
                    Ok(smallvec![TankEvent::Drained { litres }])
                }
                TankCommand::Inspect => Ok(Events::new()),
            }
        }
    }

    impl Queryable for TankState {
        type Query = ();
        type Answer = u32;

        fn answer(&self, _query: &()) -> u32 {
            self.litres
        }
    }

    fn tank() -> Store<TankReducer> {
        Store::new(TankState::default(), TankReducer, ())
    }

    #[tokio::test]
    async fn committed_transition_returns_events_and_sequence() {
        let store = tank();
        let receipt = store.submit(TankCommand::Fill(5)).await.unwrap();

        assert_eq!(receipt.sequence, Sequence::new(1));
        assert_eq!(receipt.events, vec![TankEvent::Filled { litres: 5 }]);
        assert_eq!(store.query(&()).await, 5);
    }

    #[tokio::test]
    async fn rejected_transition_leaves_no_trace() {
        let store = tank();
        store.submit(TankCommand::Fill(1)).await.unwrap();

        let error = store.submit(TankCommand::Drain(3)).await.unwrap_err();
        assert_eq!(error.rejection().map(String::as_str), Some("not enough water"));

        let (litres, open) = store.state(|s| (s.litres, s.open)).await;
        assert_eq!(litres, 1);
        assert!(!open);
        assert_eq!(store.head().await.unwrap(), Sequence::new(1));
    }

    #[tokio::test]
    async fn subscription_replays_history_then_follows_live_events() {
        let store = tank();
        store.submit(TankCommand::Fill(2)).await.unwrap();
        store.submit(TankCommand::Fill(3)).await.unwrap();

        let mut events = store.subscribe_from(Sequence::GENESIS).await.unwrap();
        store.submit(TankCommand::Drain(4)).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(events.next().await.unwrap().unwrap().event);
        }
        assert_eq!(
            seen,
            vec![
                TankEvent::Filled { litres: 2 },
                TankEvent::Filled { litres: 3 },
                TankEvent::Drained { litres: 4 },
            ]
        );
    }

    #[tokio::test]
    async fn live_subscription_skips_history() {
        let store = tank();
        store.submit(TankCommand::Fill(2)).await.unwrap();

        let mut events = store.subscribe().await.unwrap();
        let receipt = store.submit(TankCommand::Fill(7)).await.unwrap();

        let next = events.next().await.unwrap().unwrap();
        assert_eq!(next.sequence, receipt.sequence);
        assert_eq!(next.event, TankEvent::Filled { litres: 7 });
    }

    #[tokio::test]
    async fn empty_transitions_are_still_sequenced() {
        let store = tank();
        let receipt = store.submit(TankCommand::Inspect).await.unwrap();
        assert!(receipt.events.is_empty());
        assert_eq!(receipt.sequence, Sequence::new(1));
    }

    #[tokio::test]
    async fn concurrent_submissions_are_serialized() {
        let store = tank();
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.submit(TankCommand::Fill(1)).await.unwrap().sequence
            }));
        }

        let mut sequences = Vec::new();
        for handle in handles {
            sequences.push(handle.await.unwrap());
        }
        sequences.sort();
        sequences.dedup();

        assert_eq!(sequences.len(), 20);
        assert_eq!(store.query(&()).await, 20);
    }
}
