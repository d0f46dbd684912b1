//! # Flight Surety Core
//!
//! Core traits and types shared by the Flight Surety crates.
//!
//! The insurance system is modelled as a single serialized state machine. Every
//! mutating request is a **command**; a **reducer** validates it against the
//! current state and either rejects it or returns the **events** it emitted.
//! Hosting runtimes (see `flight-surety-runtime`) make each reduction atomic,
//! journal the events and fan them out to observers such as the oracle relay.
//!
//! ## Core Concepts
//!
//! - **State**: owned, cloneable domain state
//! - **Command**: a request to change state, addressed by caller identity
//! - **Reducer**: `(State, Command, Environment) → Result<Events, Error>`
//! - **Event**: an immutable fact emitted by a successful transition
//! - **Environment**: injected clock and randomness
//!
//! ## Example
//!
//! ```
//! use flight_surety_core::reducer::{Events, Reducer};
//! use flight_surety_core::smallvec;
//!
//! #[derive(Clone, Default)]
//! struct Counter { value: u32 }
//!
//! enum Bump { By(u32) }
//!
//! #[derive(Debug, PartialEq)]
//! enum Bumped { To(u32) }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = Counter;
//!     type Command = Bump;
//!     type Event = Bumped;
//!     type Error = String;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Counter, command: Bump, _env: &()) -> Result<Events<Bumped>, String> {
//!         let Bump::By(n) = command;
//!         state.value = state.value.checked_add(n).ok_or("overflow")?;
//!         Ok(smallvec![Bumped::To(state.value)])
//!     }
//! }
//!
//! let mut state = Counter::default();
//! let events = CounterReducer.reduce(&mut state, Bump::By(2), &()).unwrap();
//! assert_eq!(events.as_slice(), &[Bumped::To(2)]);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Event trait and serialized event envelope
pub mod event;

/// Append-only journal of committed transitions
pub mod journal;

/// Reducer module - the transition function of the state machine
pub mod reducer {
    use smallvec::SmallVec;

    /// Events emitted by a single transition.
    ///
    /// Most transitions emit one or two events; finalizing a flight can emit
    /// one per affected policy, which spills to the heap.
    pub type Events<E> = SmallVec<[E; 4]>;

    /// The Reducer trait - validates a command and applies its effects.
    ///
    /// # Atomicity
    ///
    /// A reducer may leave `state` partially modified when it returns `Err`.
    /// Hosts are required to run reducers against a working copy and commit it
    /// only on `Ok`, so a rejected command never has observable effects.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The command type this reducer processes
        type Command;

        /// The events emitted by successful transitions
        type Event;

        /// The rejection type for invalid commands
        type Error;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce a command into state changes and emitted events.
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` when the command's preconditions do not hold
        /// against `state`.
        fn reduce(
            &self,
            state: &mut Self::State,
            command: Self::Command,
            env: &Self::Environment,
        ) -> Result<Events<Self::Event>, Self::Error>;
    }
}

/// Command metadata consumed by runtimes and gates
pub mod command {
    /// Metadata every command type exposes.
    ///
    /// Usually generated with `#[derive(Command)]` from `flight-surety-macros`.
    pub trait Command {
        /// Stable name of the command, used in logs, metrics and the journal.
        fn name(&self) -> &'static str;

        /// Whether the command is refused while the system is paused.
        fn requires_operational(&self) -> bool;
    }
}

/// Read-only queries answered from state
pub mod query {
    /// State that can answer read-only queries.
    ///
    /// Queries never mutate state and are answered regardless of whether the
    /// system is paused.
    pub trait Queryable {
        /// The query type
        type Query;

        /// The answer type
        type Answer;

        /// Answer a query against the current state.
        fn answer(&self, query: &Self::Query) -> Self::Answer;
    }
}

/// Environment module - Dependency injection traits
///
/// All nondeterminism a reducer needs (time and randomness) is abstracted
/// behind traits and injected via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::{Mutex, PoisonError};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of pseudo-random draws.
    ///
    /// Index assignment, request sampling and simulated oracle answers all draw
    /// from this trait so tests can script exact sequences.
    pub trait RandomSource: Send + Sync {
        /// Returns a value in `0..bound`. Returns 0 when `bound` is 0.
        fn below(&self, bound: u32) -> u32;
    }

    /// Seedable random source built on [`StdRng`].
    ///
    /// The same seed always yields the same sequence of draws.
    #[derive(Debug)]
    pub struct SeededRandom {
        rng: Mutex<StdRng>,
    }

    impl SeededRandom {
        /// Create a random source with a fixed seed
        #[must_use]
        pub fn new(seed: u64) -> Self {
            Self {
                rng: Mutex::new(StdRng::seed_from_u64(seed)),
            }
        }

        /// Create a random source seeded from the operating system
        #[must_use]
        pub fn from_entropy() -> Self {
            Self {
                rng: Mutex::new(StdRng::from_entropy()),
            }
        }
    }

    impl RandomSource for SeededRandom {
        fn below(&self, bound: u32) -> u32 {
            if bound == 0 {
                return 0;
            }
            // A poisoned generator is still a valid generator.
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.gen_range(0..bound)
        }
    }
}
