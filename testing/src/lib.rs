//! # Flight Surety Testing
//!
//! Testing utilities and helpers for Flight Surety reducers.
//!
//! This crate provides:
//! - Deterministic Environment implementations ([`FixedClock`], [`ScriptedRandom`])
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Tracing setup for tests ([`init_tracing`])
//!
//! ## Example
//!
//! ```ignore
//! use flight_surety_testing::{ReducerTest, ScriptedRandom, test_clock};
//!
//! ReducerTest::new(SuretyReducer::new())
//!     .with_env(SuretyEnvironment::new(Arc::new(test_clock()), Arc::new(ScriptedRandom::new([3, 5, 7]))))
//!     .given_state(state)
//!     .when_command(SuretyCommand::RegisterOracle { oracle, fee })
//!     .then_events(|events| assert_eq!(events.len(), 1))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use flight_surety_core::environment::{Clock, RandomSource};


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, RandomSource, Utc};
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use flight_surety_testing::mocks::FixedClock;
    /// use flight_surety_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }

    /// Random source that replays a fixed script of draws.
    ///
    /// Each call to `below(bound)` returns the next scripted value modulo
    /// `bound`. The script wraps around when exhausted; an empty script always
    /// yields 0.
    ///
    /// # Example
    ///
    /// ```
    /// use flight_surety_testing::mocks::ScriptedRandom;
    /// use flight_surety_core::environment::RandomSource;
    ///
    /// let rng = ScriptedRandom::new([4, 12]);
    /// assert_eq!(rng.below(10), 4);
    /// assert_eq!(rng.below(10), 2);
    /// assert_eq!(rng.below(10), 4);
    /// ```
    #[derive(Debug)]
    pub struct ScriptedRandom {
        script: Vec<u32>,
        cursor: Mutex<usize>,
    }

    impl ScriptedRandom {
        /// Create a random source replaying `script`
        #[must_use]
        pub fn new(script: impl IntoIterator<Item = u32>) -> Self {
            Self {
                script: script.into_iter().collect(),
                cursor: Mutex::new(0),
            }
        }

        /// Number of draws taken so far
        #[must_use]
        pub fn draws(&self) -> usize {
            *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl RandomSource for ScriptedRandom {
        fn below(&self, bound: u32) -> u32 {
            let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
            let draw = if self.script.is_empty() {
                0
            } else {
                self.script[*cursor % self.script.len()]
            };
            *cursor += 1;
            if bound == 0 { 0 } else { draw % bound }
        }
    }
}

/// Install a compact `tracing` subscriber for tests.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, ScriptedRandom, test_clock};
