//! # Flight Surety Relay
//!
//! Off-ledger oracle workers for a Flight Surety [`Store`](flight_surety_runtime::Store).
//!
//! The relay registers a pool of oracles, learns which indices each was
//! assigned, and answers every `OracleRequest` event whose index one of its
//! oracles holds. Answers come from a [`StatusGenerator`].
//!
//! ## Example
//!
//! ```ignore
//! use flight_surety_relay::{OracleRelay, RandomStatus, RelayConfig};
//!
//! let config = RelayConfig::from_env();
//! let (relay, shutdown) =
//!     OracleRelay::bootstrap(store.clone(), &config, RandomStatus::new(rng)).await?;
//!
//! let worker = tokio::spawn(relay.run());
//!
//! // Later:
//! shutdown.send(true).ok();
//! worker.await??;
//! ```

/// Relay configuration
pub mod config;

/// Relay errors
pub mod error;

/// The oracle relay worker
pub mod relay;

/// Status generators
pub mod status;

pub use config::RelayConfig;
pub use error::RelayError;
pub use relay::OracleRelay;
pub use status::{FixedStatus, RandomStatus, StatusGenerator};
