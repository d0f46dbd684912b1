//! # Flight Surety
//!
//! Flight-delay insurance as a serialized state machine.
//!
//! Three components share one [`SuretyState`]:
//!
//! - **Airline registry**: the first four funded airlines admit newcomers
//!   alone; after that, admission takes a strict-majority vote of the
//!   registered, funded airlines
//! - **Policy ledger**: passengers insure flights for up to one unit and are
//!   credited 1.5x their premium when the airline is at fault for a delay
//! - **Oracle consensus**: oracles answer status requests under randomly
//!   assigned indices; three agreeing answers finalize the flight
//!
//! A fourth piece, the operational gate, lets the owner pause every mutating
//! command.
//!
//! ## Example
//!
//! ```ignore
//! use flight_surety::{SuretyCommand, SuretyEnvironment, SuretyReducer, SuretyState, Wei};
//! use flight_surety_runtime::Store;
//!
//! let store = Store::new(
//!     SuretyState::genesis(owner, first_airline.clone()),
//!     SuretyReducer::new(),
//!     SuretyEnvironment::new(Arc::new(SystemClock), Arc::new(SeededRandom::from_entropy())),
//! );
//!
//! store
//!     .submit(SuretyCommand::FundAirline { airline: first_airline, amount: Wei::units(10) })
//!     .await?;
//! ```

/// Commands accepted by the reducer
pub mod command;

/// Rejections and their categories
pub mod error;

/// Events emitted by committed transitions
pub mod event;

/// Operational gate
pub mod gate;

/// Oracle consensus engine
pub mod oracle;

/// Policy ledger
pub mod policy;

/// Read-only queries
pub mod query;

/// The reducer and its environment
pub mod reducer;

/// Airline registry and admission votes
pub mod registry;

/// Aggregate state
pub mod state;

/// Identities, amounts, status codes and parameters
pub mod types;

pub use command::SuretyCommand;
pub use error::{ErrorKind, SuretyError};
pub use event::SuretyEvent;
pub use query::{Answer, Query};
pub use reducer::{SuretyEnvironment, SuretyReducer};
pub use state::SuretyState;
pub use types::{Address, Parameters, Ratio, StatusCode, Wei};
