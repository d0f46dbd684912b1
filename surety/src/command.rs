//! Commands accepted by the Flight Surety reducer.
//!
//! Every command names its caller explicitly; the hosting transport is
//! responsible for authenticating that identity.

use flight_surety_macros::Command;
use serde::{Deserialize, Serialize};

use crate::types::{Address, Wei};

/// A request to change the state machine.
///
/// All commands except those marked `#[ungated]` are refused while the
/// operational gate is closed.
#[derive(Command, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuretyCommand {
    /// Open or close the operational gate. Owner only.
    #[ungated]
    SetOperatingStatus {
        /// New value of the flag
        operational: bool,
        /// Caller, must be the owner
        caller: Address,
    },

    /// Propose a new airline. Admits it directly while the registry is
    /// small, otherwise opens a vote.
    RegisterAirline {
        /// Airline to admit
        candidate: Address,
        /// Registered, funded airline making the proposal
        acting: Address,
    },

    /// Cast a ballot on an open admission vote.
    VoteOnNewAirline {
        /// Airline under vote
        candidate: Address,
        /// Approve or reject
        approve: bool,
        /// Registered, funded airline casting the ballot
        voter: Address,
    },

    /// Deposit funding for a registered airline.
    FundAirline {
        /// Airline being funded
        airline: Address,
        /// Deposit
        amount: Wei,
    },

    /// Buy delay insurance on a flight.
    PurchasePolicy {
        /// Policy holder
        passenger: Address,
        /// Airline operating the flight
        airline: Address,
        /// Flight code, e.g. `"QF1"`
        flight: String,
        /// Amount paid; the insured premium is capped at
        /// [`Parameters::premium_cap`](crate::types::Parameters::premium_cap)
        value: Wei,
    },

    /// Withdraw the passenger's whole credit balance.
    WithdrawCredits {
        /// Passenger withdrawing
        passenger: Address,
    },

    /// Register an oracle and assign its indices.
    RegisterOracle {
        /// Oracle identity
        oracle: Address,
        /// Registration fee
        fee: Wei,
    },

    /// Ask the oracles for the status of a flight.
    #[ungated]
    FetchFlightStatus {
        /// Airline operating the flight
        airline: Address,
        /// Flight code
        flight: String,
        /// Departure timestamp (seconds since the epoch)
        timestamp: u64,
    },

    /// Report a flight status in answer to a request.
    SubmitOracleResponse {
        /// Responding oracle
        oracle: Address,
        /// Index of the request
        index: u8,
        /// Airline operating the flight
        airline: Address,
        /// Flight code
        flight: String,
        /// Departure timestamp
        timestamp: u64,
        /// Raw status code
        status: u8,
    },
}
