//! Events emitted by committed transitions.

use flight_surety_macros::DomainEvent;
use serde::{Deserialize, Serialize};

use crate::types::{Address, StatusCode, Wei};

/// Facts emitted by the Flight Surety state machine.
///
/// Events are returned in the transition receipt and journaled, in emission
/// order, for observers such as the oracle relay.
#[derive(DomainEvent, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuretyEvent {
    /// The operational gate was opened or closed
    OperatingStatusChanged {
        /// New value
        operational: bool,
    },

    /// An admission concluded.
    ///
    /// `votes` is 1 for direct admissions and the approval count for voted
    /// ones; `success` is false when a vote rejected the candidate.
    AirlineRegistered {
        /// Candidate
        airline: Address,
        /// Approvals recorded
        votes: u32,
        /// Whether the candidate is now registered
        success: bool,
    },

    /// An admission vote opened with the proposer's approval as first ballot
    AirlineVoteOpened {
        /// Candidate
        candidate: Address,
        /// Airline that proposed the candidate
        proposer: Address,
        /// Round number, starting at 1 per candidate
        round: u32,
    },

    /// A ballot was recorded on an open vote
    BallotCast {
        /// Candidate
        candidate: Address,
        /// Voting airline
        voter: Address,
        /// Approve or reject
        approve: bool,
    },

    /// An airline deposited funding
    AirlineFunded {
        /// Funded airline
        airline: Address,
        /// This deposit
        amount: Wei,
        /// Total deposited so far
        total: Wei,
    },

    /// A passenger bought a policy
    PolicyPurchased {
        /// Policy holder
        passenger: Address,
        /// Insured flight
        flight: String,
        /// Insured premium, after capping
        value: Wei,
    },

    /// A policy closed with the flight's finalized status
    PolicyClosed {
        /// Policy holder
        passenger: Address,
        /// Insured flight
        flight: String,
        /// Finalized status
        status: StatusCode,
    },

    /// A passenger was credited for a late flight
    PassengerCredited {
        /// Policy holder
        passenger: Address,
        /// Insured flight
        flight: String,
        /// Amount credited
        amount: Wei,
    },

    /// A passenger withdrew their credit
    CreditsWithdrawn {
        /// Passenger
        passenger: Address,
        /// Amount paid out
        amount: Wei,
    },

    /// An oracle registered and received its indices
    OracleRegistered {
        /// Oracle identity
        oracle: Address,
        /// Assigned indices
        indexes: [u8; 3],
    },

    /// Oracles holding `index` are asked for the flight's status
    OracleRequest {
        /// Sampled index
        index: u8,
        /// Airline operating the flight
        airline: Address,
        /// Flight code
        flight: String,
        /// Departure timestamp
        timestamp: u64,
    },

    /// An oracle response was recorded
    OracleReport {
        /// Airline operating the flight
        airline: Address,
        /// Flight code
        flight: String,
        /// Departure timestamp
        timestamp: u64,
        /// Reported status
        status: StatusCode,
    },

    /// Oracles agreed on a flight's status
    FlightStatusInfo {
        /// Airline operating the flight
        airline: Address,
        /// Flight code
        flight: String,
        /// Departure timestamp
        timestamp: u64,
        /// Agreed status
        status: StatusCode,
    },
}
