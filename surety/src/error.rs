//! Rejections raised by the Flight Surety state machine.
//!
//! Every rejection aborts the whole transition; the store commits nothing.
//! Variants are grouped into a coarse [`ErrorKind`] for callers that only
//! care about the category.

use thiserror::Error;

use crate::types::{Address, Wei};

/// Coarse category of a [`SuretyError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The operational gate is closed
    GateClosed,
    /// The caller lacks the required role or funding
    Unauthorized,
    /// The command conflicts with current state
    InvalidState,
    /// An argument is out of bounds or unknown
    InvalidArgument,
    /// Withdrawal with a zero balance
    InsufficientCredit,
}

/// Why a command was rejected.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SuretyError {
    /// Mutating commands are paused.
    #[error("Contract is not operational")]
    ContractNotOperational,

    /// Only the owner may change the operating status.
    #[error("Caller {0} is not the contract owner")]
    NotOwner(Address),

    /// The airline is not registered.
    #[error("Airline {0} is not registered")]
    AirlineNotRegistered(Address),

    /// The airline is registered but has not provided funding.
    #[error("Airline {0} has not provided funding")]
    AirlineNotFunded(Address),

    /// The candidate is already a registered airline.
    #[error("Airline {0} is already registered")]
    AirlineAlreadyRegistered(Address),

    /// A vote on the candidate is already open.
    #[error("A vote on airline {0} is already open")]
    DuplicateVoteRequest(Address),

    /// No vote on the candidate is open.
    #[error("No open vote on airline {0}")]
    NoOpenVote(Address),

    /// The voter already cast a ballot in this round.
    #[error("Airline {voter} already voted on {candidate}")]
    AlreadyVoted {
        /// Candidate of the vote
        candidate: Address,
        /// Voter who tried to vote twice
        voter: Address,
    },

    /// The deposit is below the funding threshold.
    #[error("Funding of {amount} is below the required {required}")]
    InsufficientFunding {
        /// Amount offered
        amount: Wei,
        /// Funding threshold
        required: Wei,
    },

    /// Nothing was paid for the policy.
    #[error("Premium must be above zero")]
    ZeroPremium,

    /// The flight code is blank.
    #[error("Flight code must not be empty")]
    EmptyFlightCode,

    /// The passenger already holds an open policy on the flight.
    #[error("Passenger {passenger} already holds an open policy on {flight}")]
    DuplicatePolicy {
        /// Policy holder
        passenger: Address,
        /// Insured flight
        flight: String,
    },

    /// The passenger has no credit to withdraw.
    #[error("Passenger {0} has no credit to withdraw")]
    InsufficientCredit(Address),

    /// An amount overflowed.
    #[error("Amount overflow")]
    AmountOverflow,

    /// The oracle registration fee is too low.
    #[error("Registration fee {fee} is below the required {required}")]
    InsufficientFee {
        /// Fee offered
        fee: Wei,
        /// Required fee
        required: Wei,
    },

    /// The oracle is already registered.
    #[error("Oracle {0} is already registered")]
    OracleAlreadyRegistered(Address),

    /// The caller is not a registered oracle.
    #[error("Oracle {0} is not registered")]
    OracleNotRegistered(Address),

    /// The oracle was not assigned the index it responded under.
    #[error("Index {index} is not assigned to oracle {oracle}")]
    IndexNotAssigned {
        /// Responding oracle
        oracle: Address,
        /// Index claimed
        index: u8,
    },

    /// The status code is not one of the known codes.
    #[error("Unknown status code {0}")]
    UnknownStatusCode(u8),

    /// No request matches the response.
    #[error("No status request for {flight} at {timestamp} under index {index}")]
    RequestNotOpen {
        /// Index of the request
        index: u8,
        /// Flight of the request
        flight: String,
        /// Timestamp of the request
        timestamp: u64,
    },

    /// The oracle already answered the request.
    #[error("Oracle {0} already responded to this request")]
    DuplicateResponse(Address),
}

impl SuretyError {
    /// Category of this rejection
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ContractNotOperational => ErrorKind::GateClosed,
            Self::NotOwner(_)
            | Self::AirlineNotRegistered(_)
            | Self::AirlineNotFunded(_)
            | Self::OracleNotRegistered(_)
            | Self::IndexNotAssigned { .. } => ErrorKind::Unauthorized,
            Self::AirlineAlreadyRegistered(_)
            | Self::DuplicateVoteRequest(_)
            | Self::NoOpenVote(_)
            | Self::AlreadyVoted { .. }
            | Self::DuplicatePolicy { .. }
            | Self::OracleAlreadyRegistered(_)
            | Self::RequestNotOpen { .. }
            | Self::DuplicateResponse(_) => ErrorKind::InvalidState,
            Self::InsufficientFunding { .. }
            | Self::ZeroPremium
            | Self::EmptyFlightCode
            | Self::AmountOverflow
            | Self::InsufficientFee { .. }
            | Self::UnknownStatusCode(_) => ErrorKind::InvalidArgument,
            Self::InsufficientCredit(_) => ErrorKind::InsufficientCredit,
        }
    }
}
