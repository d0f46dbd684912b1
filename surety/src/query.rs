//! Read-only queries.
//!
//! Queries are answered regardless of the operational gate.

use flight_surety_core::query::Queryable;

use crate::error::SuretyError;
use crate::oracle::FlightStatus;
use crate::policy::Policy;
use crate::registry::VoteRound;
use crate::state::SuretyState;
use crate::types::{Address, INDICES_PER_ORACLE, Wei};

/// A read-only question about the state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// Whether mutating commands are accepted
    IsOperational,
    /// Whether the address is a registered airline
    IsAirline(Address),
    /// Whether the address is a registered and funded airline
    IsFundedAirline(Address),
    /// Registered airlines in admission order
    RegisteredAirlines,
    /// Open policies held by the passenger
    ActivePolicies(Address),
    /// Agreed statuses of the given flights; unknown flights are skipped
    FlightStatuses(Vec<String>),
    /// Withdrawable credit of the passenger
    Credits(Address),
    /// Indices assigned to the oracle
    MyIndexes(Address),
    /// Most recent admission vote on the candidate
    LatestVote(Address),
}

/// Answer to a [`Query`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    /// Yes/no answers
    Flag(bool),
    /// Airline lists
    Airlines(Vec<Address>),
    /// Policy lists, possibly empty
    Policies(Vec<Policy>),
    /// Flight statuses, possibly empty
    Statuses(Vec<FlightStatus>),
    /// Amounts
    Amount(Wei),
    /// Oracle indices
    Indexes([u8; INDICES_PER_ORACLE]),
    /// Vote records
    Vote(Option<VoteRound>),
}

impl Queryable for SuretyState {
    type Query = Query;
    type Answer = Result<Answer, SuretyError>;

    fn answer(&self, query: &Query) -> Result<Answer, SuretyError> {
        let answer = match query {
            Query::IsOperational => Answer::Flag(self.gate.is_operational()),
            Query::IsAirline(airline) => Answer::Flag(self.registry.is_registered(airline)),
            Query::IsFundedAirline(airline) => Answer::Flag(self.registry.is_funded(airline)),
            Query::RegisteredAirlines => {
                Answer::Airlines(self.registry.registered_airlines().to_vec())
            }
            Query::ActivePolicies(passenger) => Answer::Policies(
                self.ledger.active_policies(passenger).cloned().collect(),
            ),
            Query::FlightStatuses(codes) => Answer::Statuses(
                codes
                    .iter()
                    .filter_map(|code| self.oracles.flight_status(code.trim()))
                    .cloned()
                    .collect(),
            ),
            Query::Credits(passenger) => Answer::Amount(self.ledger.credit(passenger)),
            Query::MyIndexes(oracle) => Answer::Indexes(self.oracles.indexes(oracle)?),
            Query::LatestVote(candidate) => {
                Answer::Vote(self.registry.latest_round(candidate).cloned())
            }
        };
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> SuretyState {
        SuretyState::genesis(Address::new("owner"), Address::new("A0"))
    }

    #[test]
    fn passenger_without_policies_gets_empty_list() {
        let answer = genesis().answer(&Query::ActivePolicies(Address::new("nobody")));
        assert_eq!(answer, Ok(Answer::Policies(Vec::new())));
    }

    #[test]
    fn unknown_flights_are_skipped() {
        let answer = genesis().answer(&Query::FlightStatuses(vec!["QF1".to_string()]));
        assert_eq!(answer, Ok(Answer::Statuses(Vec::new())));
    }

    #[test]
    fn unknown_oracle_is_unauthorized() {
        let answer = genesis().answer(&Query::MyIndexes(Address::new("O1")));
        assert_eq!(
            answer.map_err(|error| error.kind()),
            Err(crate::error::ErrorKind::Unauthorized)
        );
    }

    #[test]
    fn genesis_answers() {
        let state = genesis();
        assert_eq!(state.answer(&Query::IsOperational), Ok(Answer::Flag(true)));
        assert_eq!(
            state.answer(&Query::IsAirline(Address::new("A0"))),
            Ok(Answer::Flag(true))
        );
        assert_eq!(
            state.answer(&Query::IsFundedAirline(Address::new("A0"))),
            Ok(Answer::Flag(false))
        );
        assert_eq!(
            state.answer(&Query::Credits(Address::new("P1"))),
            Ok(Answer::Amount(Wei::ZERO))
        );
        assert_eq!(
            state.answer(&Query::LatestVote(Address::new("A5"))),
            Ok(Answer::Vote(None))
        );
    }
}
