//! Airline registry: membership, funding and admission votes.
//!
//! While fewer than [`Parameters::unilateral_admissions`] airlines are
//! registered and funded, any such airline admits a candidate on its own.
//! Past that, proposing a candidate opens a vote seeded with the proposer's
//! approval, and the vote resolves against the live electorate:
//!
//! - success once `approvals * 2 > N`
//! - failure once `rejections * 2 >= N`, when approvals can no longer win
//!
//! where `N` counts airlines that are registered and funded at the moment
//! the ballot is tallied.

use chrono::{DateTime, Utc};
use flight_surety_core::reducer::Events;
use flight_surety_core::smallvec;
use std::collections::HashMap;

use crate::error::SuretyError;
use crate::event::SuretyEvent;
use crate::types::{Address, Parameters, Wei};

/// A registry entry.
///
/// Candidates under vote have an entry with `registered == false`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Airline {
    /// Identity
    pub address: Address,
    /// Admitted to the registry
    pub registered: bool,
    /// Has deposited at least the funding threshold; never reverts
    pub funded: bool,
    /// Total deposited
    pub deposit: Wei,
}

impl Airline {
    const fn candidate(address: Address) -> Self {
        Self {
            address,
            registered: false,
            funded: false,
            deposit: Wei::ZERO,
        }
    }
}

/// One ballot in an admission vote
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ballot {
    /// Voting airline
    pub voter: Address,
    /// Approve or reject
    pub approve: bool,
}

/// A round of voting on one candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteRound {
    /// Airline under vote
    pub candidate: Address,
    /// 1 for the first round on this candidate
    pub round: u32,
    /// Airline whose proposal opened the round
    pub proposer: Address,
    /// When the round opened
    pub opened_at: DateTime<Utc>,
    /// Ballots in casting order, starting with the proposer's approval
    pub ballots: Vec<Ballot>,
    /// Accepting ballots
    pub open: bool,
    /// `Some(success)` once resolved
    pub outcome: Option<bool>,
}

impl VoteRound {
    fn new(candidate: Address, round: u32, proposer: Address, opened_at: DateTime<Utc>) -> Self {
        Self {
            candidate,
            round,
            ballots: vec![Ballot {
                voter: proposer.clone(),
                approve: true,
            }],
            proposer,
            opened_at,
            open: true,
            outcome: None,
        }
    }

    /// Number of approving ballots
    #[must_use]
    pub fn approvals(&self) -> usize {
        self.ballots.iter().filter(|ballot| ballot.approve).count()
    }

    /// Number of rejecting ballots
    #[must_use]
    pub fn rejections(&self) -> usize {
        self.ballots.len() - self.approvals()
    }

    /// Whether `voter` already cast a ballot in this round
    #[must_use]
    pub fn has_voted(&self, voter: &Address) -> bool {
        self.ballots.iter().any(|ballot| ballot.voter == *voter)
    }

    /// Outcome against an electorate of `electorate` airlines, if decided.
    ///
    /// An even split is a rejection: approvals can no longer exceed half.
    #[must_use]
    pub fn tally(&self, electorate: usize) -> Option<bool> {
        if self.approvals() * 2 > electorate {
            Some(true)
        } else if self.rejections() * 2 >= electorate {
            Some(false)
        } else {
            None
        }
    }
}

/// Membership set, funding status and vote records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registry {
    airlines: HashMap<Address, Airline>,
    /// Registered airlines in admission order
    registered: Vec<Address>,
    votes: HashMap<Address, Vec<VoteRound>>,
}

impl Registry {
    /// A registry whose only member is `first`, registered and unfunded.
    #[must_use]
    pub fn genesis(first: Address) -> Self {
        let mut registry = Self {
            airlines: HashMap::new(),
            registered: Vec::new(),
            votes: HashMap::new(),
        };
        registry.admit(&first);
        registry
    }

    /// Looks up an airline or candidate
    #[must_use]
    pub fn airline(&self, address: &Address) -> Option<&Airline> {
        self.airlines.get(address)
    }

    /// Whether `address` is a registered airline
    #[must_use]
    pub fn is_registered(&self, address: &Address) -> bool {
        self.airline(address).is_some_and(|airline| airline.registered)
    }

    /// Whether `address` is registered and funded
    #[must_use]
    pub fn is_funded(&self, address: &Address) -> bool {
        self.airline(address)
            .is_some_and(|airline| airline.registered && airline.funded)
    }

    /// Registered airlines in admission order
    #[must_use]
    pub fn registered_airlines(&self) -> &[Address] {
        &self.registered
    }

    /// Number of airlines that are registered and funded
    #[must_use]
    pub fn electorate(&self) -> usize {
        self.airlines
            .values()
            .filter(|airline| airline.registered && airline.funded)
            .count()
    }

    /// Every round held on `candidate`, oldest first
    #[must_use]
    pub fn rounds(&self, candidate: &Address) -> &[VoteRound] {
        self.votes.get(candidate).map_or(&[], Vec::as_slice)
    }

    /// The most recent round on `candidate`
    #[must_use]
    pub fn latest_round(&self, candidate: &Address) -> Option<&VoteRound> {
        self.rounds(candidate).last()
    }

    /// Propose `candidate` on behalf of `acting`.
    ///
    /// # Errors
    ///
    /// - [`SuretyError::AirlineNotRegistered`] / [`SuretyError::AirlineNotFunded`]
    ///   if `acting` may not propose
    /// - [`SuretyError::AirlineAlreadyRegistered`] if the candidate is a member
    /// - [`SuretyError::DuplicateVoteRequest`] if a vote on it is open
    pub fn register(
        &mut self,
        candidate: Address,
        acting: Address,
        now: DateTime<Utc>,
        params: &Parameters,
    ) -> Result<Events<SuretyEvent>, SuretyError> {
        self.ensure_member(&acting)?;
        if self.is_registered(&candidate) {
            return Err(SuretyError::AirlineAlreadyRegistered(candidate));
        }

        if self.electorate() < params.unilateral_admissions {
            self.admit(&candidate);
            tracing::info!(airline = %candidate, proposer = %acting, "Airline admitted");
            return Ok(smallvec![SuretyEvent::AirlineRegistered {
                airline: candidate,
                votes: 1,
                success: true,
            }]);
        }

        let rounds = self.votes.entry(candidate.clone()).or_default();
        if rounds.last().is_some_and(|round| round.open) {
            return Err(SuretyError::DuplicateVoteRequest(candidate));
        }
        let round = u32::try_from(rounds.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        rounds.push(VoteRound::new(candidate.clone(), round, acting.clone(), now));
        self.airlines
            .entry(candidate.clone())
            .or_insert_with(|| Airline::candidate(candidate.clone()));

        tracing::info!(candidate = %candidate, proposer = %acting, round, "Admission vote opened");
        Ok(smallvec![SuretyEvent::AirlineVoteOpened {
            candidate,
            proposer: acting,
            round,
        }])
    }

    /// Record `voter`'s ballot on `candidate` and resolve the vote if decided.
    ///
    /// # Errors
    ///
    /// - [`SuretyError::AirlineNotRegistered`] / [`SuretyError::AirlineNotFunded`]
    ///   if `voter` may not vote
    /// - [`SuretyError::NoOpenVote`] if no vote on the candidate is open
    /// - [`SuretyError::AlreadyVoted`] if `voter` already voted this round
    pub fn vote(
        &mut self,
        candidate: Address,
        approve: bool,
        voter: Address,
    ) -> Result<Events<SuretyEvent>, SuretyError> {
        self.ensure_member(&voter)?;
        let electorate = self.electorate();

        let Some(round) = self
            .votes
            .get_mut(&candidate)
            .and_then(|rounds| rounds.last_mut())
            .filter(|round| round.open)
        else {
            return Err(SuretyError::NoOpenVote(candidate));
        };
        if round.has_voted(&voter) {
            return Err(SuretyError::AlreadyVoted { candidate, voter });
        }

        round.ballots.push(Ballot {
            voter: voter.clone(),
            approve,
        });
        let resolution = round.tally(electorate).map(|success| {
            round.open = false;
            round.outcome = Some(success);
            (success, u32::try_from(round.approvals()).unwrap_or(u32::MAX))
        });

        let mut events: Events<SuretyEvent> = smallvec![SuretyEvent::BallotCast {
            candidate: candidate.clone(),
            voter,
            approve,
        }];
        if let Some((success, votes)) = resolution {
            if success {
                self.admit(&candidate);
            }
            tracing::info!(candidate = %candidate, votes, success, electorate, "Admission vote resolved");
            events.push(SuretyEvent::AirlineRegistered {
                airline: candidate,
                votes,
                success,
            });
        }
        Ok(events)
    }

    /// Deposit `amount` for a registered airline.
    ///
    /// # Errors
    ///
    /// - [`SuretyError::AirlineNotRegistered`] if `airline` is not a member
    /// - [`SuretyError::InsufficientFunding`] if `amount` is below the threshold
    pub fn fund(
        &mut self,
        airline: Address,
        amount: Wei,
        params: &Parameters,
    ) -> Result<Events<SuretyEvent>, SuretyError> {
        let Some(entry) = self
            .airlines
            .get_mut(&airline)
            .filter(|entry| entry.registered)
        else {
            return Err(SuretyError::AirlineNotRegistered(airline));
        };
        if amount < params.funding_threshold {
            return Err(SuretyError::InsufficientFunding {
                amount,
                required: params.funding_threshold,
            });
        }

        let total = entry
            .deposit
            .checked_add(amount)
            .ok_or(SuretyError::AmountOverflow)?;
        entry.deposit = total;
        entry.funded = true;

        Ok(smallvec![SuretyEvent::AirlineFunded {
            airline,
            amount,
            total,
        }])
    }

    fn ensure_member(&self, address: &Address) -> Result<(), SuretyError> {
        match self.airline(address) {
            Some(airline) if airline.registered && airline.funded => Ok(()),
            Some(airline) if airline.registered => {
                Err(SuretyError::AirlineNotFunded(address.clone()))
            }
            _ => Err(SuretyError::AirlineNotRegistered(address.clone())),
        }
    }

    fn admit(&mut self, candidate: &Address) {
        let entry = self
            .airlines
            .entry(candidate.clone())
            .or_insert_with(|| Airline::candidate(candidate.clone()));
        entry.registered = true;
        self.registered.push(candidate.clone());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn round_with(approvals: usize, rejections: usize) -> VoteRound {
        let mut round = VoteRound::new(
            Address::new("candidate"),
            1,
            Address::new("voter-0"),
            DateTime::<Utc>::UNIX_EPOCH,
        );
        for i in 1..approvals {
            round.ballots.push(Ballot {
                voter: Address::new(format!("voter-{i}")),
                approve: true,
            });
        }
        for i in 0..rejections {
            round.ballots.push(Ballot {
                voter: Address::new(format!("against-{i}")),
                approve: false,
            });
        }
        round
    }

    #[test]
    fn tally_requires_strict_majority() {
        assert_eq!(round_with(2, 0).tally(4), None);
        assert_eq!(round_with(3, 0).tally(4), Some(true));
        assert_eq!(round_with(3, 0).tally(5), Some(true));
        assert_eq!(round_with(2, 1).tally(5), None);
    }

    #[test]
    fn tally_rejects_once_majority_is_out_of_reach() {
        assert_eq!(round_with(1, 1).tally(4), None);
        assert_eq!(round_with(1, 2).tally(4), Some(false));
        assert_eq!(round_with(1, 2).tally(5), None);
        assert_eq!(round_with(1, 3).tally(5), Some(false));
    }

    #[test]
    fn genesis_airline_is_registered_but_unfunded() {
        let registry = Registry::genesis(Address::new("A0"));
        assert!(registry.is_registered(&Address::new("A0")));
        assert!(!registry.is_funded(&Address::new("A0")));
        assert_eq!(registry.electorate(), 0);
        assert_eq!(registry.registered_airlines(), &[Address::new("A0")]);
    }

    #[test]
    fn unregistered_airlines_cannot_be_funded() {
        let mut registry = Registry::genesis(Address::new("A0"));
        let error = registry
            .fund(Address::new("X"), Wei::units(10), &Parameters::default())
            .unwrap_err();
        assert_eq!(error, SuretyError::AirlineNotRegistered(Address::new("X")));
    }

    #[test]
    fn repeat_funding_accumulates_deposit() {
        let params = Parameters::default();
        let mut registry = Registry::genesis(Address::new("A0"));
        registry
            .fund(Address::new("A0"), Wei::units(10), &params)
            .unwrap();
        let events = registry
            .fund(Address::new("A0"), Wei::units(12), &params)
            .unwrap();

        assert_eq!(
            events.as_slice(),
            &[SuretyEvent::AirlineFunded {
                airline: Address::new("A0"),
                amount: Wei::units(12),
                total: Wei::units(22),
            }]
        );
        assert!(registry.is_funded(&Address::new("A0")));
    }
}
