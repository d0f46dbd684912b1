//! Oracle consensus engine.
//!
//! Oracles register with a fee and receive [`INDICES_PER_ORACLE`] distinct
//! indices. A status request samples one index; only oracles holding it may
//! answer. The first status reported by `min_responses` distinct oracles
//! resolves the request, after which further answers are accepted and
//! ignored.

use chrono::{DateTime, Utc};
use flight_surety_core::environment::RandomSource;
use flight_surety_core::reducer::Events;
use flight_surety_core::smallvec;
use std::collections::HashMap;

use crate::error::SuretyError;
use crate::event::SuretyEvent;
use crate::types::{Address, INDEX_SPACE, INDICES_PER_ORACLE, Parameters, StatusCode, Wei};

/// A registered oracle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Oracle {
    /// Identity
    pub address: Address,
    /// Assigned indices, fixed at registration
    pub indexes: [u8; INDICES_PER_ORACLE],
    /// Registration fee paid
    pub fee: Wei,
}

/// Identifies a status request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    /// Sampled index
    pub index: u8,
    /// Airline operating the flight
    pub airline: Address,
    /// Flight code
    pub flight: String,
    /// Departure timestamp
    pub timestamp: u64,
}

/// A solicited status request and the answers collected so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleRequest {
    /// When the request was first opened
    pub requested_at: DateTime<Utc>,
    /// Status reported by each responding oracle
    pub responses: HashMap<Address, StatusCode>,
    /// Agreed status once resolved; never changes afterwards
    pub resolved: Option<StatusCode>,
}

impl OracleRequest {
    fn new(requested_at: DateTime<Utc>) -> Self {
        Self {
            requested_at,
            responses: HashMap::new(),
            resolved: None,
        }
    }

    /// Number of oracles that reported `status`
    #[must_use]
    pub fn agreeing(&self, status: StatusCode) -> usize {
        self.responses
            .values()
            .filter(|reported| **reported == status)
            .count()
    }
}

/// The last agreed status of a flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlightStatus {
    /// Flight code
    pub flight: String,
    /// Airline operating the flight
    pub airline: Address,
    /// Departure timestamp of the resolved request
    pub timestamp: u64,
    /// Agreed status
    pub status: StatusCode,
}

/// A request that just resolved, handed to the policy ledger for settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Airline operating the flight
    pub airline: Address,
    /// Flight code
    pub flight: String,
    /// Agreed status
    pub status: StatusCode,
}

/// Oracle registrations, open requests and resolved flight statuses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Oracles {
    oracles: HashMap<Address, Oracle>,
    requests: HashMap<RequestKey, OracleRequest>,
    statuses: HashMap<String, FlightStatus>,
}

impl Oracles {
    /// Looks up a registered oracle
    #[must_use]
    pub fn oracle(&self, address: &Address) -> Option<&Oracle> {
        self.oracles.get(address)
    }

    /// Indices assigned to `oracle`.
    ///
    /// # Errors
    ///
    /// Returns [`SuretyError::OracleNotRegistered`] for unknown oracles.
    pub fn indexes(&self, oracle: &Address) -> Result<[u8; INDICES_PER_ORACLE], SuretyError> {
        self.oracle(oracle)
            .map(|registered| registered.indexes)
            .ok_or_else(|| SuretyError::OracleNotRegistered(oracle.clone()))
    }

    /// Looks up a request
    #[must_use]
    pub fn request(&self, key: &RequestKey) -> Option<&OracleRequest> {
        self.requests.get(key)
    }

    /// Last agreed status of `flight`
    #[must_use]
    pub fn flight_status(&self, flight: &str) -> Option<&FlightStatus> {
        self.statuses.get(flight)
    }

    /// Register `oracle` and draw its indices.
    ///
    /// # Errors
    ///
    /// - [`SuretyError::InsufficientFee`] if `fee` is below the registration fee
    /// - [`SuretyError::OracleAlreadyRegistered`] for a second registration
    pub fn register(
        &mut self,
        oracle: Address,
        fee: Wei,
        rng: &dyn RandomSource,
        params: &Parameters,
    ) -> Result<Events<SuretyEvent>, SuretyError> {
        if fee < params.oracle_fee {
            return Err(SuretyError::InsufficientFee {
                fee,
                required: params.oracle_fee,
            });
        }
        if self.oracles.contains_key(&oracle) {
            return Err(SuretyError::OracleAlreadyRegistered(oracle));
        }

        let indexes = draw_indexes(rng);
        self.oracles.insert(
            oracle.clone(),
            Oracle {
                address: oracle.clone(),
                indexes,
                fee,
            },
        );

        tracing::debug!(oracle = %oracle, ?indexes, "Oracle registered");
        Ok(smallvec![SuretyEvent::OracleRegistered { oracle, indexes }])
    }

    /// Sample an index and solicit answers for the flight.
    ///
    /// Re-fetching an existing request emits the event again and keeps the
    /// collected answers.
    pub fn fetch(
        &mut self,
        airline: Address,
        flight: String,
        timestamp: u64,
        rng: &dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Events<SuretyEvent> {
        let index = u8::try_from(rng.below(u32::from(INDEX_SPACE))).unwrap_or_default();
        self.requests
            .entry(RequestKey {
                index,
                airline: airline.clone(),
                flight: flight.clone(),
                timestamp,
            })
            .or_insert_with(|| OracleRequest::new(now));

        smallvec![SuretyEvent::OracleRequest {
            index,
            airline,
            flight,
            timestamp,
        }]
    }

    /// Record an oracle's answer, resolving the request on agreement.
    ///
    /// Returns the emitted events and, when this answer resolved the request,
    /// the resolution to settle.
    ///
    /// # Errors
    ///
    /// - [`SuretyError::OracleNotRegistered`] / [`SuretyError::IndexNotAssigned`]
    ///   if the oracle may not answer under `index`
    /// - [`SuretyError::UnknownStatusCode`] for codes outside the known set
    /// - [`SuretyError::RequestNotOpen`] if the request was never solicited
    /// - [`SuretyError::DuplicateResponse`] if the oracle already answered
    pub fn submit(
        &mut self,
        oracle: Address,
        key: RequestKey,
        status: u8,
        params: &Parameters,
    ) -> Result<(Events<SuretyEvent>, Option<Resolution>), SuretyError> {
        let registered = self
            .oracles
            .get(&oracle)
            .ok_or_else(|| SuretyError::OracleNotRegistered(oracle.clone()))?;
        if !registered.indexes.contains(&key.index) {
            return Err(SuretyError::IndexNotAssigned {
                oracle,
                index: key.index,
            });
        }
        let status = StatusCode::try_from(status)?;

        let Some(request) = self.requests.get_mut(&key) else {
            return Err(SuretyError::RequestNotOpen {
                index: key.index,
                flight: key.flight,
                timestamp: key.timestamp,
            });
        };
        if let Some(resolved) = request.resolved {
            tracing::debug!(oracle = %oracle, flight = %key.flight, %resolved, "Late response ignored");
            return Ok((Events::new(), None));
        }
        if request.responses.contains_key(&oracle) {
            return Err(SuretyError::DuplicateResponse(oracle));
        }

        request.responses.insert(oracle, status);
        let mut events: Events<SuretyEvent> = smallvec![SuretyEvent::OracleReport {
            airline: key.airline.clone(),
            flight: key.flight.clone(),
            timestamp: key.timestamp,
            status,
        }];

        if request.agreeing(status) < params.min_responses {
            return Ok((events, None));
        }

        request.resolved = Some(status);
        self.statuses.insert(
            key.flight.clone(),
            FlightStatus {
                flight: key.flight.clone(),
                airline: key.airline.clone(),
                timestamp: key.timestamp,
                status,
            },
        );
        tracing::info!(flight = %key.flight, airline = %key.airline, timestamp = key.timestamp, %status, "Flight status resolved");

        events.push(SuretyEvent::FlightStatusInfo {
            airline: key.airline.clone(),
            flight: key.flight.clone(),
            timestamp: key.timestamp,
            status,
        });
        Ok((
            events,
            Some(Resolution {
                airline: key.airline,
                flight: key.flight,
                status,
            }),
        ))
    }
}

/// Draws distinct indices, each uniformly from those not yet taken.
fn draw_indexes(rng: &dyn RandomSource) -> [u8; INDICES_PER_ORACLE] {
    let mut pool: Vec<u8> = (0..INDEX_SPACE).collect();
    let mut indexes = [0; INDICES_PER_ORACLE];
    for slot in &mut indexes {
        let bound = u32::try_from(pool.len()).unwrap_or(u32::MAX);
        let pick = usize::try_from(rng.below(bound)).unwrap_or_default() % pool.len();
        *slot = pool.remove(pick);
    }
    indexes
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use flight_surety_testing::ScriptedRandom;

    fn key(index: u8) -> RequestKey {
        RequestKey {
            index,
            airline: Address::new("A0"),
            flight: "QF1".to_string(),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn drawn_indexes_are_distinct() {
        let rng = ScriptedRandom::new([3, 3, 3]);
        assert_eq!(draw_indexes(&rng), [3, 4, 5]);

        let rng = ScriptedRandom::new(Vec::new());
        assert_eq!(draw_indexes(&rng), [0, 1, 2]);
    }

    #[test]
    fn registration_requires_fee_and_is_unique() {
        let mut oracles = Oracles::default();
        let params = Parameters::default();
        let rng = ScriptedRandom::new([1, 2, 3]);

        let error = oracles
            .register(Address::new("O1"), Wei::fraction(1, 2), &rng, &params)
            .unwrap_err();
        assert!(matches!(error, SuretyError::InsufficientFee { .. }));

        oracles
            .register(Address::new("O1"), Wei::units(1), &rng, &params)
            .unwrap();
        assert_eq!(oracles.indexes(&Address::new("O1")).unwrap(), [1, 3, 5]);

        let error = oracles
            .register(Address::new("O1"), Wei::units(1), &rng, &params)
            .unwrap_err();
        assert_eq!(error, SuretyError::OracleAlreadyRegistered(Address::new("O1")));
        assert_eq!(
            oracles.indexes(&Address::new("O2")),
            Err(SuretyError::OracleNotRegistered(Address::new("O2")))
        );
    }

    #[test]
    fn unsolicited_responses_are_rejected() {
        let mut oracles = Oracles::default();
        let params = Parameters::default();
        oracles
            .register(Address::new("O1"), Wei::units(1), &ScriptedRandom::new([0]), &params)
            .unwrap();

        let error = oracles
            .submit(Address::new("O1"), key(0), 10, &params)
            .unwrap_err();
        assert!(matches!(error, SuretyError::RequestNotOpen { index: 0, .. }));
    }

    #[test]
    fn three_agreeing_oracles_resolve_once() {
        let mut oracles = Oracles::default();
        let params = Parameters::default();
        // Every oracle gets indices [0, 1, 2]; the request samples index 0.
        let rng = ScriptedRandom::new([0]);
        for name in ["O1", "O2", "O3", "O4"] {
            oracles
                .register(Address::new(name), Wei::units(1), &rng, &params)
                .unwrap();
        }
        oracles.fetch(
            Address::new("A0"),
            "QF1".to_string(),
            1_700_000_000,
            &rng,
            DateTime::<Utc>::UNIX_EPOCH,
        );

        let (_, resolution) = oracles
            .submit(Address::new("O1"), key(0), 20, &params)
            .unwrap();
        assert!(resolution.is_none());
        oracles
            .submit(Address::new("O2"), key(0), 10, &params)
            .unwrap();
        oracles
            .submit(Address::new("O3"), key(0), 20, &params)
            .unwrap();
        let (events, resolution) = oracles
            .submit(Address::new("O4"), key(0), 20, &params)
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(resolution.unwrap().status, StatusCode::LateAirline);
        assert_eq!(
            oracles.flight_status("QF1").unwrap().status,
            StatusCode::LateAirline
        );

        let (late, resolution) = oracles
            .submit(Address::new("O2"), key(0), 20, &params)
            .unwrap();
        assert!(late.is_empty());
        assert!(resolution.is_none());
        assert_eq!(
            oracles.request(&key(0)).unwrap().resolved,
            Some(StatusCode::LateAirline)
        );
    }

    #[test]
    fn duplicate_response_is_not_double_counted() {
        let mut oracles = Oracles::default();
        let params = Parameters::default();
        let rng = ScriptedRandom::new([0]);
        oracles
            .register(Address::new("O1"), Wei::units(1), &rng, &params)
            .unwrap();
        oracles.fetch(
            Address::new("A0"),
            "QF1".to_string(),
            1_700_000_000,
            &rng,
            DateTime::<Utc>::UNIX_EPOCH,
        );

        oracles
            .submit(Address::new("O1"), key(0), 20, &params)
            .unwrap();
        let error = oracles
            .submit(Address::new("O1"), key(0), 20, &params)
            .unwrap_err();
        assert_eq!(error, SuretyError::DuplicateResponse(Address::new("O1")));
        assert_eq!(
            oracles.request(&key(0)).unwrap().agreeing(StatusCode::LateAirline),
            1
        );
    }

    #[test]
    fn unassigned_index_and_unknown_status_are_rejected() {
        let mut oracles = Oracles::default();
        let params = Parameters::default();
        oracles
            .register(Address::new("O1"), Wei::units(1), &ScriptedRandom::new([0]), &params)
            .unwrap();

        let error = oracles
            .submit(Address::new("O1"), key(9), 20, &params)
            .unwrap_err();
        assert_eq!(
            error,
            SuretyError::IndexNotAssigned {
                oracle: Address::new("O1"),
                index: 9
            }
        );

        let error = oracles
            .submit(Address::new("O1"), key(0), 21, &params)
            .unwrap_err();
        assert_eq!(error, SuretyError::UnknownStatusCode(21));
    }
}
