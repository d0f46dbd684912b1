//! The Flight Surety reducer.
//!
//! Routes each command through the operational gate to the component that
//! owns it. Oracle resolutions are settled by the policy ledger inside the
//! same transition.

use flight_surety_core::command::Command;
use flight_surety_core::environment::{Clock, RandomSource};
use flight_surety_core::reducer::{Events, Reducer};
use std::sync::Arc;

use crate::command::SuretyCommand;
use crate::error::SuretyError;
use crate::event::SuretyEvent;
use crate::oracle::RequestKey;
use crate::state::SuretyState;
use crate::types::{Parameters, flight_code};

/// Environment dependencies for the Flight Surety reducer
#[derive(Clone)]
pub struct SuretyEnvironment {
    /// Clock for vote and purchase timestamps
    pub clock: Arc<dyn Clock>,
    /// Randomness for index assignment and request sampling
    pub rng: Arc<dyn RandomSource>,
}

impl SuretyEnvironment {
    /// Creates a new `SuretyEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, rng: Arc<dyn RandomSource>) -> Self {
        Self { clock, rng }
    }
}

/// Reducer for the insurance state machine
#[derive(Clone, Debug, Default)]
pub struct SuretyReducer {
    params: Parameters,
}

impl SuretyReducer {
    /// Creates a reducer with the default [`Parameters`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reducer with custom parameters
    #[must_use]
    pub const fn with_parameters(params: Parameters) -> Self {
        Self { params }
    }

    /// Parameters in effect
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.params
    }
}

impl Reducer for SuretyReducer {
    type State = SuretyState;
    type Command = SuretyCommand;
    type Event = SuretyEvent;
    type Error = SuretyError;
    type Environment = SuretyEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        command: Self::Command,
        env: &Self::Environment,
    ) -> Result<Events<SuretyEvent>, SuretyError> {
        if command.requires_operational() {
            state.gate.ensure_open()?;
        }

        match command {
            SuretyCommand::SetOperatingStatus {
                operational,
                caller,
            } => state.gate.set_operating_status(operational, &caller),

            SuretyCommand::RegisterAirline { candidate, acting } => {
                state
                    .registry
                    .register(candidate, acting, env.clock.now(), &self.params)
            }

            SuretyCommand::VoteOnNewAirline {
                candidate,
                approve,
                voter,
            } => state.registry.vote(candidate, approve, voter),

            SuretyCommand::FundAirline { airline, amount } => {
                state.registry.fund(airline, amount, &self.params)
            }

            SuretyCommand::PurchasePolicy {
                passenger,
                airline,
                flight,
                value,
            } => {
                let flight = flight_code(&flight)?;
                if !state.registry.is_registered(&airline) {
                    return Err(SuretyError::AirlineNotRegistered(airline));
                }
                state.ledger.purchase(
                    passenger,
                    airline,
                    flight,
                    value,
                    env.clock.now(),
                    &self.params,
                )
            }

            SuretyCommand::WithdrawCredits { passenger } => state.ledger.withdraw(passenger),

            SuretyCommand::RegisterOracle { oracle, fee } => {
                state
                    .oracles
                    .register(oracle, fee, env.rng.as_ref(), &self.params)
            }

            SuretyCommand::FetchFlightStatus {
                airline,
                flight,
                timestamp,
            } => {
                let flight = flight_code(&flight)?;
                Ok(state.oracles.fetch(
                    airline,
                    flight,
                    timestamp,
                    env.rng.as_ref(),
                    env.clock.now(),
                ))
            }

            SuretyCommand::SubmitOracleResponse {
                oracle,
                index,
                airline,
                flight,
                timestamp,
                status,
            } => {
                let key = RequestKey {
                    index,
                    airline,
                    flight: flight_code(&flight)?,
                    timestamp,
                };
                let (mut events, resolution) =
                    state.oracles.submit(oracle, key, status, &self.params)?;
                if let Some(resolution) = resolution {
                    events.extend(state.ledger.settle(
                        &resolution.airline,
                        &resolution.flight,
                        resolution.status,
                        &self.params,
                    )?);
                }
                Ok(events)
            }
        }
    }
}
