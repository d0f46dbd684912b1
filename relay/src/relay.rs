//! The oracle relay worker.
//!
//! Registers its oracles once, then follows the store's event stream from
//! genesis and answers every request addressed to an index it holds.

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::status::StatusGenerator;
use flight_surety::oracle::RequestKey;
use flight_surety::{
    Address, Answer, Query, SuretyCommand, SuretyError, SuretyEvent, SuretyReducer,
};
use flight_surety_core::journal::Sequence;
use flight_surety_runtime::{Store, StoreError};
use std::collections::BTreeMap;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Submits oracle responses on behalf of a pool of registered oracles.
///
/// Rejected responses are logged and counted, never retried.
pub struct OracleRelay<G> {
    store: Store<SuretyReducer>,
    generator: G,
    /// Index -> oracles holding it
    assignments: BTreeMap<u8, Vec<Address>>,
    /// Shutdown signal
    shutdown: watch::Receiver<bool>,
}

impl<G> OracleRelay<G>
where
    G: StatusGenerator,
{
    /// Register `config.oracle_count` oracles and learn their indices.
    ///
    /// Oracles are named `oracle-0`, `oracle-1`, ... so a restarted relay
    /// picks up its earlier registrations instead of failing on them.
    ///
    /// Returns the relay and a shutdown sender. Send `true` to stop
    /// [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Store`] if a registration is refused for any
    /// reason other than the oracle already being registered, and
    /// [`RelayError::Query`] if its indices cannot be read.
    pub async fn bootstrap(
        store: Store<SuretyReducer>,
        config: &RelayConfig,
        generator: G,
    ) -> Result<(Self, watch::Sender<bool>), RelayError> {
        let mut assignments: BTreeMap<u8, Vec<Address>> = BTreeMap::new();

        for i in 0..config.oracle_count {
            let oracle = Address::new(format!("oracle-{i}"));
            match store
                .submit(SuretyCommand::RegisterOracle {
                    oracle: oracle.clone(),
                    fee: config.oracle_fee,
                })
                .await
            {
                Ok(_) => debug!(%oracle, "Oracle registered"),
                Err(StoreError::Rejected(SuretyError::OracleAlreadyRegistered(_))) => {
                    debug!(%oracle, "Oracle already registered");
                }
                Err(error) => return Err(error.into()),
            }

            let Answer::Indexes(indexes) = store.query(&Query::MyIndexes(oracle.clone())).await?
            else {
                return Err(RelayError::UnexpectedAnswer("MyIndexes"));
            };
            for index in indexes {
                assignments.entry(index).or_default().push(oracle.clone());
            }
        }

        info!(
            oracles = config.oracle_count,
            indices = assignments.len(),
            "Oracle relay bootstrapped"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let relay = Self {
            store,
            generator,
            assignments,
            shutdown: shutdown_rx,
        };
        Ok((relay, shutdown_tx))
    }

    /// Oracles holding each index.
    #[must_use]
    pub const fn assignments(&self) -> &BTreeMap<u8, Vec<Address>> {
        &self.assignments
    }

    /// Follow the event stream until shutdown.
    ///
    /// Replays every request since genesis before following live events.
    /// Dropping the shutdown sender stops the relay as well.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Store`] if the event stream cannot be opened or
    /// read.
    pub async fn run(mut self) -> Result<(), RelayError> {
        let mut events = self.store.subscribe_from(Sequence::GENESIS).await?;
        info!("Oracle relay started");

        while !*self.shutdown.borrow() {
            tokio::select! {
                next = events.next() => match next {
                    Ok(Some(recorded)) => {
                        if let SuretyEvent::OracleRequest { index, airline, flight, timestamp } =
                            recorded.event
                        {
                            self.respond(&RequestKey { index, airline, flight, timestamp })
                                .await;
                        }
                    }
                    Ok(None) => {
                        info!("Event stream closed, stopping oracle relay");
                        break;
                    }
                    Err(error) => {
                        error!(%error, "Failed to read event stream");
                        return Err(StoreError::Subscription(error).into());
                    }
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("Shutdown signal received, stopping oracle relay");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    async fn respond(&self, request: &RequestKey) {
        let Some(oracles) = self.assignments.get(&request.index) else {
            debug!(index = request.index, flight = %request.flight, "No oracle holds index");
            return;
        };

        for oracle in oracles {
            let status = self.generator.status(oracle, request);
            let command = SuretyCommand::SubmitOracleResponse {
                oracle: oracle.clone(),
                index: request.index,
                airline: request.airline.clone(),
                flight: request.flight.clone(),
                timestamp: request.timestamp,
                status: status.code(),
            };

            match self.store.submit(command).await {
                Ok(receipt) => {
                    metrics::counter!("relay.responses.submitted").increment(1);
                    debug!(
                        %oracle,
                        %status,
                        flight = %request.flight,
                        sequence = %receipt.sequence,
                        "Oracle response submitted"
                    );
                }
                Err(error) => {
                    metrics::counter!("relay.responses.failed").increment(1);
                    warn!(%oracle, %error, flight = %request.flight, "Oracle response rejected");
                }
            }
        }
    }
}
