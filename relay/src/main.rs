//! Local Flight Surety devnet.
//!
//! Starts an in-memory store, funds a first airline, sells demo policies,
//! runs the oracle relay and requests a status for every demo flight.
//! Resolutions and payouts are logged until Ctrl+C.

use flight_surety::{
    Address, Answer, Query, SuretyCommand, SuretyEnvironment, SuretyEvent, SuretyReducer,
    SuretyState, Wei,
};
use flight_surety_core::environment::{Clock, RandomSource, SeededRandom, SystemClock};
use flight_surety_relay::{OracleRelay, RandomStatus, RelayConfig};
use flight_surety_runtime::Store;
use flight_surety_runtime::metrics::MetricsServer;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_surety=info,flight_surety_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Flight Surety devnet");

    let config = RelayConfig::from_env();
    info!(config = %serde_json::to_string(&config)?, "Configuration loaded");

    let mut metrics = MetricsServer::new(config.metrics_addr);
    metrics.start()?;
    info!("Prometheus metrics available at http://{}/metrics", metrics.addr());

    let rng: Arc<dyn RandomSource> = Arc::new(
        config
            .rng_seed
            .map_or_else(SeededRandom::from_entropy, SeededRandom::new),
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let first_airline = Address::new("airline-0");
    let reducer = SuretyReducer::new();
    info!(parameters = %serde_json::to_string(reducer.parameters())?, "Parameters loaded");
    let store = Store::new(
        SuretyState::genesis(Address::new("owner"), first_airline.clone()),
        reducer,
        SuretyEnvironment::new(Arc::clone(&clock), Arc::clone(&rng)),
    );

    store
        .submit(SuretyCommand::FundAirline {
            airline: first_airline.clone(),
            amount: Wei::units(10),
        })
        .await?;
    info!(airline = %first_airline, "First airline funded");

    let (relay, shutdown) =
        OracleRelay::bootstrap(store.clone(), &config, RandomStatus::new(Arc::clone(&rng))).await?;
    let worker = tokio::spawn(relay.run());

    let mut events = store.subscribe().await?;
    let departure = u64::try_from(clock.now().timestamp()).unwrap_or_default();
    for (i, flight) in config.demo_flights.iter().enumerate() {
        let passenger = Address::new(format!("passenger-{i}"));
        store
            .submit(SuretyCommand::PurchasePolicy {
                passenger: passenger.clone(),
                airline: first_airline.clone(),
                flight: flight.clone(),
                value: Wei::units(1),
            })
            .await?;
        store
            .submit(SuretyCommand::FetchFlightStatus {
                airline: first_airline.clone(),
                flight: flight.clone(),
                timestamp: departure,
            })
            .await?;
        info!(%passenger, %flight, "Policy sold and status requested");
    }

    info!("Devnet running. Press Ctrl+C to exit");
    loop {
        tokio::select! {
            next = events.next() => match next? {
                Some(recorded) => match recorded.event {
                    SuretyEvent::FlightStatusInfo { flight, status, .. } => {
                        info!(%flight, %status, "Flight status agreed");
                    }
                    SuretyEvent::PassengerCredited { passenger, flight, amount } => {
                        info!(%passenger, %flight, %amount, "Passenger credited");
                    }
                    _ => {}
                },
                None => break,
            },
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received, stopping...");
                break;
            }
        }
    }

    shutdown.send(true).ok();
    worker.await??;

    if let Answer::Statuses(statuses) = store
        .query(&Query::FlightStatuses(config.demo_flights.clone()))
        .await?
    {
        info!(
            resolved = statuses.len(),
            requested = config.demo_flights.len(),
            "Final flight statuses"
        );
    }
    if let Some(snapshot) = metrics.render() {
        debug!(%snapshot, "Metrics snapshot");
    }

    info!("Clean shutdown complete");
    Ok(())
}
