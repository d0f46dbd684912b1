//! Relay behaviour against an in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use flight_surety::oracle::RequestKey;
use flight_surety::{
    Address, Answer, Query, StatusCode, SuretyCommand, SuretyEnvironment, SuretyEvent,
    SuretyReducer, SuretyState, Wei,
};
use flight_surety_relay::{FixedStatus, OracleRelay, RelayConfig};
use flight_surety_runtime::{Store, Subscription};
use flight_surety_testing::{ScriptedRandom, init_tracing, test_clock};
use std::sync::Arc;
use std::time::Duration;

const DEPARTURE: u64 = 1_700_000_000;

fn store(script: impl IntoIterator<Item = u32>) -> Store<SuretyReducer> {
    init_tracing();
    Store::new(
        SuretyState::genesis(Address::new("owner"), Address::new("A0")),
        SuretyReducer::new(),
        SuretyEnvironment::new(Arc::new(test_clock()), Arc::new(ScriptedRandom::new(script))),
    )
}

fn config(oracle_count: usize) -> RelayConfig {
    RelayConfig {
        oracle_count,
        ..RelayConfig::default()
    }
}

async fn insure(store: &Store<SuretyReducer>, passenger: &str, flight: &str) {
    store
        .submit(SuretyCommand::FundAirline {
            airline: Address::new("A0"),
            amount: Wei::units(10),
        })
        .await
        .ok();
    store
        .submit(SuretyCommand::PurchasePolicy {
            passenger: Address::new(passenger),
            airline: Address::new("A0"),
            flight: flight.to_string(),
            value: Wei::units(1),
        })
        .await
        .unwrap();
}

async fn request(store: &Store<SuretyReducer>, flight: &str) {
    store
        .submit(SuretyCommand::FetchFlightStatus {
            airline: Address::new("A0"),
            flight: flight.to_string(),
            timestamp: DEPARTURE,
        })
        .await
        .unwrap();
}

/// Wait for the agreed status of `flight`.
async fn agreed(events: &mut Subscription<SuretyEvent>, flight: &str) -> StatusCode {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let recorded = events.next().await.unwrap().expect("store dropped");
            if let SuretyEvent::FlightStatusInfo {
                flight: agreed_flight,
                status,
                ..
            } = recorded.event
            {
                if agreed_flight == flight {
                    return status;
                }
            }
        }
    })
    .await
    .expect("no status agreed in time")
}

#[tokio::test]
async fn test_relay_resolves_request_and_credits_passenger() {
    // Every draw is 0: each oracle holds [0, 1, 2], requests sample index 0.
    let store = store([0]);
    insure(&store, "P1", "QF1").await;

    let (relay, shutdown) = OracleRelay::bootstrap(
        store.clone(),
        &config(3),
        FixedStatus(StatusCode::LateAirline),
    )
    .await
    .unwrap();
    assert_eq!(relay.assignments().get(&0).map(Vec::len), Some(3));
    let worker = tokio::spawn(relay.run());

    let mut events = store.subscribe().await.unwrap();
    request(&store, "QF1").await;
    assert_eq!(agreed(&mut events, "QF1").await, StatusCode::LateAirline);

    assert_eq!(
        store.query(&Query::Credits(Address::new("P1"))).await,
        Ok(Answer::Amount(Wei::fraction(3, 2)))
    );

    shutdown.send(true).unwrap();
    worker.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_relay_answers_requests_made_before_it_started() {
    let store = store([0]);
    insure(&store, "P1", "QF1").await;

    let (relay, shutdown) = OracleRelay::bootstrap(
        store.clone(),
        &config(3),
        FixedStatus(StatusCode::OnTime),
    )
    .await
    .unwrap();

    let mut events = store.subscribe().await.unwrap();
    request(&store, "QF1").await;
    let worker = tokio::spawn(relay.run());

    assert_eq!(agreed(&mut events, "QF1").await, StatusCode::OnTime);
    assert_eq!(
        store.query(&Query::Credits(Address::new("P1"))).await,
        Ok(Answer::Amount(Wei::ZERO))
    );

    drop(shutdown);
    worker.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_requests_for_unheld_indices_are_ignored() {
    // Nine zeros register three oracles on [0, 1, 2]; QF1 then samples
    // index 7 and QF2 wraps around to index 0.
    let store = store([0, 0, 0, 0, 0, 0, 0, 0, 0, 7, 0]);
    let (relay, shutdown) = OracleRelay::bootstrap(
        store.clone(),
        &config(3),
        FixedStatus(StatusCode::OnTime),
    )
    .await
    .unwrap();
    assert!(!relay.assignments().contains_key(&7));
    let worker = tokio::spawn(relay.run());

    let mut events = store.subscribe().await.unwrap();
    request(&store, "QF1").await;
    request(&store, "QF2").await;

    // Requests are handled in order, so QF1 was already skipped.
    assert_eq!(agreed(&mut events, "QF2").await, StatusCode::OnTime);
    let unanswered = store
        .state(|state| {
            state
                .oracles
                .request(&RequestKey {
                    index: 7,
                    airline: Address::new("A0"),
                    flight: "QF1".to_string(),
                    timestamp: DEPARTURE,
                })
                .map(|request| request.responses.len())
        })
        .await;
    assert_eq!(unanswered, Some(0));

    shutdown.send(true).unwrap();
    worker.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_bootstrap_twice_reuses_registrations() {
    let store = store([0]);

    let (first, _first_shutdown) =
        OracleRelay::bootstrap(store.clone(), &config(4), FixedStatus(StatusCode::OnTime))
            .await
            .unwrap();
    let head = store.head().await.unwrap();

    let (second, _second_shutdown) =
        OracleRelay::bootstrap(store.clone(), &config(4), FixedStatus(StatusCode::OnTime))
            .await
            .unwrap();

    assert_eq!(store.head().await.unwrap(), head);
    assert_eq!(first.assignments(), second.assignments());
}

#[tokio::test]
async fn test_bootstrap_fails_when_gate_is_closed() {
    let store = store([0]);
    store
        .submit(SuretyCommand::SetOperatingStatus {
            operational: false,
            caller: Address::new("owner"),
        })
        .await
        .unwrap();

    let outcome =
        OracleRelay::bootstrap(store.clone(), &config(1), FixedStatus(StatusCode::OnTime)).await;
    assert!(outcome.is_err());
}
