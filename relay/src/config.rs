//! Configuration for the relay and the devnet.
//!
//! Loads configuration from environment variables with sensible defaults.

use flight_surety::Wei;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::{Ipv4Addr, SocketAddr};

/// Relay configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Number of oracles to register (`ORACLE_COUNT`, default 20)
    pub oracle_count: usize,
    /// Registration fee paid per oracle (`ORACLE_FEE_WEI`, default 1 unit)
    pub oracle_fee: Wei,
    /// Seed for the random source (`RNG_SEED`); entropy when unset
    pub rng_seed: Option<u64>,
    /// Metrics address (`METRICS_ADDR`, default `0.0.0.0:9090`)
    pub metrics_addr: SocketAddr,
    /// Flights the devnet insures and requests (`DEMO_FLIGHTS`, comma-separated)
    pub demo_flights: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            oracle_count: 20,
            oracle_fee: Wei::units(1),
            rng_seed: None,
            metrics_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            demo_flights: vec!["QF1".to_string(), "QF2".to_string(), "QF3".to_string()],
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            oracle_count: lookup("ORACLE_COUNT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.oracle_count),
            oracle_fee: lookup("ORACLE_FEE_WEI")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.oracle_fee, Wei::new),
            rng_seed: lookup("RNG_SEED").and_then(|s| s.parse().ok()),
            metrics_addr: lookup("METRICS_ADDR")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.metrics_addr),
            demo_flights: lookup("DEMO_FLIGHTS")
                .map(|s| parse_flights(&s))
                .filter(|flights| !flights.is_empty())
                .unwrap_or(defaults.demo_flights),
        }
    }
}

fn parse_flights(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|flight| !flight.is_empty())
        .map(str::to_string)
        .collect()
}
