//! Errors raised by the relay and the devnet.

use flight_surety::SuretyError;
use flight_surety_runtime::StoreError;
use flight_surety_runtime::metrics::MetricsError;
use thiserror::Error;

/// Errors that stop the relay.
///
/// Rejected oracle responses are not errors: they are logged and skipped.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The store failed a command or a subscription
    #[error("Store error: {0}")]
    Store(#[from] StoreError<SuretyError>),

    /// A query was refused
    #[error("Query failed: {0}")]
    Query(#[from] SuretyError),

    /// A query came back with an answer of the wrong shape
    #[error("Unexpected answer to {0}")]
    UnexpectedAnswer(&'static str),

    /// The metrics recorder could not be installed
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
}
