//! Prometheus metrics for observability and monitoring.
//!
//! The store records metrics through the `metrics` facade; this module
//! installs a Prometheus recorder, serves it over HTTP and describes the
//! series:
//! - Command throughput and rejections
//! - Reducer latency
//! - Events emitted per transition
//! - Oracle relay submissions
//!
//! # Example
//!
//! ```rust,no_run
//! use flight_surety_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Scrape http://0.0.0.0:9090/metrics, or render a snapshot directly
//! if let Some(snapshot) = server.render() {
//!     println!("{snapshot}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
}

/// Prometheus metrics recorder and scrape endpoint.
///
/// Installs the global recorder and serves it over HTTP on the configured
/// address.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address the scrape endpoint binds (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Bind the scrape endpoint, install the Prometheus recorder and
    /// describe the series.
    ///
    /// Must be called from within a Tokio runtime: the endpoint is served by
    /// a spawned task.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] if there is no Tokio runtime or the
    /// address cannot be bound.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., by another test), this logs
    /// a warning and succeeds without a handle or an endpoint.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let (recorder, exporter) = {
            let _entered = runtime.enter();
            PrometheusBuilder::new()
                .with_http_listener(self.addr)
                .set_buckets_for_metric(
                    Matcher::Suffix("duration_seconds".to_string()),
                    &[
                        0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
                    ],
                )
                .map_err(|e| MetricsError::Build(e.to_string()))?
                .build()
                .map_err(|e| MetricsError::Build(e.to_string()))?
        };
        let handle = recorder.handle();

        if let Err(e) = metrics::set_global_recorder(recorder) {
            tracing::warn!(error = %e, "Metrics recorder already initialized, skipping re-initialization");
            return Ok(());
        }

        runtime.spawn(async move {
            if exporter.await.is_err() {
                tracing::error!("Metrics endpoint stopped");
            }
        });
        register_metrics();

        self.handle = Some(handle);
        tracing::info!(addr = %self.addr, "Metrics endpoint listening");
        Ok(())
    }

    /// Address the scrape endpoint binds
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this instance did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!("store.commands.total", "Total number of commands submitted");
    describe_counter!(
        "store.commands.rejected",
        "Commands rejected by the reducer, labelled by command"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to reduce a command"
    );
    describe_histogram!("store.events.count", "Events emitted per committed transition");
    describe_counter!(
        "relay.responses.submitted",
        "Oracle responses accepted by the store"
    );
    describe_counter!(
        "relay.responses.failed",
        "Oracle responses rejected by the store"
    );
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let addr = "127.0.0.1:9090".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.render().is_none());
        assert_eq!(server.addr(), addr);
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let mut server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        assert!(matches!(server.start(), Err(MetricsError::Build(_))));
        assert!(server.render().is_none());
    }
}
