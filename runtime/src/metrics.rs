//! Prometheus metrics for the assignment ledger.
//!
//! # Example
//!
//! ```rust,no_run
//! use wedplan_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! if let Some(text) = server.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;

pub use metrics::{counter, gauge};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics recorder handle.
///
/// Installs the global recorder; [`MetricsServer::render`] produces the scrape body
/// for whatever HTTP surface the embedding application exposes.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if the recorder cannot be installed. A
    /// recorder that is already installed (common in tests) is not an error.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Address the embedding application should serve metrics on.
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

fn register_metrics() {
    describe_counter!(
        "planner_assignments_total",
        "Guests successfully assigned to a container"
    );
    describe_counter!(
        "planner_capacity_rejections_total",
        "Assignments rejected because the container was full"
    );
    describe_counter!(
        "planner_unassignments_total",
        "Guests removed from a container"
    );
    describe_counter!(
        "planner_remote_write_failures_total",
        "Remote writes that failed after local state changed"
    );
    describe_counter!(
        "planner_containers_deleted_total",
        "Containers drained and deleted"
    );
    describe_counter!("planner_reloads_total", "Full reloads from the store");
    describe_gauge!(
        "planner_over_capacity_containers",
        "Containers whose occupancy exceeds capacity after the last resize"
    );
}

/// Ledger metrics recorder.
pub struct LedgerMetrics;

impl LedgerMetrics {
    /// Record a successful assignment.
    pub fn record_assign() {
        counter!("planner_assignments_total").increment(1);
    }

    /// Record a capacity rejection.
    pub fn record_capacity_rejection(category: &'static str) {
        counter!("planner_capacity_rejections_total", "category" => category).increment(1);
    }

    /// Record an unassignment.
    pub fn record_unassign() {
        counter!("planner_unassignments_total").increment(1);
    }

    /// Record failed remote writes.
    pub fn record_remote_failures(count: usize) {
        counter!("planner_remote_write_failures_total").increment(count as u64);
    }

    /// Record a drained-and-deleted container.
    pub fn record_container_deleted(count: usize) {
        counter!("planner_containers_deleted_total").increment(count as u64);
    }

    /// Record a full reload.
    pub fn record_reload() {
        counter!("planner_reloads_total").increment(1);
    }

    /// Record the number of over-capacity containers.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_over_capacity(count: usize) {
        gauge!("planner_over_capacity_containers").set(count as f64);
    }
}
