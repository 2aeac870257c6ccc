//! Logging and metrics initialisation.

use crate::config::ObservabilityConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wedplan_runtime::metrics::{MetricsError, MetricsServer};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured filter. Installing twice is a no-op, so
/// tests can call this freely.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// Install the Prometheus recorder when `METRICS_ADDR` is configured.
///
/// # Errors
///
/// Returns [`MetricsError`] if the recorder cannot be installed.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<Option<MetricsServer>, MetricsError> {
    let Some(addr) = config.metrics_addr else {
        return Ok(None);
    };

    let mut server = MetricsServer::new(addr);
    server.start()?;
    Ok(Some(server))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn metrics_are_off_without_address() {
        let config = Config::default();
        assert!(init_metrics(&config.observability).unwrap().is_none());
    }

    #[test]
    fn tracing_init_is_repeatable() {
        let config = Config::default();
        init_tracing(&config.observability);
        init_tracing(&config.observability);
    }
}
