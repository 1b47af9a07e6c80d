//! Prometheus metrics for the service
//!
//! The registry is owned by `Metrics` rather than the process-global default
//! registry, so each server (and each test) gets its own counters.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Register(#[source] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),

    #[error("metrics output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Metrics shared between request handlers
pub type SharedMetrics = Arc<Metrics>;

pub struct Metrics {
    registry: Registry,
    http_requests_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")
                .map_err(MetricsError::Register)?;

        registry
            .register(Box::new(http_requests_total.clone()))
            .map_err(MetricsError::Register)?;

        Ok(Self {
            registry,
            http_requests_total,
        })
    }

    /// Count one liveness probe request
    pub fn record_request(&self) {
        self.http_requests_total.inc();
    }

    pub fn requests_total(&self) -> u64 {
        self.http_requests_total.get()
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(MetricsError::Encode)?;

        Ok(String::from_utf8(buffer)?)
    }
}

/// Create the shared metrics registry
pub fn create_metrics() -> Result<SharedMetrics, MetricsError> {
    Ok(Arc::new(Metrics::new()?))
}
