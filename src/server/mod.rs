//! HTTP server for health and metrics endpoints
//!
//! - `/health` - Liveness probe (process is running)
//! - `/metrics` - Request counter in Prometheus text format

mod health;
pub mod metrics;

pub use health::{bind, build_router, serve, ServerState};
pub use metrics::{create_metrics, Metrics, MetricsError, SharedMetrics};

#[cfg(test)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_tests;
