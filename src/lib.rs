//! Minimal HTTP service with a liveness probe and Prometheus metrics
//!
//! Startup verifies a PostgreSQL connection with a bounded retry loop
//! before the listener is opened.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod server;

pub use app::{run, start, StartupError};
pub use bootstrap::{bootstrap, BootstrapError, ConnectError, Connector, PgConnector, RetryPolicy};
pub use config::{ConfigError, DbConfig, ServiceConfig};
