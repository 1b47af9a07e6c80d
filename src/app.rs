//! Service startup sequence
//!
//! Configuration, then the database bootstrap (when declared), then metrics,
//! then the listener. Every failure is returned to the caller; only the binary
//! decides to exit.

use crate::bootstrap::{bootstrap, BootstrapError, Connector, RetryPolicy};
use crate::config::{ConfigError, DbConfig, ServiceConfig};
use crate::server::{bind, create_metrics, serve, MetricsError, ServerState};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error("failed to create metrics registry: {0}")]
    Metrics(#[from] MetricsError),

    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// A bound service that has not started serving yet
///
/// Holds the verified database handle for as long as the service runs.
pub struct Started<H> {
    listener: TcpListener,
    state: ServerState,
    database: Option<H>,
}

impl<H> Started<H> {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn database(&self) -> Option<&H> {
        self.database.as_ref()
    }

    /// Serve requests until the process exits
    pub async fn serve(self) -> Result<(), StartupError> {
        let Started {
            listener,
            state,
            database: _database,
        } = self;

        serve(listener, state).await.map_err(|e| {
            error!(error = %e, "Server failed");
            StartupError::Serve(e)
        })
    }
}

/// Run every startup step up to and including binding the listener
///
/// `make_connector` is only called when the database dependency is declared
/// and its variables are all present.
pub async fn start<F, M, C>(
    lookup: F,
    make_connector: M,
    policy: &RetryPolicy,
) -> Result<Started<C::Handle>, StartupError>
where
    F: Fn(&str) -> Option<String>,
    M: FnOnce(&DbConfig) -> C,
    C: Connector,
{
    let service = ServiceConfig::from_lookup(&lookup).map_err(|e| {
        error!(error = %e, "Invalid service configuration");
        e
    })?;

    let database = if service.require_db {
        let db_config = DbConfig::from_lookup(&lookup).map_err(|e| {
            error!(error = %e, "One or more required environment variables are missing");
            e
        })?;
        info!(
            host = %db_config.host,
            user = %db_config.user,
            database = %db_config.name,
            "Database configuration loaded"
        );

        let connector = make_connector(&db_config);
        let handle = bootstrap(&connector, policy).await.map_err(|e| {
            error!(error = %e, "Could not connect to database after retries");
            e
        })?;
        Some(handle)
    } else {
        info!("Database dependency disabled - skipping connection bootstrap");
        None
    };

    let metrics = create_metrics()?;
    info!("Prometheus metrics registry initialized");

    let listener = bind(service.port).await.map_err(|e| {
        error!(error = %e, port = service.port, "Failed to bind listener");
        StartupError::Bind {
            port: service.port,
            source: e,
        }
    })?;

    Ok(Started {
        listener,
        state: ServerState::new(metrics, service.health_body()),
        database,
    })
}

/// Start the service and serve forever
pub async fn run<F, M, C>(
    lookup: F,
    make_connector: M,
    policy: &RetryPolicy,
) -> Result<(), StartupError>
where
    F: Fn(&str) -> Option<String>,
    M: FnOnce(&DbConfig) -> C,
    C: Connector,
{
    start(lookup, make_connector, policy).await?.serve().await
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
