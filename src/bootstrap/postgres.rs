//! PostgreSQL connector backed by a lazily-connecting `sqlx` pool

use super::{ConnectError, Connector};
use crate::config::DbConfig;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;
use std::time::Duration;

/// Upper bound on acquiring a pooled connection once serving
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
}

impl PgConnector {
    pub fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &DbConfig) -> Self {
        Self::new(config.connect_options())
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Handle = PgPool;

    /// Create the pool without connecting
    async fn open(&self) -> Result<PgPool, ConnectError> {
        Ok(PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(self.options.clone()))
    }

    /// Verify with one direct connection
    ///
    /// The pool retries refused connections internally until its acquire
    /// timeout, which would hide the real cause and stretch each attempt.
    async fn ping(&self, _pool: &PgPool) -> Result<(), ConnectError> {
        let mut conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(ConnectError::ping)?;
        conn.ping().await.map_err(ConnectError::ping)?;
        conn.close().await.map_err(ConnectError::ping)?;
        Ok(())
    }
}
