//! Database connection bootstrap
//!
//! Opens and verifies a database connection before the server accepts traffic,
//! retrying a fixed number of times with a fixed delay between failures.

mod postgres;

pub use postgres::PgConnector;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Default number of connection attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay between failed attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Driver error carried as the cause of a failed attempt
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single open or ping
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to open connection: {0}")]
    Open(#[source] DriverError),

    #[error("ping failed: {0}")]
    Ping(#[source] DriverError),
}

impl ConnectError {
    pub fn open(err: impl Into<DriverError>) -> Self {
        Self::Open(err.into())
    }

    pub fn ping(err: impl Into<DriverError>) -> Self {
        Self::Ping(err.into())
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("could not connect to database after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: ConnectError,
    },
}

/// Fixed-count, fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least one attempt
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

/// Something that can open a connection handle and verify it is live
///
/// `open` may succeed without touching the network; `ping` performs the
/// round-trip that proves the remote end is reachable.
#[async_trait]
pub trait Connector: Send + Sync {
    type Handle: Send;

    async fn open(&self) -> Result<Self::Handle, ConnectError>;

    async fn ping(&self, handle: &Self::Handle) -> Result<(), ConnectError>;
}

async fn attempt<C: Connector + ?Sized>(connector: &C) -> Result<C::Handle, ConnectError> {
    let handle = connector.open().await?;
    connector.ping(&handle).await?;
    Ok(handle)
}

/// Establish a verified connection, retrying per `policy`
///
/// Stops at the first successful attempt. After the last failed attempt no
/// delay is applied and the last error is returned.
pub async fn bootstrap<C: Connector + ?Sized>(
    connector: &C,
    policy: &RetryPolicy,
) -> Result<C::Handle, BootstrapError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt_no = 1;

    loop {
        match attempt(connector).await {
            Ok(handle) => {
                info!(attempt = attempt_no, "Successfully connected to database");
                return Ok(handle);
            }
            Err(e) => {
                warn!(
                    attempt = attempt_no,
                    max_attempts = max_attempts,
                    error = %e,
                    "Database not ready"
                );

                if attempt_no >= max_attempts {
                    return Err(BootstrapError::Exhausted {
                        attempts: attempt_no,
                        source: e,
                    });
                }

                tokio::time::sleep(policy.delay).await;
                attempt_no += 1;
            }
        }
    }
}

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod tests;
