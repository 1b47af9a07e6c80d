//! Environment configuration
//!
//! Database connection parameters are required when the database dependency
//! is declared (`REQUIRE_DB`, default on). Everything else has a default.

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::fmt;
use thiserror::Error;

/// Default port for the health and metrics server
pub const DEFAULT_PORT: u16 = 8080;

/// Liveness body when no service version is configured
pub const DEFAULT_HEALTH_BODY: &str = "ok";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is missing or empty")]
    MissingVar(&'static str),

    #[error("invalid PORT value {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },
}

/// Variable lookup backed by the process environment
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn require<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

/// Database connection parameters
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl DbConfig {
    /// Load `DB_HOST`, `DB_USER`, `DB_PASSWORD` and `DB_NAME`
    ///
    /// Fails on the first variable (in that order) that is unset or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: require(&lookup, "DB_HOST")?,
            user: require(&lookup, "DB_USER")?,
            password: require(&lookup, "DB_PASSWORD")?,
            name: require(&lookup, "DB_NAME")?,
        })
    }

    /// Structured connection options for the postgres driver
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(PgSslMode::Disable)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// Process-level settings that are never fatal when absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub require_db: bool,
    pub version: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            require_db: true,
            version: None,
        }
    }
}

impl ServiceConfig {
    /// Load `PORT`, `REQUIRE_DB` and `SERVICE_VERSION`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT").filter(|v| !v.is_empty()) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidPort {
                    value: value.clone(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_PORT,
        };

        let require_db = lookup("REQUIRE_DB")
            .map(|v| !(v == "false" || v == "0"))
            .unwrap_or(true);

        let version = lookup("SERVICE_VERSION").filter(|v| !v.is_empty());

        Ok(Self {
            port,
            require_db,
            version,
        })
    }

    /// Body returned by the liveness endpoint
    pub fn health_body(&self) -> String {
        match &self.version {
            Some(version) => format!("{} {}", DEFAULT_HEALTH_BODY, version),
            None => DEFAULT_HEALTH_BODY.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
