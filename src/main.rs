use anyhow::Context;
use health_service::app;
use health_service::bootstrap::{PgConnector, RetryPolicy};
use health_service::config::env_lookup;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting health service");

    // Any startup or serving error ends the process with a non-zero status
    app::run(env_lookup, PgConnector::from_config, &RetryPolicy::default())
        .await
        .context("health service terminated")
}
