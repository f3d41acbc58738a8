//! Flowline Server — Application entry point.

use flowline_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

/// Build the database configuration from `FLOWLINE_DB_*` environment
/// variables, falling back to defaults for anything unset.
fn db_config_from_env() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: std::env::var("FLOWLINE_DB_URL").unwrap_or(defaults.url),
        namespace: std::env::var("FLOWLINE_DB_NAMESPACE").unwrap_or(defaults.namespace),
        database: std::env::var("FLOWLINE_DB_DATABASE").unwrap_or(defaults.database),
        username: std::env::var("FLOWLINE_DB_USERNAME").unwrap_or(defaults.username),
        password: std::env::var("FLOWLINE_DB_PASSWORD").unwrap_or(defaults.password),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("flowline=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Flowline server...");

    let config = db_config_from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = flowline_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    tracing::info!("Storage ready");

    // TODO: Start REST API server

    tracing::info!("Flowline server stopped.");
}
