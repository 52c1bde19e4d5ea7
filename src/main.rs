//! KeyHub server: license key issuance and download control.
//!
//! Loads configuration, initialises logging, connects to PostgreSQL,
//! applies migrations and serves the HTTP API.

use tracing_subscriber::{EnvFilter, fmt};

use keyhub_core::config::{AppConfig, StoreBackend};
use keyhub_core::error::AppError;
use keyhub_database::DatabasePool;
use keyhub_database::migration::run_migrations;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `KEYHUB_ENV` overlay and `KEYHUB__*`
/// variables, or a single file named by `KEYHUB_CONFIG`.
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var("KEYHUB_CONFIG") {
        Ok(path) => AppConfig::load_from(&path),
        Err(_) => {
            let env = std::env::var("KEYHUB_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing. `RUST_LOG` overrides the configured level.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_current_span(false)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting KeyHub");

    let db = match config.license.store {
        StoreBackend::Postgres => {
            let db = DatabasePool::connect(&config.database).await?;
            if config.database.run_migrations {
                run_migrations(db.pool()).await?;
            }
            db
        }
        // Accounts still live in PostgreSQL; connect when first needed.
        StoreBackend::Memory => DatabasePool::lazy(&config.database)?,
    };

    keyhub_api::run_server(config, db).await
}
