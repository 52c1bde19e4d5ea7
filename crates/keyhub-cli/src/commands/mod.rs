//! CLI command definitions and dispatch.

pub mod account;
pub mod keys;
pub mod migrate;

use clap::{Parser, Subcommand};

use keyhub_core::config::AppConfig;
use keyhub_core::error::AppError;
use keyhub_database::DatabasePool;

use crate::output::OutputFormat;

/// KeyHub: license key issuance and download control
#[derive(Debug, Parser)]
#[command(name = "keyhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file. Defaults to config/default.toml plus
    /// the overlay named by KEYHUB_ENV.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Admin and technician accounts
    Account(account::AccountArgs),
    /// License keys
    Keys(keys::KeysArgs),
}

impl Cli {
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(self.config.as_deref())?;
        let db = DatabasePool::connect(&config.database).await?;

        let result = match &self.command {
            Commands::Migrate => migrate::execute(&db).await,
            Commands::Account(args) => account::execute(args, &config, &db, self.format).await,
            Commands::Keys(args) => keys::execute(args, &config, &db, self.format).await,
        };

        db.close().await;
        result
    }
}

/// Load configuration from an explicit path or the default layering.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, AppError> {
    match path {
        Some(path) => AppConfig::load_from(path),
        None => {
            let env = std::env::var("KEYHUB_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}
