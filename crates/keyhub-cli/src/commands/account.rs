//! Account management commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use dialoguer::Password;

use keyhub_auth::{PasswordPolicy, SessionGuard};
use keyhub_core::config::AppConfig;
use keyhub_core::error::AppError;
use keyhub_database::DatabasePool;
use keyhub_database::repositories::AccountRepository;
use keyhub_entity::account::AccountDomain;
use keyhub_service::AccountService;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Create an admin or technician account
    Create {
        /// Identity domain: admin or technician
        #[arg(long, value_parser = parse_domain)]
        domain: AccountDomain,
        /// Login email
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        display_name: Option<String>,
        /// Password. Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
}

fn parse_domain(raw: &str) -> Result<AccountDomain, String> {
    raw.parse().map_err(|e: AppError| e.message)
}

fn prompt_password() -> Result<String, AppError> {
    Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

pub async fn execute(
    args: &AccountArgs,
    config: &AppConfig,
    db: &DatabasePool,
    format: OutputFormat,
) -> Result<(), AppError> {
    let accounts = AccountService::new(
        AccountRepository::admins(db.pool().clone()),
        AccountRepository::technicians(db.pool().clone()),
        PasswordPolicy::new(&config.auth),
        Arc::new(SessionGuard::new(&config.auth)),
    );

    match &args.command {
        AccountCommand::Create {
            domain,
            email,
            display_name,
            password,
        } => {
            let password = match password {
                Some(p) => p.clone(),
                None => prompt_password()?,
            };
            let account = accounts
                .create_account(*domain, email, &password, display_name.clone())
                .await?;

            output::print_item(&account, format, |account| {
                output::print_success(&format!("{domain} account created"));
                output::print_kv("ID", &account.id.to_string());
                output::print_kv("Email", &account.email);
                output::print_kv(
                    "Display name",
                    account.display_name.as_deref().unwrap_or("-"),
                );
            });
        }
    }

    Ok(())
}
