//! License key commands. These run as the local operator.

use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use keyhub_core::config::AppConfig;
use keyhub_core::error::AppError;
use keyhub_core::types::{LicenseKeyId, PageRequest};
use keyhub_database::store::KeyFilter;
use keyhub_database::{DatabasePool, KeyStore, PgKeyStore};
use keyhub_entity::license::{LicenseKey, LicenseStatus};
use keyhub_service::{DownloadAccounting, IssueSpec, LicenseService, Remaining, RequestContext};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

#[derive(Debug, Subcommand)]
pub enum KeysCommand {
    /// Issue new keys
    Issue {
        /// Number of keys to issue
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
        /// Download ceiling per key. Unlimited when omitted.
        #[arg(long)]
        max_downloads: Option<i32>,
        /// Days until the keys expire. Never when omitted.
        #[arg(long)]
        expires_in_days: Option<u32>,
        #[arg(long)]
        customer_name: Option<String>,
        #[arg(long)]
        customer_email: Option<String>,
        #[arg(long)]
        customer_company: Option<String>,
    },
    /// List keys
    List {
        /// unused, active, revoked or expired
        #[arg(long, value_parser = parse_status)]
        status: Option<LicenseStatus>,
        /// Substring of code, customer email or customer name
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        page_size: u32,
    },
    /// Revoke a key by id
    Revoke { id: LicenseKeyId },
    /// Counts per status
    Stats,
}

fn parse_status(raw: &str) -> Result<LicenseStatus, String> {
    raw.parse().map_err(|e: AppError| e.message)
}

/// Key display row for table output
#[derive(Debug, Serialize, Tabled)]
struct KeyRow {
    id: String,
    code: String,
    status: String,
    downloads: String,
    expires_at: String,
    customer: String,
}

impl From<&LicenseKey> for KeyRow {
    fn from(key: &LicenseKey) -> Self {
        let downloads = match Remaining::of(key) {
            Remaining::Unlimited => format!("{} / ∞", key.download_count),
            Remaining::Limited(_) => format!(
                "{} / {}",
                key.download_count,
                key.max_downloads.unwrap_or_default()
            ),
        };
        Self {
            id: key.id.to_string(),
            code: key.code.clone(),
            status: key.status.to_string(),
            downloads,
            expires_at: key
                .expires_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
            customer: key
                .customer_email
                .clone()
                .or_else(|| key.customer_name.clone())
                .unwrap_or_default(),
        }
    }
}

pub async fn execute(
    args: &KeysArgs,
    config: &AppConfig,
    db: &DatabasePool,
    format: OutputFormat,
) -> Result<(), AppError> {
    let store: Arc<dyn KeyStore> = Arc::new(PgKeyStore::new(db.pool().clone()));
    let accounting = Arc::new(DownloadAccounting::new(Arc::clone(&store)));
    let licenses = LicenseService::new(store, accounting, &config.license);
    let operator = RequestContext::system();

    match &args.command {
        KeysCommand::Issue {
            count,
            max_downloads,
            expires_in_days,
            customer_name,
            customer_email,
            customer_company,
        } => {
            let spec = IssueSpec {
                max_downloads: *max_downloads,
                expires_at: expires_in_days.map(|days| Utc::now() + Duration::days(i64::from(days))),
                customer_name: customer_name.clone(),
                customer_email: customer_email.clone(),
                customer_company: customer_company.clone(),
            };
            let report = licenses.issue(&operator, &spec, *count).await?;

            let rows: Vec<KeyRow> = report.issued.iter().map(KeyRow::from).collect();
            output::print_list(&rows, format);
            if report.failed > 0 {
                output::print_warning(&format!(
                    "{} of {} keys could not be issued",
                    report.failed, report.requested
                ));
            }
        }
        KeysCommand::List {
            status,
            search,
            page,
            page_size,
        } => {
            let filter = KeyFilter {
                status: *status,
                search: search.clone(),
            };
            let result = licenses
                .list(&filter, PageRequest::new(*page, *page_size))
                .await?;

            let rows: Vec<KeyRow> = result.items.iter().map(KeyRow::from).collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                println!(
                    "Page {} of {} ({} keys)",
                    result.page, result.total_pages, result.total_items
                );
            }
        }
        KeysCommand::Revoke { id } => {
            let key = licenses.revoke(&operator, *id).await?;
            output::print_item(&key, format, |key| {
                output::print_success(&format!("Key {} is {}", key.code, key.status));
            });
        }
        KeysCommand::Stats => {
            let stats = licenses.stats().await?;
            output::print_item(&stats, format, |stats| {
                output::print_kv("Total", &stats.total.to_string());
                output::print_kv("Unused", &stats.unused.to_string());
                output::print_kv("Active", &stats.active.to_string());
                output::print_kv("Revoked", &stats.revoked.to_string());
                output::print_kv("Expired", &stats.expired.to_string());
                output::print_kv("Downloads", &stats.total_downloads.to_string());
            });
        }
    }

    Ok(())
}
