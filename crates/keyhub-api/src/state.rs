//! Application state shared across all handlers and extractors.

use std::sync::Arc;
use std::time::Instant;

use keyhub_auth::{PasswordPolicy, SessionGuard};
use keyhub_core::config::AppConfig;
use keyhub_database::repositories::AccountRepository;
use keyhub_database::{DatabasePool, KeyStore};
use keyhub_service::{
    AccountService, BulkOrchestrator, DownloadAccounting, LicenseService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabasePool,
    pub guard: Arc<SessionGuard>,
    pub licenses: Arc<LicenseService>,
    pub bulk: Arc<BulkOrchestrator>,
    pub accounting: Arc<DownloadAccounting>,
    pub accounts: Arc<AccountService>,
    pub started_at: Instant,
}

impl AppState {
    /// Wire services around a key store and the account database.
    pub fn new(config: AppConfig, db: DatabasePool, store: Arc<dyn KeyStore>) -> Self {
        let guard = Arc::new(SessionGuard::new(&config.auth));

        let accounting = Arc::new(DownloadAccounting::new(Arc::clone(&store)));
        let licenses = Arc::new(LicenseService::new(
            store,
            Arc::clone(&accounting),
            &config.license,
        ));
        let bulk = Arc::new(BulkOrchestrator::new(
            Arc::clone(&licenses),
            config.license.bulk_concurrency,
        ));

        let accounts = Arc::new(AccountService::new(
            AccountRepository::admins(db.pool().clone()),
            AccountRepository::technicians(db.pool().clone()),
            PasswordPolicy::new(&config.auth),
            Arc::clone(&guard),
        ));

        Self {
            config: Arc::new(config),
            db,
            guard,
            licenses,
            bulk,
            accounting,
            accounts,
            started_at: Instant::now(),
        }
    }
}
