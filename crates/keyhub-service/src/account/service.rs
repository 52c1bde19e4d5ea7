//! Login and account creation for both identity domains.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use keyhub_auth::{IssuedSession, PasswordHasher, PasswordPolicy, SessionGuard};
use keyhub_core::AppError;
use keyhub_core::result::AppResult;
use keyhub_database::repositories::AccountRepository;
use keyhub_entity::account::{Account, AccountDomain, CreateAccount};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// A successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub account: Account,
    pub session: IssuedSession,
}

/// Account operations for admins and technicians.
#[derive(Debug, Clone)]
pub struct AccountService {
    admins: AccountRepository,
    technicians: AccountRepository,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
    guard: Arc<SessionGuard>,
}

impl AccountService {
    pub fn new(
        admins: AccountRepository,
        technicians: AccountRepository,
        policy: PasswordPolicy,
        guard: Arc<SessionGuard>,
    ) -> Self {
        Self {
            admins,
            technicians,
            hasher: PasswordHasher::new(),
            policy,
            guard,
        }
    }

    fn repo(&self, domain: AccountDomain) -> &AccountRepository {
        match domain {
            AccountDomain::Admin => &self.admins,
            AccountDomain::Technician => &self.technicians,
        }
    }

    /// Check credentials and open a session in `domain`.
    ///
    /// Unknown email, wrong password and disabled account all fail with the
    /// same message, and an unknown email still pays for a hash.
    pub async fn login(
        &self,
        domain: AccountDomain,
        email: &str,
        password: &str,
    ) -> AppResult<LoginResult> {
        let email = email.trim();
        let account = self.repo(domain).find_by_email(email).await?;

        let verified = self
            .hasher
            .verify_or_dummy(password, account.as_ref().map(|a| a.password_hash.as_str()))?;

        let account = match account {
            Some(account) if verified && account.is_active => account,
            Some(account) if verified => {
                warn!(%domain, account_id = %account.id, "Login refused for disabled account");
                return Err(AppError::authentication(INVALID_CREDENTIALS));
            }
            _ => {
                warn!(%domain, "Login failed");
                return Err(AppError::authentication(INVALID_CREDENTIALS));
            }
        };

        self.repo(domain).touch_last_login(account.id).await?;
        let session = self.guard.issue(domain, account.id, &account.email)?;

        info!(%domain, account_id = %account.id, "Login succeeded");
        Ok(LoginResult { account, session })
    }

    /// Create an account after checking the password policy.
    pub async fn create_account(
        &self,
        domain: AccountDomain,
        email: &str,
        password: &str,
        display_name: Option<String>,
    ) -> AppResult<Account> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::validation("A valid email address is required"));
        }
        self.policy.validate(password)?;

        let account = self
            .repo(domain)
            .create(&CreateAccount {
                email,
                password_hash: self.hasher.hash_password(password)?,
                display_name: display_name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
            })
            .await?;

        info!(%domain, account_id = %account.id, "Account created");
        Ok(account)
    }
}
