//! Account repository shared by both identity domains.

use sqlx::PgPool;

use keyhub_core::error::{AppError, ErrorKind};
use keyhub_core::result::AppResult;
use keyhub_core::types::AccountId;
use keyhub_entity::account::{Account, AccountDomain, CreateAccount};

/// Repository for one domain's account table.
///
/// Admins and technicians have identical columns in separate tables, so a
/// single repository is bound to a domain at construction.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
    domain: AccountDomain,
}

impl AccountRepository {
    pub fn new(pool: PgPool, domain: AccountDomain) -> Self {
        Self { pool, domain }
    }

    pub fn admins(pool: PgPool) -> Self {
        Self::new(pool, AccountDomain::Admin)
    }

    pub fn technicians(pool: PgPool) -> Self {
        Self::new(pool, AccountDomain::Technician)
    }

    pub fn domain(&self) -> AccountDomain {
        self.domain
    }

    /// Case-insensitive lookup by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT * FROM {} WHERE LOWER(email) = LOWER($1)",
            self.domain.table()
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find account by email", e)
        })
    }

    /// Insert an account. A duplicate email is reported as a conflict.
    pub async fn create(&self, data: &CreateAccount) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO {} (id, email, password_hash, display_name) \
             VALUES ($1, $2, $3, $4) RETURNING *",
            self.domain.table()
        ))
        .bind(AccountId::new())
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::conflict(format!(
                        "An account with email '{}' already exists",
                        data.email
                    ));
                }
            }
            AppError::with_source(ErrorKind::Database, "Failed to create account", e)
        })
    }

    pub async fn touch_last_login(&self, id: AccountId) -> AppResult<()> {
        sqlx::query(&format!(
            "UPDATE {} SET last_login_at = NOW() WHERE id = $1",
            self.domain.table()
        ))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update last login", e)
        })?;
        Ok(())
    }
}
