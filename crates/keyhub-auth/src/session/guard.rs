//! Gate for every operation that needs a logged-in caller.
//!
//! Each identity domain has its own signing key and audience. A caller
//! either presents a valid session for the required domain or gets the
//! same `Unauthorized` error no matter what was wrong with the token.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use keyhub_core::config::AuthConfig;
use keyhub_core::error::AppError;
use keyhub_core::types::AccountId;
use keyhub_entity::account::AccountDomain;

use crate::jwt::{JwtDecoder, JwtEncoder};

const UNAUTHORIZED: &str = "Unauthorized";

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub account_id: AccountId,
    pub email: String,
    pub domain: AccountDomain,
    pub expires_at: DateTime<Utc>,
}

/// A freshly signed session token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct DomainKeys {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
}

impl DomainKeys {
    fn new(domain: AccountDomain, config: &AuthConfig) -> Self {
        let domain_config = match domain {
            AccountDomain::Admin => &config.admin,
            AccountDomain::Technician => &config.technician,
        };
        Self {
            encoder: JwtEncoder::new(domain, domain_config),
            decoder: JwtDecoder::new(domain, domain_config),
        }
    }
}

/// Issues and verifies domain-bound session tokens.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    admin: DomainKeys,
    technician: DomainKeys,
}

impl SessionGuard {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            admin: DomainKeys::new(AccountDomain::Admin, config),
            technician: DomainKeys::new(AccountDomain::Technician, config),
        }
    }

    fn keys(&self, domain: AccountDomain) -> &DomainKeys {
        match domain {
            AccountDomain::Admin => &self.admin,
            AccountDomain::Technician => &self.technician,
        }
    }

    /// Sign a session for an account in `domain`.
    pub fn issue(
        &self,
        domain: AccountDomain,
        account_id: AccountId,
        email: &str,
    ) -> Result<IssuedSession, AppError> {
        let (token, expires_at) = self.keys(domain).encoder.encode(account_id, email, Utc::now())?;
        Ok(IssuedSession { token, expires_at })
    }

    /// Verify a presented token for `domain`.
    ///
    /// Absent, malformed, expired, wrongly signed and wrong-domain tokens all
    /// yield the same authentication error. The reason is only logged.
    pub fn verify(&self, domain: AccountDomain, token: Option<&str>) -> Result<Session, AppError> {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            debug!(%domain, "No session token presented");
            return Err(AppError::authentication(UNAUTHORIZED));
        };

        match self.keys(domain).decoder.decode(token) {
            Ok(claims) => Ok(Session {
                account_id: claims.sub,
                expires_at: claims.expires_at(),
                email: claims.email,
                domain,
            }),
            Err(e) => {
                debug!(%domain, reason = ?e.kind(), "Session token rejected");
                Err(AppError::authentication(UNAUTHORIZED))
            }
        }
    }
}
