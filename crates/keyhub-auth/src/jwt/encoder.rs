//! Session token signing.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use keyhub_core::config::DomainSessionConfig;
use keyhub_core::error::AppError;
use keyhub_core::types::AccountId;
use keyhub_entity::account::AccountDomain;

use super::claims::Claims;

/// Upper bound on a session lifetime: one year.
const MAX_TTL_HOURS: i64 = 24 * 365;

/// Signs HS256 session tokens for one domain.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl: Duration,
    audience: &'static str,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("ttl", &self.ttl)
            .field("audience", &self.audience)
            .finish()
    }
}

impl JwtEncoder {
    pub fn new(domain: AccountDomain, config: &DomainSessionConfig) -> Self {
        let hours = i64::try_from(config.ttl_hours).unwrap_or(MAX_TTL_HOURS);
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::hours(hours.clamp(1, MAX_TTL_HOURS)),
            audience: domain.audience(),
        }
    }

    /// Sign a token for `subject`, returning it with its expiry.
    pub fn encode(
        &self,
        subject: AccountId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: subject,
            email: email.to_string(),
            aud: self.audience.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode session token: {e}")))?;

        Ok((token, expires_at))
    }
}
