//! Session token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use keyhub_core::config::DomainSessionConfig;
use keyhub_entity::account::AccountDomain;

use super::claims::Claims;

/// Validates HS256 session tokens for one domain.
///
/// Signature, expiry and audience are all checked, so a token signed for
/// the other domain fails even if both domains were configured with the
/// same secret.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    pub fn new(domain: AccountDomain, config: &DomainSessionConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;
        validation.set_audience(&[domain.audience()]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}
