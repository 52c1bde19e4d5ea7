//! Policy for newly chosen passwords.

use keyhub_core::config::AuthConfig;
use keyhub_core::error::AppError;

/// Minimum requirements for a new account password.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl PasswordPolicy {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length.max(1),
        }
    }

    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }
        if password.trim().is_empty() {
            return Err(AppError::validation("Password must not be blank"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_length() {
        let policy = PasswordPolicy::new(&AuthConfig::default());
        assert!(policy.validate("short").is_err());
        assert!(policy.validate("        ").is_err());
        assert!(policy.validate("long enough").is_ok());
    }
}
