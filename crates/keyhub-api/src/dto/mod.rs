//! Request and response bodies.

pub mod request;
pub mod response;

use validator::Validate;

use keyhub_core::AppError;

/// Run `validator` rules on a request body.
pub fn validated<T: Validate>(body: T) -> Result<T, AppError> {
    match body.validate() {
        Ok(()) => Ok(body),
        Err(errors) => {
            let mut fields: Vec<String> = errors
                .field_errors()
                .into_iter()
                .map(|(field, errs)| {
                    let reason = errs
                        .first()
                        .and_then(|e| e.message.as_ref())
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "is invalid".to_string());
                    format!("{field}: {reason}")
                })
                .collect();
            fields.sort();
            Err(AppError::validation(fields.join("; ")))
        }
    }
}
