use std::collections::HashMap;

use crate::error::ApiError;

/// Collects field-level validation errors so a client sees every problem in
/// one round trip instead of fixing them one at a time.
#[derive(Debug, Default)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error for a field, keeping the first message reported for it.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record an error for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    /// Finish validation, turning any collected errors into a 422 response.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationFailed(self.errors))
        }
    }
}

/// Whether `value` is one of the permitted values.
pub fn permitted(value: &str, list: &[&str]) -> bool {
    list.contains(&value)
}

/// Minimal structural email check: exactly one `@` with non-empty local and
/// domain parts, and a dot in the domain.
pub fn looks_like_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    match (parts.next(), parts.next()) {
        (Some(local), Some(domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        _ => false,
    }
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(looks_like_email(email), "email", "must be a valid email address");
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(password.len() >= 8, "password", "must be at least 8 bytes long");
    v.check(
        password.len() <= 72,
        "password",
        "must not be more than 72 bytes long",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_all_errors() {
        let mut v = Validator::new();
        v.check(false, "page", "must be greater than zero");
        v.check(false, "page_size", "must be greater than zero");
        v.check(true, "sort", "invalid sort value");

        let err = v.into_result().unwrap_err();
        match err {
            ApiError::ValidationFailed(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.contains_key("page"));
                assert!(errors.contains_key("page_size"));
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut v = Validator::new();
        v.add_error("email", "must be provided");
        v.add_error("email", "must be a valid email address");
        assert!(!v.is_valid());
        let err = v.into_result().unwrap_err();
        match err {
            ApiError::ValidationFailed(errors) => {
                assert_eq!(errors["email"], "must be provided");
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("officer@example.com"));
        assert!(!looks_like_email("officer"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("officer@com"));
    }

    #[test]
    fn password_bounds() {
        let mut v = Validator::new();
        validate_password_plaintext(&mut v, "short");
        assert!(!v.is_valid());

        let mut v = Validator::new();
        validate_password_plaintext(&mut v, "long-enough-password");
        assert!(v.is_valid());
    }
}
