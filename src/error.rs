// HTTP API error types
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    InvalidCredentials,
    InvalidAuthenticationToken,
    AuthenticationRequired,

    // 403 Forbidden
    InactiveAccount,

    // 404 Not Found
    NotFound,

    // 409 Conflict
    EditConflict,
    Conflict(String),

    // 422 Unprocessable Entity, field errors collected rather than short-circuited
    ValidationFailed(HashMap<String, String>),

    // 429 Too Many Requests
    RateLimitExceeded,

    // 500 Internal Server Error; detail is logged, never sent to the client
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::InvalidAuthenticationToken => StatusCode::UNAUTHORIZED,
            ApiError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ApiError::InactiveAccount => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::InvalidCredentials => "invalid authentication credentials".to_string(),
            ApiError::InvalidAuthenticationToken => {
                "invalid or missing authentication token".to_string()
            }
            ApiError::AuthenticationRequired => {
                "you must be authenticated to access this resource".to_string()
            }
            ApiError::InactiveAccount => {
                "your user account must be activated to access this resource".to_string()
            }
            ApiError::NotFound => "the requested resource could not be found".to_string(),
            ApiError::EditConflict => {
                "unable to update the record due to an edit conflict, please try again".to_string()
            }
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::ValidationFailed(_) => "validation failed".to_string(),
            ApiError::RateLimitExceeded => "rate limit exceeded".to_string(),
            ApiError::Internal => {
                "the server encountered a problem and could not process your request".to_string()
            }
        }
    }

    /// Convert to the JSON error envelope sent to the client.
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationFailed(field_errors) => json!({ "error": field_errors }),
            _ => json!({ "error": self.message() }),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.into(), message.into());
        ApiError::ValidationFailed(errors)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::EditConflict => ApiError::EditConflict,
            StoreError::Duplicate(constraint) => {
                ApiError::Conflict(format!("record violates unique constraint {constraint}"))
            }
            StoreError::Timeout => {
                tracing::error!("database query timed out");
                ApiError::Internal
            }
            StoreError::Sqlx(err) => {
                // Log the real error but return a generic message
                tracing::error!(error = %err, "database error");
                ApiError::Internal
            }
        }
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        tracing::error!(error = %err, "password hashing error");
        ApiError::Internal
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let mut response = (status, Json(self.to_json())).into_response();

        // Challenge the client on token failures so caches and clients
        // know bearer authentication is expected.
        if matches!(self, ApiError::InvalidAuthenticationToken) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::EditConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InactiveAccount.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::validation("page", "must be greater than zero").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn store_errors_reinterpreted_as_domain_errors() {
        assert!(matches!(
            ApiError::from(StoreError::NotFound),
            ApiError::NotFound
        ));
        assert!(matches!(
            ApiError::from(StoreError::EditConflict),
            ApiError::EditConflict
        ));
        assert!(matches!(
            ApiError::from(StoreError::Timeout),
            ApiError::Internal
        ));
    }

    #[test]
    fn internal_error_hides_detail() {
        let body = ApiError::Internal.to_json();
        assert_eq!(
            body["error"],
            "the server encountered a problem and could not process your request"
        );
    }
}
