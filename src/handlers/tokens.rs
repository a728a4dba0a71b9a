use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Duration;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::store::StoreError;
use crate::error::ApiError;
use crate::models::TokenScope;
use crate::state::AppState;
use crate::validation::{validate_email, validate_password_plaintext, Validator};

#[derive(Debug, Deserialize)]
pub struct CredentialsInput {
    pub email: String,
    pub password: String,
}

/// Exchange email and password for an authentication token. An unknown
/// account and a wrong password produce the same outcome so callers cannot
/// enumerate registered addresses.
pub async fn create_authentication_token(
    State(state): State<AppState>,
    Json(input): Json<CredentialsInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    v.into_result()?;

    let user = match state.models.users.get_by_email(&input.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(ApiError::InvalidCredentials),
        Err(err) => return Err(err.into()),
    };

    if !user.password_matches(&input.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .models
        .tokens
        .mint(
            user.id,
            Duration::hours(state.config.auth.authentication_token_ttl_hours),
            TokenScope::Authentication,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "authentication_token": token })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetInput {
    pub email: String,
}

/// Initiate a password reset. The HTTP-visible outcome is identical whether
/// or not the address belongs to an account; the token is minted and the
/// notification dispatched only when it does.
pub async fn create_password_reset_token(
    State(state): State<AppState>,
    Json(input): Json<PasswordResetInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    v.into_result()?;

    match state.models.users.get_by_email(&input.email).await {
        Ok(user) if user.activated => {
            let token = state
                .models
                .tokens
                .mint(
                    user.id,
                    Duration::minutes(state.config.auth.password_reset_token_ttl_mins),
                    TokenScope::PasswordReset,
                )
                .await?;

            let mailer = state.mailer.clone();
            let recipient = user.email.clone();
            let data = json!({ "password_reset_token": token.plaintext });
            state.background(async move { mailer.send(&recipient, "password_reset", data).await });
        }
        // A non-activated account cannot reset its password yet; an unknown
        // address mints nothing. Neither changes the response.
        Ok(_) | Err(StoreError::NotFound) => {}
        Err(err) => return Err(err.into()),
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "an email will be sent to you containing password reset instructions"
        })),
    ))
}
