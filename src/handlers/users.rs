use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Duration;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::database::store::StoreError;
use crate::error::ApiError;
use crate::filter::Filters;
use crate::middleware::ActivatedUser;
use crate::models::token::validate_token_plaintext;
use crate::models::user::{User, UserListFilter, EMAIL_UNIQUE_CONSTRAINT};
use crate::models::TokenScope;
use crate::state::AppState;
use crate::validation::{validate_password_plaintext, Validator};

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Register a new, non-activated user. An activation token is minted and
/// handed to the notification dispatcher in the background; the response
/// does not wait for delivery.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut user = User::new(input.email, input.role.unwrap_or_else(|| "staff".to_string()));
    user.set_password(&input.password, state.config.auth.bcrypt_cost)?;

    let mut v = Validator::new();
    validate_password_plaintext(&mut v, &input.password);
    user.validate(&mut v);
    v.into_result()?;

    match state.models.users.insert(&mut user).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(constraint)) if constraint == EMAIL_UNIQUE_CONSTRAINT => {
            return Err(ApiError::validation(
                "email",
                "a user with this email address already exists",
            ));
        }
        Err(err) => return Err(err.into()),
    }

    let token = state
        .models
        .tokens
        .mint(
            user.id,
            Duration::hours(state.config.auth.activation_token_ttl_hours),
            TokenScope::Activation,
        )
        .await?;

    let mailer = state.mailer.clone();
    let recipient = user.email.clone();
    let data = json!({
        "activation_token": token.plaintext,
        "user_id": user.id,
    });
    state.background(async move { mailer.send(&recipient, "user_welcome", data).await });

    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

#[derive(Debug, Deserialize)]
pub struct ActivateInput {
    pub token: String,
}

/// Activate the account owning the supplied activation token, then revoke
/// every activation token for that account so the plaintext cannot be
/// replayed.
pub async fn activate(
    State(state): State<AppState>,
    Json(input): Json<ActivateInput>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &input.token);
    v.into_result()?;

    let mut user = match state
        .models
        .users
        .get_for_token(TokenScope::Activation, &input.token)
        .await
    {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            return Err(ApiError::validation(
                "token",
                "invalid or expired activation token",
            ));
        }
        Err(err) => return Err(err.into()),
    };

    user.activated = true;
    state.models.users.update(&mut user).await?;

    state
        .models
        .tokens
        .delete_all_for_user(TokenScope::Activation, user.id)
        .await?;

    Ok(Json(json!({ "user": user })))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordInput {
    pub password: String,
    pub token: String,
}

/// Set a new password for the account owning the supplied password-reset
/// token, then revoke the account's reset tokens.
pub async fn update_password(
    State(state): State<AppState>,
    Json(input): Json<UpdatePasswordInput>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    validate_password_plaintext(&mut v, &input.password);
    validate_token_plaintext(&mut v, &input.token);
    v.into_result()?;

    let mut user = match state
        .models
        .users
        .get_for_token(TokenScope::PasswordReset, &input.token)
        .await
    {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            return Err(ApiError::validation(
                "token",
                "invalid or expired password reset token",
            ));
        }
        Err(err) => return Err(err.into()),
    };

    user.set_password(&input.password, state.config.auth.bcrypt_cost)?;
    state.models.users.update(&mut user).await?;

    state
        .models
        .tokens
        .delete_all_for_user(TokenScope::PasswordReset, user.id)
        .await?;

    Ok(Json(
        json!({ "message": "your password was successfully reset" }),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let user = state.models.users.get(id).await?;
    Ok(Json(json!({ "user": user })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Partial update: read, merge the supplied fields, validate, then write
/// through the version check. A concurrent writer surfaces as a 409.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<Value>, ApiError> {
    let mut user = state.models.users.get(id).await?;

    if let Some(email) = input.email {
        user.email = email;
    }
    if let Some(role) = input.role {
        user.role = role;
    }

    let mut v = Validator::new();
    user.validate(&mut v);
    v.into_result()?;

    match state.models.users.update(&mut user).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(constraint)) if constraint == EMAIL_UNIQUE_CONSTRAINT => {
            return Err(ApiError::validation(
                "email",
                "a user with this email address already exists",
            ));
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Json(json!({ "user": user })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.models.users.delete(id).await?;
    Ok(Json(json!({ "message": "user successfully deleted" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub email: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    let filters = Filters::parse(
        &mut v,
        params.page,
        params.page_size,
        params.sort,
        "email",
        User::SORT_SAFELIST,
    );
    v.into_result()?;

    let filter = UserListFilter {
        email: params.email.unwrap_or_default(),
    };
    let (users, metadata) = state.models.users.list(&filter, &filters).await?;

    Ok(Json(json!({ "users": users, "metadata": metadata })))
}
