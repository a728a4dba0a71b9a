use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::error::ApiError;
use crate::filter::Filters;
use crate::middleware::ActivatedUser;
use crate::models::{Session, SessionListFilter};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateSessionInput {
    pub course_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location: String,
}

pub async fn create(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Json(input): Json<CreateSessionInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut session = Session {
        id: Uuid::nil(),
        course_id: input.course_id,
        start_at: input.start_at,
        end_at: input.end_at,
        location: input.location,
        created_at: Utc::now(),
        updated_at: None,
        version: 0,
    };

    let mut v = Validator::new();
    session.validate(&mut v);
    v.into_result()?;

    state.models.sessions.insert(&mut session).await?;

    Ok((StatusCode::CREATED, Json(json!({ "session": session }))))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let session = state.models.sessions.get(id).await?;
    Ok(Json(json!({ "session": session })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionInput {
    pub course_id: Option<Uuid>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

pub async fn update(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSessionInput>,
) -> Result<Json<Value>, ApiError> {
    let mut session = state.models.sessions.get(id).await?;

    if let Some(course_id) = input.course_id {
        session.course_id = course_id;
    }
    if let Some(start_at) = input.start_at {
        session.start_at = start_at;
    }
    if let Some(end_at) = input.end_at {
        session.end_at = end_at;
    }
    if let Some(location) = input.location {
        session.location = location;
    }

    let mut v = Validator::new();
    session.validate(&mut v);
    v.into_result()?;

    state.models.sessions.update(&mut session).await?;

    Ok(Json(json!({ "session": session })))
}

pub async fn delete(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.models.sessions.delete(id).await?;
    Ok(Json(json!({ "message": "session successfully deleted" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsParams {
    pub course_id: Option<Uuid>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListSessionsParams>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    let filters = Filters::parse(
        &mut v,
        params.page,
        params.page_size,
        params.sort,
        "start_at",
        Session::SORT_SAFELIST,
    );
    v.into_result()?;

    let filter = SessionListFilter {
        course_id: params.course_id,
    };
    let (sessions, metadata) = state.models.sessions.list(&filter, &filters).await?;

    Ok(Json(json!({ "sessions": sessions, "metadata": metadata })))
}
