use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::error::ApiError;
use crate::filter::Filters;
use crate::middleware::ActivatedUser;
use crate::models::{SessionFacilitator, SessionFacilitatorListFilter};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateSessionFacilitatorInput {
    pub session_id: Uuid,
    pub facilitator_id: Uuid,
    pub role: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Json(input): Json<CreateSessionFacilitatorInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut assignment = SessionFacilitator {
        id: Uuid::nil(),
        session_id: input.session_id,
        facilitator_id: input.facilitator_id,
        role: input.role,
        created_at: Utc::now(),
        updated_at: None,
        version: 0,
    };

    let mut v = Validator::new();
    assignment.validate(&mut v);
    v.into_result()?;

    state
        .models
        .session_facilitators
        .insert(&mut assignment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "session_facilitator": assignment })),
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.models.session_facilitators.delete(id).await?;
    Ok(Json(
        json!({ "message": "session facilitator successfully deleted" }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSessionFacilitatorsParams {
    pub session_id: Option<Uuid>,
    pub facilitator_id: Option<Uuid>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListSessionFacilitatorsParams>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    let filters = Filters::parse(
        &mut v,
        params.page,
        params.page_size,
        params.sort,
        "id",
        SessionFacilitator::SORT_SAFELIST,
    );
    v.into_result()?;

    let filter = SessionFacilitatorListFilter {
        session_id: params.session_id,
        facilitator_id: params.facilitator_id,
    };
    let (assignments, metadata) = state
        .models
        .session_facilitators
        .list(&filter, &filters)
        .await?;

    Ok(Json(
        json!({ "session_facilitators": assignments, "metadata": metadata }),
    ))
}
