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
use crate::models::{Facilitator, FacilitatorListFilter};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateFacilitatorInput {
    pub first_name: String,
    pub last_name: String,
    pub notes: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Json(input): Json<CreateFacilitatorInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut facilitator = Facilitator {
        id: Uuid::nil(),
        first_name: input.first_name,
        last_name: input.last_name,
        notes: input.notes,
        created_at: Utc::now(),
        updated_at: None,
        version: 0,
    };

    let mut v = Validator::new();
    facilitator.validate(&mut v);
    v.into_result()?;

    state.models.facilitators.insert(&mut facilitator).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "facilitator": facilitator })),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let facilitator = state.models.facilitators.get(id).await?;
    Ok(Json(json!({ "facilitator": facilitator })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateFacilitatorInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub notes: Option<String>,
}

pub async fn update(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateFacilitatorInput>,
) -> Result<Json<Value>, ApiError> {
    let mut facilitator = state.models.facilitators.get(id).await?;

    if let Some(first_name) = input.first_name {
        facilitator.first_name = first_name;
    }
    if let Some(last_name) = input.last_name {
        facilitator.last_name = last_name;
    }
    if let Some(notes) = input.notes {
        facilitator.notes = Some(notes);
    }

    let mut v = Validator::new();
    facilitator.validate(&mut v);
    v.into_result()?;

    state.models.facilitators.update(&mut facilitator).await?;

    Ok(Json(json!({ "facilitator": facilitator })))
}

pub async fn delete(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.models.facilitators.delete(id).await?;
    Ok(Json(
        json!({ "message": "facilitator successfully deleted" }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListFacilitatorsParams {
    pub last_name: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListFacilitatorsParams>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    let filters = Filters::parse(
        &mut v,
        params.page,
        params.page_size,
        params.sort,
        "last_name",
        Facilitator::SORT_SAFELIST,
    );
    v.into_result()?;

    let filter = FacilitatorListFilter {
        last_name: params.last_name.unwrap_or_default(),
    };
    let (facilitators, metadata) = state.models.facilitators.list(&filter, &filters).await?;

    Ok(Json(
        json!({ "facilitators": facilitators, "metadata": metadata }),
    ))
}
