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
use crate::models::{Officer, OfficerListFilter};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateOfficerInput {
    pub regulation_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub sex: String,
    pub rank_code: String,
    pub region_id: Option<Uuid>,
    pub formation_id: Option<Uuid>,
    pub posting_id: Option<Uuid>,
}

pub async fn create(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Json(input): Json<CreateOfficerInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut officer = Officer {
        id: Uuid::nil(),
        regulation_number: input.regulation_number,
        first_name: input.first_name,
        last_name: input.last_name,
        sex: input.sex,
        rank_code: input.rank_code,
        region_id: input.region_id,
        formation_id: input.formation_id,
        posting_id: input.posting_id,
        created_at: Utc::now(),
        updated_at: None,
        archived_at: None,
        version: 0,
    };

    let mut v = Validator::new();
    officer.validate(&mut v);
    v.into_result()?;

    state.models.officers.insert(&mut officer).await?;

    Ok((StatusCode::CREATED, Json(json!({ "officer": officer }))))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let officer = state.models.officers.get(id).await?;
    Ok(Json(json!({ "officer": officer })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOfficerInput {
    pub regulation_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Option<String>,
    pub rank_code: Option<String>,
    pub region_id: Option<Uuid>,
    pub formation_id: Option<Uuid>,
    pub posting_id: Option<Uuid>,
}

/// Partial update: read, merge, validate, then write through the version
/// check. A stale concurrent write surfaces as a 409 and the caller may
/// re-read and retry.
pub async fn update(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateOfficerInput>,
) -> Result<Json<Value>, ApiError> {
    let mut officer = state.models.officers.get(id).await?;

    if let Some(regulation_number) = input.regulation_number {
        officer.regulation_number = Some(regulation_number);
    }
    if let Some(first_name) = input.first_name {
        officer.first_name = first_name;
    }
    if let Some(last_name) = input.last_name {
        officer.last_name = last_name;
    }
    if let Some(sex) = input.sex {
        officer.sex = sex;
    }
    if let Some(rank_code) = input.rank_code {
        officer.rank_code = rank_code;
    }
    if let Some(region_id) = input.region_id {
        officer.region_id = Some(region_id);
    }
    if let Some(formation_id) = input.formation_id {
        officer.formation_id = Some(formation_id);
    }
    if let Some(posting_id) = input.posting_id {
        officer.posting_id = Some(posting_id);
    }

    let mut v = Validator::new();
    officer.validate(&mut v);
    v.into_result()?;

    state.models.officers.update(&mut officer).await?;

    Ok(Json(json!({ "officer": officer })))
}

pub async fn delete(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.models.officers.delete(id).await?;
    Ok(Json(json!({ "message": "officer successfully deleted" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOfficersParams {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub rank_code: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListOfficersParams>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    let filters = Filters::parse(
        &mut v,
        params.page,
        params.page_size,
        params.sort,
        "id",
        Officer::SORT_SAFELIST,
    );
    v.into_result()?;

    let filter = OfficerListFilter {
        first_name: params.first_name.unwrap_or_default(),
        last_name: params.last_name.unwrap_or_default(),
        rank_code: params.rank_code.unwrap_or_default(),
    };
    let (officers, metadata) = state.models.officers.list(&filter, &filters).await?;

    Ok(Json(json!({ "officers": officers, "metadata": metadata })))
}
