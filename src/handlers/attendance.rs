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
use crate::models::{Attendance, AttendanceListFilter};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateAttendanceInput {
    pub officer_id: Uuid,
    pub session_id: Uuid,
    pub status: String,
    pub credited_hours: f64,
}

pub async fn create(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Json(input): Json<CreateAttendanceInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut record = Attendance {
        id: Uuid::nil(),
        officer_id: input.officer_id,
        session_id: input.session_id,
        status: input.status,
        credited_hours: input.credited_hours,
        created_at: Utc::now(),
        updated_at: None,
        version: 0,
    };

    let mut v = Validator::new();
    record.validate(&mut v);
    v.into_result()?;

    state.models.attendance.insert(&mut record).await?;

    Ok((StatusCode::CREATED, Json(json!({ "attendance": record }))))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let record = state.models.attendance.get(id).await?;
    Ok(Json(json!({ "attendance": record })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceInput {
    pub status: Option<String>,
    pub credited_hours: Option<f64>,
}

pub async fn update(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateAttendanceInput>,
) -> Result<Json<Value>, ApiError> {
    let mut record = state.models.attendance.get(id).await?;

    if let Some(status) = input.status {
        record.status = status;
    }
    if let Some(credited_hours) = input.credited_hours {
        record.credited_hours = credited_hours;
    }

    let mut v = Validator::new();
    record.validate(&mut v);
    v.into_result()?;

    state.models.attendance.update(&mut record).await?;

    Ok(Json(json!({ "attendance": record })))
}

pub async fn delete(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.models.attendance.delete(id).await?;
    Ok(Json(
        json!({ "message": "attendance record successfully deleted" }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAttendanceParams {
    pub officer_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListAttendanceParams>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    let filters = Filters::parse(
        &mut v,
        params.page,
        params.page_size,
        params.sort,
        "id",
        Attendance::SORT_SAFELIST,
    );
    v.into_result()?;

    let filter = AttendanceListFilter {
        officer_id: params.officer_id,
        session_id: params.session_id,
        status: params.status.unwrap_or_default(),
    };
    let (records, metadata) = state.models.attendance.list(&filter, &filters).await?;

    Ok(Json(json!({ "attendance": records, "metadata": metadata })))
}
