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
use crate::models::import_job::STATUS_PENDING;
use crate::models::{ImportJob, ImportJobListFilter};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateImportJobInput {
    pub kind: String,
}

/// Queue a bulk import. Jobs start pending; the importer advances them and
/// records a finish timestamp or error message.
pub async fn create(
    State(state): State<AppState>,
    ActivatedUser(user): ActivatedUser,
    Json(input): Json<CreateImportJobInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut job = ImportJob {
        id: Uuid::nil(),
        kind: input.kind,
        status: STATUS_PENDING.to_string(),
        error_message: None,
        created_by_user_id: user.id,
        created_at: Utc::now(),
        finished_at: None,
        updated_at: None,
        version: 0,
    };

    let mut v = Validator::new();
    job.validate(&mut v);
    v.into_result()?;

    state.models.import_jobs.insert(&mut job).await?;

    Ok((StatusCode::CREATED, Json(json!({ "import_job": job }))))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let job = state.models.import_jobs.get(id).await?;
    Ok(Json(json!({ "import_job": job })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListImportJobsParams {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListImportJobsParams>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    let filters = Filters::parse(
        &mut v,
        params.page,
        params.page_size,
        params.sort,
        "-created_at",
        ImportJob::SORT_SAFELIST,
    );
    v.into_result()?;

    let filter = ImportJobListFilter {
        kind: params.kind.unwrap_or_default(),
        status: params.status.unwrap_or_default(),
    };
    let (jobs, metadata) = state.models.import_jobs.list(&filter, &filters).await?;

    Ok(Json(json!({ "import_jobs": jobs, "metadata": metadata })))
}
