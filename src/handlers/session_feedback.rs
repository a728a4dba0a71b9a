use axum::extract::{Query, State};
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
use crate::models::{SessionFeedback, SessionFeedbackListFilter};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateSessionFeedbackInput {
    pub session_id: Uuid,
    pub officer_id: Uuid,
    pub facilitator_id: Uuid,
    pub rating: f64,
    pub comments: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Json(input): Json<CreateSessionFeedbackInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut feedback = SessionFeedback {
        id: Uuid::nil(),
        session_id: input.session_id,
        officer_id: input.officer_id,
        facilitator_id: input.facilitator_id,
        rating: input.rating,
        comments: input.comments,
        created_at: Utc::now(),
        updated_at: None,
        version: 0,
    };

    let mut v = Validator::new();
    feedback.validate(&mut v);
    v.into_result()?;

    state.models.session_feedback.insert(&mut feedback).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "session_feedback": feedback })),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSessionFeedbackParams {
    pub session_id: Option<Uuid>,
    pub facilitator_id: Option<Uuid>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListSessionFeedbackParams>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    let filters = Filters::parse(
        &mut v,
        params.page,
        params.page_size,
        params.sort,
        "id",
        SessionFeedback::SORT_SAFELIST,
    );
    v.into_result()?;

    let filter = SessionFeedbackListFilter {
        session_id: params.session_id,
        facilitator_id: params.facilitator_id,
    };
    let (feedback, metadata) = state.models.session_feedback.list(&filter, &filters).await?;

    Ok(Json(
        json!({ "session_feedback": feedback, "metadata": metadata }),
    ))
}
