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
use crate::models::{Course, CourseListFilter};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateCourseInput {
    pub title: String,
    pub category: String,
    pub default_credit_hours: f64,
    pub description: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    ActivatedUser(user): ActivatedUser,
    Json(input): Json<CreateCourseInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut course = Course {
        id: Uuid::nil(),
        title: input.title,
        category: input.category,
        default_credit_hours: input.default_credit_hours,
        description: input.description,
        created_by_user_id: user.id,
        created_at: Utc::now(),
        updated_at: None,
        version: 0,
    };

    let mut v = Validator::new();
    course.validate(&mut v);
    v.into_result()?;

    state.models.courses.insert(&mut course).await?;

    Ok((StatusCode::CREATED, Json(json!({ "course": course }))))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let course = state.models.courses.get(id).await?;
    Ok(Json(json!({ "course": course })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseInput {
    pub title: Option<String>,
    pub category: Option<String>,
    pub default_credit_hours: Option<f64>,
    pub description: Option<String>,
}

pub async fn update(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCourseInput>,
) -> Result<Json<Value>, ApiError> {
    let mut course = state.models.courses.get(id).await?;

    if let Some(title) = input.title {
        course.title = title;
    }
    if let Some(category) = input.category {
        course.category = category;
    }
    if let Some(default_credit_hours) = input.default_credit_hours {
        course.default_credit_hours = default_credit_hours;
    }
    if let Some(description) = input.description {
        course.description = Some(description);
    }

    let mut v = Validator::new();
    course.validate(&mut v);
    v.into_result()?;

    state.models.courses.update(&mut course).await?;

    Ok(Json(json!({ "course": course })))
}

pub async fn delete(
    State(state): State<AppState>,
    ActivatedUser(_): ActivatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.models.courses.delete(id).await?;
    Ok(Json(json!({ "message": "course successfully deleted" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCoursesParams {
    pub title: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListCoursesParams>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    let filters = Filters::parse(
        &mut v,
        params.page,
        params.page_size,
        params.sort,
        "id",
        Course::SORT_SAFELIST,
    );
    v.into_result()?;

    let filter = CourseListFilter {
        title: params.title.unwrap_or_default(),
        category: params.category.unwrap_or_default(),
    };
    let (courses, metadata) = state.models.courses.list(&filter, &filters).await?;

    Ok(Json(json!({ "courses": courses, "metadata": metadata })))
}
