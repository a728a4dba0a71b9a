use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{
    attendance, courses, facilitators, healthcheck, import_jobs, officers, session_facilitators,
    session_feedback, sessions, tokens, users,
};
use crate::middleware;
use crate::state::AppState;

/// Build the full application router. Every request passes through the
/// admission-control and authentication layers before reaching a handler;
/// handlers that mutate records additionally require an activated caller
/// through their extractor signature.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/healthcheck", get(healthcheck::healthcheck))
        // Identity lifecycle
        .route("/v1/users", post(users::register).get(users::list))
        .route("/v1/users/activated", put(users::activate))
        .route("/v1/users/password", put(users::update_password))
        .route(
            "/v1/users/:id",
            get(users::get).patch(users::update).delete(users::delete),
        )
        .route(
            "/v1/tokens/authentication",
            post(tokens::create_authentication_token),
        )
        .route(
            "/v1/tokens/password-reset",
            post(tokens::create_password_reset_token),
        )
        // Records
        .route("/v1/officers", get(officers::list).post(officers::create))
        .route(
            "/v1/officers/:id",
            get(officers::get)
                .patch(officers::update)
                .delete(officers::delete),
        )
        .route("/v1/courses", get(courses::list).post(courses::create))
        .route(
            "/v1/courses/:id",
            get(courses::get)
                .patch(courses::update)
                .delete(courses::delete),
        )
        .route("/v1/sessions", get(sessions::list).post(sessions::create))
        .route(
            "/v1/sessions/:id",
            get(sessions::get)
                .patch(sessions::update)
                .delete(sessions::delete),
        )
        .route(
            "/v1/facilitators",
            get(facilitators::list).post(facilitators::create),
        )
        .route(
            "/v1/facilitators/:id",
            get(facilitators::get)
                .patch(facilitators::update)
                .delete(facilitators::delete),
        )
        .route(
            "/v1/attendance",
            get(attendance::list).post(attendance::create),
        )
        .route(
            "/v1/attendance/:id",
            get(attendance::get)
                .patch(attendance::update)
                .delete(attendance::delete),
        )
        .route(
            "/v1/session-facilitators",
            get(session_facilitators::list).post(session_facilitators::create),
        )
        .route(
            "/v1/session-facilitators/:id",
            axum::routing::delete(session_facilitators::delete),
        )
        .route(
            "/v1/session-feedback",
            get(session_feedback::list).post(session_feedback::create),
        )
        .route(
            "/v1/import-jobs",
            get(import_jobs::list).post(import_jobs::create),
        )
        .route("/v1/import-jobs/:id", get(import_jobs::get))
        .fallback(not_found)
        // Global middleware; the outermost layer runs first:
        // trace -> cors -> rate limit -> authenticate -> handler.
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
