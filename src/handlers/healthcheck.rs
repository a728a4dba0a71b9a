use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Liveness and build information. Public and unauthenticated.
pub async fn healthcheck(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "system_info": {
            "environment": format!("{:?}", state.config.environment).to_lowercase(),
            "version": env!("CARGO_PKG_VERSION"),
        }
    }))
}
