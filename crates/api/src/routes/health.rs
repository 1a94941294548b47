use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Health check endpoint. `last_pass_at` is null until the first pass completes.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let last_pass_at = state.scanner.latest().await.map(|s| s.generated_at);
    Json(json!({
        "status": "ok",
        "last_pass_at": last_pass_at,
        "instruments": state.scanner.instruments(),
    }))
}
