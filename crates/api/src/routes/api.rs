use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::error;

use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new().route("/api/results", get(get_results))
}

// ─── Results ──────────────────────────────────────────────────────────────────

/// Latest scan pass. Before the first pass completes the result list is empty
/// and `generated_at` is null.
async fn get_results(State(state): State<AppState>) -> Json<Value> {
    let Some(snapshot) = state.scanner.latest().await else {
        return Json(json!({
            "generated_at": null,
            "results": [],
            "failed": [],
            "refresh_secs": state.refresh_secs,
        }));
    };

    match serde_json::to_value(&*snapshot) {
        Ok(Value::Object(mut body)) => {
            body.insert("refresh_secs".into(), json!(state.refresh_secs));
            Json(Value::Object(body))
        }
        Ok(other) => Json(other),
        Err(e) => {
            error!(error = %e, "Failed to serialize scan snapshot");
            Json(json!({ "error": "snapshot unavailable" }))
        }
    }
}
