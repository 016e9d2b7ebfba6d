use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::state::SharedState;
use crate::types::timestamp;

pub const SERVICE_NAME: &str = "Agricultural LLM API";

pub async fn root(State(state): State<SharedState>) -> (StatusCode, Json<Value>) {
    if let Some(error) = state.model.error() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "service": SERVICE_NAME,
                "status": "error",
                "error": error.to_string(),
                "model_loaded": false,
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "status": "ready",
            "model_loaded": state.model.is_loaded(),
            "model_path": state.model_path.display().to_string(),
            "endpoints": {
                "health": "/health",
                "chat": "/chat (POST)",
            },
        })),
    )
}

pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<Value>) {
    if let Some(error) = state.model.error() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "error": error.to_string(),
                "model_loaded": false,
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "timestamp": timestamp(),
            "model_loaded": state.model.is_loaded(),
            "model_path": state.model_path.display().to_string(),
        })),
    )
}
