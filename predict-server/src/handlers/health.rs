//! Health check handler

use axum::{extract::State, Json};
use penalty_core::{Schema, Target};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model_loaded: bool,
    schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_error: Option<String>,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.model.status();

    Json(HealthResponse {
        status: if model.model_loaded { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model_loaded: model.model_loaded,
        schema: state.schema,
        target: model.target,
        model_checksum: model.checksum,
        model_error: model.error,
    })
}
