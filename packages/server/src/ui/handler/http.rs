//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{infrastructure::dto::http::StatusDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current connection and resource counts
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusDto> {
    let snapshot = state.status_usecase.execute().await;
    Json(StatusDto::from(&snapshot))
}
