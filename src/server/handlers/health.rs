use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::{AppState, LOCATION};

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Operational display state for the dashboard: the clock task's latest
/// snapshot plus the conversation counters.
///
/// Never waits on the query pipeline. A held conversation lock means a query
/// is mid-flight, so the count is reported as null rather than stale.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let display = state.status.read().await.clone();
    let (message_count, processing) = match state.conversation.try_lock() {
        Ok(conversation) => (json!(conversation.messages.len()), conversation.processing),
        Err(_) => (json!(null), true),
    };
    Ok(Json(json!({
        "system_status": display.system_status,
        "current_time": display.current_time,
        "location": LOCATION,
        "message_count": message_count,
        "processing": processing,
    })))
}
