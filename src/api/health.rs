use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

/// Liveness plus a secret-free view of the configured credentials.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let credentials = state.credentials.refresh();
    Json(json!({
        "status": "ok",
        "server": state.config.server_name,
        "version": state.config.server_version,
        "nodes": state.config.api_nodes,
        "tools": state.tools.len(),
        "credentials": credentials,
        "can_authenticate": state.credentials.can_authenticate(),
        "can_transfer": state.credentials.can_transfer(),
    }))
}
