//! Liveness handler.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use super::super::state::AppState;

/// Handle GET /health.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "version": env!("CARGO_PKG_VERSION"),
        "polling": state.polling,
        "vfd": state.vfd.is_some(),
        "drawer": state.drawer.is_some(),
        "viewers": state.display.viewers(),
        "boot_time": state.boot_time,
    }))
}
