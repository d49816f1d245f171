//! Cash drawer and VFD handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use super::super::state::AppState;
use super::{error_response, success_response};
use crate::error::BridgeError;
use crate::hardware;

/// Body of POST /hardware/display.
#[derive(Debug, Default, Deserialize)]
pub struct DisplayTextRequest {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
}

/// Handle POST /hardware/open-drawer.
pub async fn open_drawer(State(state): State<Arc<AppState>>) -> Response {
    let Some(drawer) = &state.drawer else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Cash drawer not configured.",
            Some(BridgeError::NotConfigured("DRAWER_DEVICE").to_string()),
        );
    };

    match drawer.open().await {
        Ok(()) => success_response("Cash drawer opened successfully"),
        Err(e) => {
            error!(error = %e, "drawer error");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cannot open cash drawer.",
                Some(e.to_string()),
            )
        }
    }
}

/// Handle GET /hardware/ports.
pub async fn ports() -> Response {
    match tokio::task::spawn_blocking(hardware::list_serial_ports).await {
        Ok(Ok(ports)) => {
            let ports: Vec<_> = ports.into_iter().map(|path| json!({ "path": path })).collect();
            Json(json!({ "success": true, "ports": ports })).into_response()
        }
        Ok(Err(e)) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Cannot list serial ports.",
            Some(e.to_string()),
        ),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Cannot list serial ports.",
            Some(format!("Task error: {}", e)),
        ),
    }
}

/// Handle POST /hardware/display - two lines of text on the VFD.
pub async fn display_text(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DisplayTextRequest>, JsonRejection>,
) -> Response {
    let Some(vfd) = &state.vfd else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "VFD port not configured.",
            Some(BridgeError::NotConfigured("VFD_PORT").to_string()),
        );
    };
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid JSON body.",
                Some(rejection.body_text()),
            );
        }
    };

    match vfd.show(&request.line1, &request.line2).await {
        Ok(()) => success_response("Text sent to VFD"),
        Err(e) => {
            error!(error = %e, "VFD error");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cannot write to VFD.",
                Some(e.to_string()),
            )
        }
    }
}
