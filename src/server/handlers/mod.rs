//! HTTP handlers for the server.

pub mod display;
pub mod hardware;
pub mod health;
pub mod printers;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::BridgeError;

/// `{success: true, message}` with 200.
pub(super) fn success_response(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message })),
    )
        .into_response()
}

/// `{success: false, message, error}` with the given status.
pub(super) fn error_response(status: StatusCode, message: &str, error: Option<String>) -> Response {
    (
        status,
        Json(json!({ "success": false, "message": message, "error": error })),
    )
        .into_response()
}

/// 400 for problems the caller can fix, 500 for everything else.
pub(super) fn status_for(error: &BridgeError) -> StatusCode {
    match error {
        BridgeError::InvalidPrinter(_) | BridgeError::NotConfigured(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
