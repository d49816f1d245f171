//! Printer listing and ad-hoc PDF printing handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use super::super::state::AppState;
use super::{error_response, status_for, success_response};
use crate::printer::platform::validate_printer_name;

/// Body of POST /print/pdf.
///
/// Field names vary between POS front-end versions. The payload may come as
/// `pdf_base64`, `pdfBase64`, `content` or `data` and the printer as
/// `printer_name`, `printerName` or `printer`. When several are sent, the
/// first non-blank one in that order wins.
#[derive(Debug, Default, Deserialize)]
pub struct PrintPdfRequest {
    #[serde(default)]
    pdf_base64: Option<String>,
    #[serde(default, rename = "pdfBase64")]
    pdf_base64_camel: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    printer_name: Option<String>,
    #[serde(default, rename = "printerName")]
    printer_name_camel: Option<String>,
    #[serde(default)]
    printer: Option<String>,
}

fn first_filled<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

impl PrintPdfRequest {
    /// `(payload, printer)`, each `None` when no field carries a value.
    pub fn into_parts(self) -> (Option<String>, Option<String>) {
        let payload = first_filled([self.pdf_base64, self.pdf_base64_camel, self.content, self.data]);
        let printer = first_filled([self.printer_name, self.printer_name_camel, self.printer]);
        (payload, printer)
    }
}

/// Handle GET /list-printers - bare array, kept for older front-ends.
pub async fn list_legacy(State(state): State<Arc<AppState>>) -> Response {
    match state.dispatcher.adapter().list_printers().await {
        Ok(printers) => Json(printers).into_response(),
        Err(e) => {
            error!(error = %e, "error listing printers");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cannot list printers.",
                Some(e.to_string()),
            )
        }
    }
}

/// Handle GET /printers.
pub async fn list(State(state): State<Arc<AppState>>) -> Response {
    match state.dispatcher.adapter().list_printers().await {
        Ok(printers) => Json(json!({ "success": true, "printers": printers })).into_response(),
        Err(e) => {
            error!(error = %e, "error listing printers");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cannot list printers.",
                Some(e.to_string()),
            )
        }
    }
}

/// Handle POST /print/pdf - print a base64 PDF on a named printer.
///
/// Everything is validated before the temp file is written.
pub async fn print_pdf(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PrintPdfRequest>, JsonRejection>,
) -> Response {
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

    let (Some(payload), Some(printer)) = request.into_parts() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing PDF data or printer name.",
            None,
        );
    };

    if let Err(e) = validate_printer_name(&printer) {
        return error_response(status_for(&e), "Invalid printer name.", Some(e.to_string()));
    }

    info!(printer = %printer, "printing PDF");
    match state
        .dispatcher
        .print_document("manual", &payload, &printer)
        .await
    {
        Ok(()) => success_response("PDF sent to printer successfully."),
        Err(e) => {
            error!(printer = %printer, error = %e, "PDF print error");
            error_response(status_for(&e), "PDF printing failed.", Some(e.to_string()))
        }
    }
}
