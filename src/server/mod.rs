//! # HTTP Server
//!
//! The bridge's local API. POS front-ends on the same machine (or LAN) call
//! it to print, open the drawer and drive the customer displays.
//!
//! ## Routes
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/health` | liveness and polling status |
//! | GET | `/list-printers` | printer names as a bare array |
//! | GET | `/printers` | `{success, printers}` |
//! | POST | `/print/pdf` | print a base64 PDF on a named printer |
//! | POST | `/hardware/open-drawer` | pulse the cash drawer |
//! | GET | `/hardware/ports` | serial ports for VFD discovery |
//! | POST | `/hardware/display` | two lines of text on the VFD |
//! | GET | `/display` | customer view page |
//! | POST | `/display/update-cart`, `/display/update-ads`, `/display/clear` | push to customer view |
//! | GET | `/events` | customer view event stream (SSE) |
//!
//! Failures answer `{success: false, message, error}`: 400 for bad input,
//! 500 for operational faults. A panicking handler becomes a 500 and the
//! process keeps serving.

mod handlers;
mod state;
mod static_files;

pub use state::AppState;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::error::{BridgeError, Result};

/// Print payloads are base64 PDFs; receipts with logos run to a few MB.
const BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Build the router for the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // Printing
        .route("/list-printers", get(handlers::printers::list_legacy))
        .route("/printers", get(handlers::printers::list))
        .route("/print/pdf", post(handlers::printers::print_pdf))
        // Hardware
        .route("/hardware/open-drawer", post(handlers::hardware::open_drawer))
        .route("/hardware/ports", get(handlers::hardware::ports))
        .route("/hardware/display", post(handlers::hardware::display_text))
        // Customer view
        .route("/display", get(static_files::index_handler))
        .route("/display/assets/*path", get(static_files::asset_handler))
        .route("/display/update-cart", post(handlers::display::update_cart))
        .route("/display/update-ads", post(handlers::display::update_ads))
        .route("/display/clear", post(handlers::display::clear))
        .route("/events", get(handlers::display::events))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Any origin, with credentials: the POS front-end may be served from
/// anywhere on the LAN.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": "Internal server error.",
            "error": detail,
        })),
    )
        .into_response()
}

/// Bind the listening socket.
pub async fn bind(listen_addr: &str) -> Result<TcpListener> {
    TcpListener::bind(listen_addr)
        .await
        .map_err(|e| BridgeError::Server(format!("Failed to bind to {}: {}", listen_addr, e)))
}

/// Serve the API until Ctrl-C.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use posbridge::{
///     artifact::ArtifactStore, config::BridgeConfig, dispatch::JobDispatcher,
///     printer::{CommandPrinter, Platform},
///     server::{self, AppState},
/// };
///
/// # async fn example() -> Result<(), posbridge::BridgeError> {
/// let config = BridgeConfig::default();
/// let adapter = Arc::new(CommandPrinter::system(Platform::detect(None), config.print_timeout));
/// let dispatcher = Arc::new(JobDispatcher::new(
///     ArtifactStore::in_temp_dir(config.cleanup_delay),
///     adapter,
/// ));
/// let listener = server::bind(&config.listen_addr()).await?;
/// server::serve(Arc::new(AppState::new(config, dispatcher)), listener).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(state: Arc<AppState>, listener: TcpListener) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "POS bridge listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| BridgeError::Server(e.to_string()))?;

    info!("POS bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
