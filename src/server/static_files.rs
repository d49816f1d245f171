//! Customer view files, embedded at build time from `view/`.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use include_dir::{Dir, File, include_dir};
use std::sync::Arc;

use super::state::AppState;

static VIEW_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/view");

/// Assets are referenced with `?v=<boot time>`, so they can be cached for good.
const ASSET_CACHE: &str = "public, max-age=31536000, immutable";

/// Serve the page, stamping script and stylesheet URLs with the boot time.
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(page) = VIEW_DIR.get_file("index.html") else {
        return (StatusCode::NOT_FOUND, "Customer view not bundled").into_response();
    };
    let version = format!("?v={}", state.boot_time);
    let html = String::from_utf8_lossy(page.contents())
        .replace(".js\"", &format!(".js{}\"", version))
        .replace(".css\"", &format!(".css{}\"", version));
    Html(html).into_response()
}

/// Serve a file under `view/assets/`.
pub async fn asset_handler(Path(name): Path<String>) -> Response {
    match VIEW_DIR.get_file(format!("assets/{}", name)) {
        Some(file) => embedded(file),
        None => (StatusCode::NOT_FOUND, "Asset not found").into_response(),
    }
}

fn embedded(file: &'static File<'static>) -> Response {
    let mime = mime_guess::from_path(file.path()).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, mime.essence_str().to_string()),
            (header::CACHE_CONTROL, ASSET_CACHE.to_string()),
        ],
        Body::from(file.contents()),
    )
        .into_response()
}
