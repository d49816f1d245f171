//! Integration tests for the local HTTP API.

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt; // for `frame`
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use common::{FakeAdapter, PDF_BASE64, leftover_files};
use posbridge::artifact::ArtifactStore;
use posbridge::config::BridgeConfig;
use posbridge::dispatch::JobDispatcher;
use posbridge::server::{AppState, router};

struct Harness {
    state: Arc<AppState>,
    adapter: Arc<FakeAdapter>,
    dir: TempDir,
}

fn harness_with(config: BridgeConfig, adapter: FakeAdapter) -> Harness {
    let dir = TempDir::new().unwrap();
    let adapter = Arc::new(adapter);
    let dispatcher = Arc::new(JobDispatcher::new(
        ArtifactStore::new(dir.path(), Duration::ZERO),
        adapter.clone(),
    ));
    Harness {
        state: Arc::new(AppState::new(config, dispatcher)),
        adapter,
        dir,
    }
}

fn harness() -> Harness {
    harness_with(
        BridgeConfig::default(),
        FakeAdapter::with_printers(&["Receipt", "Kitchen"]),
    )
}

async fn send(state: &Arc<AppState>, request: Request<Body>) -> Response {
    router(state.clone()).oneshot(request).await.unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let response = send(&h.state, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["polling"], json!(false));
}

#[tokio::test]
async fn test_health_reports_started_poller_only() {
    let config = BridgeConfig::from_json_str(r#"{"LARAVEL_API_URL": "http://pos.local/api"}"#).unwrap();
    assert!(config.polling.is_some());
    let h = harness_with(config, FakeAdapter::default());

    let body = json_body(send(&h.state, get("/health")).await).await;
    assert_eq!(body["polling"], json!(false));

    let state = Arc::new(
        AppState::new(h.state.config.clone(), h.state.dispatcher.clone()).with_polling(true),
    );
    let body = json_body(send(&state, get("/health")).await).await;
    assert_eq!(body["polling"], json!(true));
}

#[tokio::test]
async fn test_list_printers_legacy_is_bare_array() {
    let h = harness();
    let response = send(&h.state, get("/list-printers")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!(["Receipt", "Kitchen"]));
}

#[tokio::test]
async fn test_list_printers_wrapped() {
    let h = harness();
    let response = send(&h.state, get("/printers")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"success": true, "printers": ["Receipt", "Kitchen"]})
    );
}

#[tokio::test]
async fn test_list_printers_failure() {
    let adapter = FakeAdapter {
        list_fails: true,
        ..FakeAdapter::default()
    };
    let h = harness_with(BridgeConfig::default(), adapter);
    let response = send(&h.state, get("/list-printers")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("scheduler is not running"));
}

#[tokio::test]
async fn test_print_pdf_success_cleans_up() {
    let h = harness();
    let response = send(
        &h.state,
        post_json(
            "/print/pdf",
            json!({"pdfBase64": PDF_BASE64, "printerName": "Receipt"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"success": true, "message": "PDF sent to printer successfully."})
    );

    let printed = h.adapter.printed();
    assert_eq!(printed.len(), 1);
    assert_eq!(printed[0].1, "Receipt");
    assert!(printed[0].0.starts_with(h.dir.path()));
    assert!(leftover_files(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_print_pdf_missing_printer_touches_nothing() {
    let h = harness();
    let response = send(&h.state, post_json("/print/pdf", json!({"pdfBase64": PDF_BASE64}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Missing PDF data or printer name."));

    assert!(h.adapter.printed().is_empty());
    assert!(leftover_files(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_print_pdf_several_payload_fields() {
    let h = harness();
    let response = send(
        &h.state,
        post_json(
            "/print/pdf",
            json!({
                "pdfBase64": "",
                "content": PDF_BASE64,
                "data": "ignored",
                "printerName": "Receipt",
                "printer": "Kitchen"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let printed = h.adapter.printed();
    assert_eq!(printed.len(), 1);
    assert_eq!(printed[0].1, "Receipt");
    assert!(leftover_files(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_print_pdf_missing_payload() {
    let h = harness();
    let response = send(
        &h.state,
        post_json("/print/pdf", json!({"pdfBase64": "  ", "printerName": "Receipt"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.adapter.printed().is_empty());
}

#[tokio::test]
async fn test_print_pdf_malformed_json() {
    let h = harness();
    let request = Request::builder()
        .method("POST")
        .uri("/print/pdf")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&h.state, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.adapter.printed().is_empty());
}

#[tokio::test]
async fn test_print_pdf_rejects_option_like_printer() {
    let h = harness();
    let response = send(
        &h.state,
        post_json(
            "/print/pdf",
            json!({"pdfBase64": PDF_BASE64, "printerName": "-oraw"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.adapter.printed().is_empty());
    assert!(leftover_files(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_print_pdf_printer_failure() {
    let h = harness();
    let response = send(
        &h.state,
        post_json(
            "/print/pdf",
            json!({"content": PDF_BASE64, "printer_name": "Jammed"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["message"], json!("PDF printing failed."));
    assert!(body["error"].as_str().unwrap().contains("paper jam"));
    assert!(leftover_files(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_print_pdf_invalid_base64() {
    let h = harness();
    let response = send(
        &h.state,
        post_json(
            "/print/pdf",
            json!({"pdfBase64": "%%% not base64 %%%", "printerName": "Receipt"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(h.adapter.printed().is_empty());
    assert!(leftover_files(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_open_drawer_not_configured() {
    let h = harness();
    let response = send(&h.state, post_json("/hardware/open-drawer", json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], json!(false));
}

#[tokio::test]
async fn test_open_drawer_writes_kick() {
    let device = tempfile::NamedTempFile::new().unwrap();
    let config = BridgeConfig {
        drawer_device: Some(device.path().to_path_buf()),
        ..BridgeConfig::default()
    };
    let h = harness_with(config, FakeAdapter::default());
    let response = send(&h.state, post_json("/hardware/open-drawer", json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        std::fs::read(device.path()).unwrap(),
        posbridge::hardware::drawer::DRAWER_KICK.to_vec()
    );
}

#[tokio::test]
async fn test_vfd_not_configured() {
    let h = harness();
    let response = send(
        &h.state,
        post_json("/hardware/display", json!({"line1": "Total", "line2": "12.50"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_display_update_cart_reaches_hub() {
    let h = harness();
    let (_, mut rx) = h.state.display.subscribe();
    let cart = json!({"items": [{"name": "Latte", "qty": 1}], "totalAmount": 4.5});

    let response = send(&h.state, post_json("/display/update-cart", cart.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["viewers"], json!(1));

    let event = rx.recv().await.unwrap();
    assert_eq!(event.name(), "cart:update");
    assert_eq!(event.data(), cart);
}

#[tokio::test]
async fn test_display_clear() {
    let h = harness();
    h.state
        .display
        .publish(posbridge::display::DisplayEvent::CartUpdate(json!({"totalQty": 3})));
    let response = send(&h.state, post_json("/display/clear", json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let (replay, _rx) = h.state.display.subscribe();
    assert!(replay.is_empty());
}

#[tokio::test]
async fn test_events_stream_replays_cart() {
    let h = harness();
    h.state
        .display
        .publish(posbridge::display::DisplayEvent::CartUpdate(json!({"totalQty": 2})));

    let response = send(&h.state, get("/events")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
        .await
        .expect("first event")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("event: cart:update"), "{}", text);
    assert!(text.contains(r#"data: {"totalQty":2}"#), "{}", text);
}

#[tokio::test]
async fn test_serial_ports_listing() {
    let h = harness();
    let response = send(&h.state, get("/hardware/ports")).await;
    let status = response.status();
    let body = json_body(response).await;
    if status == StatusCode::OK {
        assert_eq!(body["success"], json!(true));
        assert!(body["ports"].is_array());
    } else {
        // Hosts without a serial subsystem cannot be enumerated.
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], json!(false));
    }
}

#[tokio::test]
async fn test_customer_view_asset() {
    let h = harness();
    let response = send(&h.state, get("/display/assets/app.js")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.ends_with("javascript"), "{}", content_type);
    assert!(
        response.headers()["cache-control"]
            .to_str()
            .unwrap()
            .contains("immutable")
    );

    let response = send(&h.state, get("/display/assets/missing.js")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_view_page() {
    let h = harness();
    let response = send(&h.state, get("/display")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains(&format!("app.js?v={}", h.state.boot_time)));
}

#[tokio::test]
async fn test_cors_mirrors_origin() {
    let h = harness();
    let request = Request::builder()
        .uri("/printers")
        .header("origin", "http://pos.lan:3000")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.state, request).await;
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://pos.lan:3000"
    );
    assert_eq!(
        response.headers()["access-control-allow-credentials"],
        "true"
    );
    assert_eq!(h.adapter.list_calls.load(Ordering::SeqCst), 1);
}
