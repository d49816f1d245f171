//! Customer view push handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::super::state::AppState;
use super::error_response;
use crate::display::DisplayEvent;

fn to_sse(event: &DisplayEvent) -> Event {
    Event::default()
        .event(event.name())
        .data(event.data().to_string())
}

fn broadcast(state: &AppState, event: DisplayEvent, message: &str) -> Response {
    let viewers = state.display.publish(event);
    Json(json!({ "success": true, "message": message, "viewers": viewers })).into_response()
}

fn json_or_400(body: Result<Json<Value>, JsonRejection>) -> Result<Value, Response> {
    body.map(|Json(value)| value).map_err(|rejection| {
        error_response(
            StatusCode::BAD_REQUEST,
            "Invalid JSON body.",
            Some(rejection.body_text()),
        )
    })
}

/// Handle POST /display/update-cart.
pub async fn update_cart(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    match json_or_400(body) {
        Ok(cart) => broadcast(&state, DisplayEvent::CartUpdate(cart), "Cart update broadcast"),
        Err(response) => response,
    }
}

/// Handle POST /display/update-ads.
pub async fn update_ads(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    match json_or_400(body) {
        Ok(ads) => broadcast(&state, DisplayEvent::AdsUpdate(ads), "Ads update broadcast"),
        Err(response) => response,
    }
}

/// Handle POST /display/clear.
pub async fn clear(State(state): State<Arc<AppState>>) -> Response {
    broadcast(&state, DisplayEvent::Clear, "Display cleared")
}

/// Handle GET /events - server-sent events for the customer view.
pub async fn events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (replay, mut receiver) = state.display.subscribe();
    debug!(viewers = state.display.viewers(), "customer view connected");

    let stream = async_stream::stream! {
        for event in replay {
            yield Ok::<_, Infallible>(to_sse(&event));
        }
        loop {
            match receiver.recv().await {
                Ok(event) => yield Ok(to_sse(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "customer view lagging, dropped events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
