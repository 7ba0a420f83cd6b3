use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::auth::TokenVerifier;
use crate::connection::serve_socket;
use crate::hub::HubHandle;
use crate::simulation::TickRunner;

#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub ticks: Arc<TickRunner>,
    pub verifier: Arc<dyn TokenVerifier>,
}

pub fn configure(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/debug/tick", post(debug_tick))
        .route("/health", get(health))
        .with_state(state)
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state.hub, state.verifier))
}

/// Run one tick outside the timer.
async fn debug_tick(State(state): State<AppState>) -> Response {
    match state.ticks.tick_once().await {
        Ok(report) => Json(json!({ "tick": report.tick })).into_response(),
        Err(e) => {
            log::error!("Debug tick failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
