//! HTTP + WebSocket API for Shakeball
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /status - Current answer and busy lock
//! - POST /reveal - Tap (optional `{"mode": "binary"}`)
//! - POST /sample - Push one accelerometer reading
//! - POST /volume - Push one volume change
//! - WS /ws - Live status updates

use axum::{
    extract::{ws::{Message, WebSocket}, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::core::runtime::OracleHandle;
use crate::types::{
    validate_level, validate_reading, AnswerMode, OracleError, OracleStatus, RawVolumeEvent,
};

/// App state
pub struct AppState {
    pub oracle: OracleHandle,
}

/// Reveal request; body may be empty
#[derive(Debug, Default, Deserialize)]
pub struct RevealRequest {
    #[serde(default)]
    pub mode: AnswerMode,
}

/// Accepted command response
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
    /// Busy lock as seen when the command was queued
    pub is_revealing: bool,
}

#[derive(Debug, Deserialize)]
pub struct SampleRequest {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub event_loop_running: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: OracleError) -> ApiError {
    let status = match e {
        OracleError::MalformedEvent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        OracleError::LoopClosed => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

/// Create the API router
pub fn create_router(oracle: OracleHandle) -> Router {
    let state = Arc::new(AppState { oracle });

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/reveal", post(reveal))
        .route("/sample", post(sample))
        .route("/volume", post(volume))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        event_loop_running: state.oracle.is_running(),
    })
}

async fn status(State(state): State<Arc<AppState>>) -> Json<OracleStatus> {
    Json(state.oracle.status())
}

/// Tap affordance
async fn reveal(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RevealRequest>>,
) -> Result<Json<AcceptedResponse>, ApiError> {
    let mode = body.map(|Json(req)| req.mode).unwrap_or_default();
    let is_revealing = state.oracle.status().is_revealing;
    state.oracle.request_reveal(mode).map_err(api_error)?;
    debug!(%mode, "reveal requested over http");
    Ok(Json(AcceptedResponse {
        accepted: !is_revealing,
        is_revealing,
    }))
}

async fn sample(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SampleRequest>,
) -> Result<StatusCode, ApiError> {
    validate_reading(req.x, req.y, req.z).map_err(api_error)?;
    state.oracle.push_sample(req.x, req.y, req.z).map_err(api_error)?;
    Ok(StatusCode::ACCEPTED)
}

async fn volume(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RawVolumeEvent>,
) -> Result<StatusCode, ApiError> {
    validate_level(req.level).map_err(api_error)?;
    state.oracle.push_volume(req).map_err(api_error)?;
    Ok(StatusCode::ACCEPTED)
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.oracle.subscribe();
    let initial = state.oracle.status();
    ws.on_upgrade(move |socket| handle_websocket(socket, initial, rx))
}

/// Push the current status, then every change, until the client leaves
async fn handle_websocket(
    socket: WebSocket,
    initial: OracleStatus,
    mut rx: broadcast::Receiver<OracleStatus>,
) {
    let (mut sender, mut receiver) = socket.split();

    let json = serde_json::to_string(&initial).unwrap_or_default();
    if sender.send(Message::Text(json)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(status) => {
                    let json = serde_json::to_string(&status).unwrap_or_default();
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "websocket client lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Run the API server
pub async fn run_server(
    addr: &str,
    oracle: OracleHandle,
) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(oracle);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API listening");
    println!("🎱 Shakeball API running on {}", addr);
    println!("  GET  /health  - Health check");
    println!("  GET  /status  - Current answer");
    println!("  POST /reveal  - Tap to ask");
    println!("  POST /sample  - Push accelerometer reading");
    println!("  POST /volume  - Push volume change");
    println!("  WS   /ws      - Live updates");
    axum::serve(listener, router).await?;
    Ok(())
}
