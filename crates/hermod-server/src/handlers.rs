//! Connection handlers for the hermod server.
//!
//! This module owns the transport boundary: login, WebSocket admission and
//! upgrade, the per-connection read/write loop, and static file serving.
//! Everything past admission goes through the hub handle; no routing state
//! lives here.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashSet;
use futures_util::{SinkExt, StreamExt};
use hermod_core::{Hub, HubHandle, MessagePool, Session};
use hermod_protocol::codec;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

use crate::auth::AuthService;
use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};

/// Shared server state.
pub struct AppState {
    /// Submission handle to the hub task.
    pub hub: HubHandle,
    /// Login credential service.
    pub auth: AuthService,
    /// Pool inbound messages are drawn from and recycled into.
    pub pool: Arc<MessagePool>,
    /// Usernames with a live connection. The hub would silently overwrite a
    /// duplicate registration, so admission is decided here, before the hub
    /// ever sees the session.
    pub active_users: DashSet<String>,
    /// Server configuration.
    pub config: Config,
}

/// Run the HTTP/WebSocket server.
///
/// Spawns the singleton hub task, then serves until the process exits.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let pool = Arc::new(MessagePool::new());
    let (hub, handle) = Hub::with_capacity(Arc::clone(&pool), config.limits.hub_inbox_capacity);
    tokio::spawn(hub.run());

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let state = Arc::new(AppState {
        hub: handle,
        auth: AuthService::new(config.auth.users.clone()),
        pool,
        active_users: DashSet::new(),
        config: config.clone(),
    });

    // Build router; anything that isn't an API route is frontend territory.
    let app = Router::new()
        .route("/login", post(login_handler))
        .route(&config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .fallback_service(ServeDir::new(&config.transport.web_root))
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("hermod server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr, config.transport.websocket_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    success: bool,
    message: String,
}

/// Login handler: a single pass/fail credential check.
async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    if state.auth.authenticate(&request.username, &request.password) {
        debug!(user = %request.username, "Login accepted");
        (
            StatusCode::OK,
            Json(LoginResponse {
                success: true,
                message: "Login successful".to_string(),
            }),
        )
    } else {
        warn!(user = %request.username, "Login rejected");
        metrics::record_failed_login();
        (
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                success: false,
                message: "Invalid credentials".to_string(),
            }),
        )
    }
}

#[derive(Debug, Deserialize)]
struct WsParams {
    #[serde(default)]
    username: String,
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if params.username.is_empty() {
        warn!("WebSocket connection without username");
        return (StatusCode::BAD_REQUEST, "Username is required").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, params.username, state))
        .into_response()
}

/// Handle one WebSocket connection from admission to converged unregister.
async fn handle_socket(mut socket: WebSocket, username: String, state: Arc<AppState>) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    // Admission guard: one live connection per username. Rejecting here
    // keeps the hub's overwrite-on-register from ever firing in practice.
    if !state.active_users.insert(username.clone()) {
        warn!(user = %username, "Rejected duplicate connection");
        metrics::record_rejected_connection();
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: "User already connected".into(),
            })))
            .await;
        return;
    }

    info!(user = %username, "WebSocket connected");

    let (session, mut deliveries) =
        Session::channel(&username, state.config.limits.delivery_queue_capacity);
    if state.hub.register(session).await.is_err() {
        error!(user = %username, "Hub is not running");
        state.active_users.remove(&username);
        return;
    }

    // Split the WebSocket
    let (mut sender, mut receiver) = socket.split();
    let max_message_size = state.config.limits.max_message_size;

    loop {
        tokio::select! {
            // Drain this session's delivery queue. A closed queue is the
            // hub's termination signal (unregistration or eviction).
            delivery = deliveries.recv() => {
                let Some(message) = delivery else {
                    debug!(user = %username, "Delivery queue closed");
                    break;
                };
                match codec::encode(&message) {
                    Ok(text) => {
                        metrics::record_message(text.len(), "outbound");
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(user = %username, error = %e, "Failed to encode delivery");
                        metrics::record_error("encode");
                    }
                }
                state.pool.recycle_shared(message);
            }

            // Receive from the wire.
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > max_message_size {
                            warn!(user = %username, size = text.len(), "Frame too large");
                            metrics::record_error("oversized");
                            break;
                        }
                        metrics::record_message(text.len(), "inbound");

                        let mut message = state.pool.acquire();
                        if let Err(e) = codec::decode_into(&text, &mut message) {
                            warn!(user = %username, error = %e, "Malformed frame");
                            metrics::record_error("malformed");
                            state.pool.recycle(message);
                            break;
                        }
                        // The sender field is ours to stamp, not the client's.
                        message.sender = username.clone();
                        if state.hub.dispatch(message).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!(user = %username, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(user = %username, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(user = %username, error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(user = %username, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Every disconnect path converges here: exactly one unregister, then
    // the admission slot is released.
    let _ = state.hub.unregister(username.as_str()).await;
    state.active_users.remove(&username);

    info!(user = %username, "WebSocket disconnected");
}
