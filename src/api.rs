//! WebSocket + REST endpoints for the worklist and dispatch flow.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message as WsFrame, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::dispatch::orchestrator::DispatchOrchestrator;
use crate::dispatch::session::DispatchSession;
use crate::error::DispatchError;
use crate::store::{MessageStore, StoreEvent};
use crate::triage::feed::CategorizationFeed;
use crate::triage::types::{Message, MessageStatus};
use crate::triage::worklist::{WorklistTab, rank};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MessageStore>,
    pub feed: Arc<dyn CategorizationFeed>,
    pub orchestrator: Arc<DispatchOrchestrator>,
}

/// Build the Axum router for the worklist/dispatch surface.
///
/// CORS stays permissive — the operator UI is served from a different
/// origin, matching the upstream services' own configuration.
pub fn api_routes(
    store: Arc<MessageStore>,
    feed: Arc<dyn CategorizationFeed>,
    orchestrator: Arc<DispatchOrchestrator>,
) -> Router {
    let state = AppState {
        store,
        feed,
        orchestrator,
    };

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/api/worklist", get(worklist))
        .route("/api/messages/{id}", get(get_message))
        .route("/api/messages/{id}/status", post(set_status))
        .route("/api/refresh", post(refresh))
        .route("/api/dispatch", get(dispatch_snapshot))
        .route("/api/dispatch/pick", post(pick_worker))
        .route("/api/dispatch/regenerate", post(regenerate_draft))
        .route("/api/dispatch/send", post(send_draft))
        .route("/api/dispatch/dismiss", post(dismiss_all))
        .route("/api/dispatch/close", post(close_dialog))
        .route("/api/dispatch/{message_id}", post(start_dispatch))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "prop-assist"
    }))
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.store))
}

async fn handle_socket(mut socket: WebSocket, store: Arc<MessageStore>) {
    info!("WebSocket client connected");

    // Send the full worklist on connect
    let sync = StoreEvent::MessagesSync {
        messages: store.list().await,
    };
    if let Ok(json) = serde_json::to_string(&sync) {
        if socket.send(WsFrame::Text(json.into())).await.is_err() {
            warn!("Failed to send initial sync, client disconnected");
            return;
        }
    }

    // Subscribe to store events for real-time updates
    let mut rx = store.subscribe();

    loop {
        tokio::select! {
            // Forward store events to this client
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if let Ok(json) = serde_json::to_string(&event) {
                            if socket.send(WsFrame::Text(json.into())).await.is_err() {
                                debug!("Client disconnected during send");
                                break;
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "WS client lagged behind broadcast");
                        // Re-sync with a fresh worklist snapshot
                        let sync = StoreEvent::MessagesSync {
                            messages: store.list().await,
                        };
                        if let Ok(json) = serde_json::to_string(&sync) {
                            if socket.send(WsFrame::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed");
                        break;
                    }
                }
            }

            // The worklist feed is one-way; only answer pings
            result = socket.recv() => {
                match result {
                    Some(Ok(WsFrame::Ping(data))) => {
                        if socket.send(WsFrame::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsFrame::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket receive error");
                        break;
                    }
                }
            }
        }
    }
}

// ── Worklist ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WorklistQuery {
    #[serde(default)]
    search: String,
    tab: Option<String>,
}

async fn worklist(
    State(state): State<AppState>,
    Query(query): Query<WorklistQuery>,
) -> Result<Json<Vec<Message>>, (StatusCode, Json<serde_json::Value>)> {
    let tab = match query.tab.as_deref() {
        None => WorklistTab::All,
        Some(raw) => raw.parse().map_err(|e: String| {
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e })),
            )
        })?,
    };

    let messages = state.store.list().await;
    Ok(Json(rank(&messages, &query.search, tab)))
}

async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, StatusCode> {
    state
        .store
        .select(&id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: MessageStatus,
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Json<Vec<Message>> {
    Json(state.store.set_status(&id, body.status).await)
}

// ── Refresh ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RefreshReply {
    status: &'static str,
    messages: Vec<Message>,
    /// Non-blocking notice when the worklist degraded to local-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

/// Trigger a categorizer recompute, then pull and merge the fresh records.
///
/// A failed trigger leaves the worklist unchanged. A failed pull after a
/// successful trigger degrades to the local messages with a notice rather
/// than failing the whole view.
async fn refresh(
    State(state): State<AppState>,
) -> Result<Json<RefreshReply>, (StatusCode, Json<serde_json::Value>)> {
    if let Err(e) = state.feed.trigger_refresh().await {
        warn!(error = %e, "Refresh trigger failed, worklist unchanged");
        return Err((
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        ));
    }

    match state.feed.fetch().await {
        Ok(messages) => {
            state.store.merge_feed(messages).await;
            Ok(Json(RefreshReply {
                status: "success",
                messages: state.store.list().await,
                notice: None,
            }))
        }
        Err(e) => {
            warn!(error = %e, "Feed fetch failed, showing local messages only");
            Ok(Json(RefreshReply {
                status: "success",
                messages: state.store.list().await,
                notice: Some(format!("Showing local messages only: {e}")),
            }))
        }
    }
}

// ── Dispatch ────────────────────────────────────────────────────────────

fn dispatch_error(e: DispatchError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &e {
        DispatchError::UnknownMessage { .. }
        | DispatchError::NoSession
        | DispatchError::UnknownWorker { .. } => StatusCode::NOT_FOUND,
        DispatchError::NotMaintenance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DispatchError::SessionActive
        | DispatchError::InvalidPhase { .. }
        | DispatchError::InvalidTransition { .. } => StatusCode::CONFLICT,
        DispatchError::Aborted => StatusCode::GONE,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}

type DispatchReply = Result<Json<DispatchSession>, (StatusCode, Json<serde_json::Value>)>;

async fn start_dispatch(State(state): State<AppState>, Path(message_id): Path<String>) -> DispatchReply {
    state
        .orchestrator
        .start_dispatch(&message_id)
        .await
        .map(Json)
        .map_err(dispatch_error)
}

async fn dispatch_snapshot(
    State(state): State<AppState>,
) -> Result<Json<DispatchSession>, StatusCode> {
    state
        .orchestrator
        .snapshot()
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Deserialize)]
struct PickBody {
    name: String,
}

async fn pick_worker(State(state): State<AppState>, Json(body): Json<PickBody>) -> DispatchReply {
    state
        .orchestrator
        .worker_picked(&body.name)
        .await
        .map(Json)
        .map_err(dispatch_error)
}

async fn regenerate_draft(State(state): State<AppState>) -> DispatchReply {
    state
        .orchestrator
        .regenerate()
        .await
        .map(Json)
        .map_err(dispatch_error)
}

async fn send_draft(State(state): State<AppState>) -> DispatchReply {
    state
        .orchestrator
        .send()
        .await
        .map(Json)
        .map_err(dispatch_error)
}

async fn dismiss_all(State(state): State<AppState>) -> DispatchReply {
    state
        .orchestrator
        .dismiss_all()
        .await
        .map(Json)
        .map_err(dispatch_error)
}

async fn close_dialog(
    State(state): State<AppState>,
) -> Result<Json<Option<DispatchSession>>, (StatusCode, Json<serde_json::Value>)> {
    state
        .orchestrator
        .cancel()
        .await
        .map(Json)
        .map_err(dispatch_error)
}
