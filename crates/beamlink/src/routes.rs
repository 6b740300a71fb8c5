//! RPC procedure handlers.
//!
//! One route per store operation, tRPC-style paths under `/rpc/`.
//! Mutations are `POST` with JSON bodies; `poll` is a `GET` with query
//! parameters since devices hit it every second.
//!
//! The error posture mirrors the store's (see `RelayError`): `join` and
//! `send` turn the store's sentinels into 404s, while `poll`,
//! `heartbeat`, and `disconnect` stay 200 even for rooms that no longer
//! exist, because their callers run on fixed timers and a room expiring
//! between ticks is normal.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use beamlink_protocol::{
    CreateRoomResponse, DisconnectRequest, HeartbeatRequest,
    HeartbeatResponse, JoinRoomRequest, OkResponse, PollQuery,
    PollResponse, SendRequest, SendResponse,
};
use serde_json::json;

use crate::{AppState, RelayError};

/// Builds the relay's router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc/room.create", post(create))
        .route("/rpc/room.join", post(join))
        .route("/rpc/room.send", post(send))
        .route("/rpc/room.poll", get(poll))
        .route("/rpc/room.heartbeat", post(heartbeat))
        .route("/rpc/room.disconnect", post(disconnect))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn create(
    State(state): State<Arc<AppState>>,
) -> Json<CreateRoomResponse> {
    let room_id = state.store.lock().await.create_room();
    Json(CreateRoomResponse { room_id })
}

async fn join(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<Json<OkResponse>, RelayError> {
    if !state.store.lock().await.join_room(&req.room_id) {
        return Err(RelayError::RoomNotFound(req.room_id));
    }
    Ok(Json(OkResponse { ok: true }))
}

async fn send(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, RelayError> {
    let message_id = state.store.lock().await.send(
        &req.room_id,
        req.channel.as_str(),
        req.message,
    );
    // 0 is the store's "not delivered" sentinel; the sender must hear
    // about it.
    if message_id == 0 {
        return Err(RelayError::RoomNotFound(req.room_id));
    }
    Ok(Json(SendResponse { message_id }))
}

async fn poll(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PollQuery>,
) -> Json<PollResponse> {
    let response = state.store.lock().await.poll(
        &query.room_id,
        query.channel.as_str(),
        query.after_id.unwrap_or(0),
    );
    Json(response)
}

async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HeartbeatRequest>,
) -> Json<HeartbeatResponse> {
    let status =
        state.store.lock().await.heartbeat(&req.room_id, req.role);
    Json(status)
}

async fn disconnect(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DisconnectRequest>,
) -> Json<OkResponse> {
    let existed =
        state.store.lock().await.disconnect(&req.room_id, req.role);
    if !existed {
        tracing::debug!(room_id = %req.room_id, role = %req.role,
            "disconnect for unknown room");
    }
    Json(OkResponse { ok: true })
}
