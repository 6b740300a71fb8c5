//! Error type for the relay server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use beamlink_protocol::RoomId;
use serde_json::json;

/// Errors surfaced by the relay's RPC layer.
///
/// The store itself never errors for a missing room; it hands back
/// sentinels (`send` returning 0, `join_room` returning false). The
/// handlers translate those into `RoomNotFound` here, because a device
/// that believes a one-shot send or join succeeded when it didn't would
/// silently lose data.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The room does not exist (never created, expired, or closed).
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// Binding or serving the listener failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::RoomNotFound(_) => StatusCode::NOT_FOUND,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
