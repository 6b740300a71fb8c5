//! Core wire types for the beamlink relay.
//!
//! Everything here is serialized to JSON and parsed by browser clients,
//! so the serde attributes define a compatibility contract. The tests at
//! the bottom of this file pin the exact JSON shapes.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Caller-side timing conventions
// ---------------------------------------------------------------------------

/// How often a device should call `room.heartbeat`.
///
/// Must stay well below the store's 15 second peer-liveness timeout:
/// each side infers the other's presence purely from the recency of its
/// most recent heartbeat, so a sender slower than the timeout looks dead.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// How often a device should call `room.poll` on each channel it reads.
///
/// Polling is the only delivery mechanism; there is no push transport.
/// A poller that falls more than a channel's capacity behind permanently
/// loses the skipped messages.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a room.
///
/// Newtype over a v4 UUID. `#[serde(transparent)]` makes it travel as a
/// plain string on the wire (`"550e8400-e29b-..."`), not as a wrapper
/// object, which is what the clients expect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(Uuid);

impl RoomId {
    /// Generates a fresh random room id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ProtocolError::InvalidRoomId(s.to_string()))
    }
}

/// The two device roles that can rendezvous in a room.
///
/// A room is opened by one projector (the display rendering the scannable
/// code) and joined by admin scanner devices. Exactly one projector but
/// potentially several admins interact with a room over its lifetime;
/// the asymmetric disconnect semantics in the store depend on this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Projector,
}

impl Role {
    /// The opposite role, i.e. the peer whose liveness this role asks
    /// about when heartbeating.
    pub fn peer(self) -> Self {
        match self {
            Self::Admin => Self::Projector,
            Self::Projector => Self::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Projector => write!(f, "projector"),
        }
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// The message channels the RPC layer accepts.
///
/// The store treats channel names as opaque strings and creates buffers
/// lazily; restricting what external callers can name is the RPC layer's
/// job. Internal session-scoped channels (`session:<id>`) are constructed
/// by the server and are deliberately not listed here, so clients cannot
/// send into them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Admin scanner → projector display.
    Upstream,
    /// Projector display → admin scanner.
    Downstream,
    /// Relay-wide broadcast lane for system events visible to every
    /// display room.
    Projector,
}

impl Channel {
    /// The channel name as stored in the room's channel map.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upstream => "upstream",
            Self::Downstream => "downstream",
            Self::Projector => "projector",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A message as submitted by a device.
///
/// `kind` is an application-level tag and `payload` is opaque data; the
/// relay inspects neither. On the wire the tag field is named `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
}

impl MessageInput {
    pub fn new(
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// A message as returned by `room.poll`.
///
/// `id` is unique and strictly increasing within the message's room
/// (across all channels, for the room's whole lifetime). `created_at` is
/// epoch milliseconds at insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
    pub created_at: u64,
}

// ---------------------------------------------------------------------------
// Procedure bodies
// ---------------------------------------------------------------------------

/// Response of `room.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: RoomId,
}

/// Request body of `room.join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_id: RoomId,
}

/// Generic acknowledgement for procedures with nothing else to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Request body of `room.send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub room_id: RoomId,
    pub channel: Channel,
    pub message: MessageInput,
}

/// Response of `room.send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub message_id: u64,
}

/// Query parameters of `room.poll`.
///
/// `after_id` is the cursor: callers pass the `last_id` of the previous
/// response and receive only newer messages. Omitting it reads the whole
/// retained window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuery {
    pub room_id: RoomId,
    pub channel: Channel,
    pub after_id: Option<u64>,
}

/// Response of `room.poll`.
///
/// `last_id` is the id of the last returned message, or the request's
/// cursor unchanged when nothing new arrived. Feeding it back as the next
/// `after_id` makes polling an idempotent, resumable incremental read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub messages: Vec<StoredMessage>,
    pub last_id: u64,
}

/// Request body of `room.heartbeat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub room_id: RoomId,
    pub role: Role,
}

/// Response of `room.heartbeat`.
///
/// `peer_last_seen` is the raw epoch-millisecond timestamp of the peer
/// role's most recent heartbeat, `0` if it has never heartbeated.
/// `peer_connected` is derived from that timestamp's recency; there is no
/// stored pairing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub peer_connected: bool,
    pub peer_last_seen: u64,
}

/// Request body of `room.disconnect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectRequest {
    pub room_id: RoomId,
    pub role: Role,
}

// =========================================================================
// Tests
// =========================================================================
