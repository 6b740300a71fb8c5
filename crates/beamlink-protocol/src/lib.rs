//! Wire types for the beamlink room relay.
//!
//! This crate defines everything that crosses the RPC boundary:
//!
//! - **Identity** ([`RoomId`], [`Role`]) — who is talking about which room.
//! - **Channels** ([`Channel`]) — the named message lanes the RPC layer
//!   accepts. The store itself treats channel names as opaque strings;
//!   this enum is the calling layer's input validation.
//! - **Messages** ([`MessageInput`], [`StoredMessage`]) — what devices
//!   send and what pollers get back.
//! - **Procedure bodies** — one request/response pair per RPC procedure.
//!
//! # Wire format
//!
//! Field names are camelCase on the wire (`roomId`, `afterId`, `lastId`,
//! `peerConnected`, `createdAt`) because the relay's browser clients were
//! written against those shapes. The serde attributes on each type are
//! load-bearing; the JSON tests at the bottom of `types.rs` pin them down.

mod error;
mod types;

pub use error::ProtocolError;
pub use types::{
    Channel, CreateRoomResponse, DisconnectRequest, HeartbeatRequest,
    HeartbeatResponse, JoinRoomRequest, MessageInput, OkResponse,
    PollQuery, PollResponse, Role, RoomId, SendRequest, SendResponse,
    StoredMessage, HEARTBEAT_INTERVAL, POLL_INTERVAL,
};
