//! In-memory room registry for the beamlink relay.
//!
//! A [`RoomStore`] is the single source of truth for every ephemeral
//! room: who last heartbeated, which messages each channel retains, and
//! when a room was last active. Rooms are a rendezvous point between two
//! device roles (an admin scanner and a projector display) that never
//! hold a persistent connection; they discover messages by polling with
//! a cursor and infer each other's presence from heartbeat recency.
//!
//! Nothing here is persisted. A process restart drops all rooms, which
//! is acceptable: clients re-pair by scanning a fresh code.
//!
//! # Key types
//!
//! - [`RoomStore`] — creates rooms, accepts sends, serves polls,
//!   processes heartbeats, sweeps expired rooms
//! - [`StoreConfig`] — buffer capacity, room TTL, liveness timeout
//! - [`is_peer_connected`] — the pure liveness derivation

mod config;
mod room;
mod store;

pub use config::StoreConfig;
pub use store::{is_peer_connected, RoomStore};
