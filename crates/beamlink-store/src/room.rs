//! A single room: channel buffers, last-seen stamps, id allocation.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use beamlink_protocol::{MessageInput, Role, RoomId, StoredMessage};

/// One ephemeral rendezvous point between a projector and its admins.
///
/// All mutation goes through [`RoomStore`](crate::RoomStore); the room
/// itself only knows how to stamp activity, track per-role last-seen
/// times, and append to its bounded channel buffers.
pub(crate) struct Room {
    pub(crate) id: RoomId,

    /// Epoch milliseconds at creation. Immutable.
    pub(crate) created_at: u64,

    /// Refreshed on every send or poll. Used solely for TTL expiry,
    /// so a monotonic clock is the right tool; this never travels on
    /// the wire.
    pub(crate) last_activity: Instant,

    /// Epoch milliseconds of each role's most recent heartbeat.
    /// `0` means "never seen".
    pub(crate) admin_last_seen: u64,
    pub(crate) projector_last_seen: u64,

    /// Named message lanes, created lazily on first send.
    pub(crate) channels: HashMap<String, VecDeque<StoredMessage>>,

    /// Next message id, starting at 1. Shared across all of the room's
    /// channels: ids are unique and strictly increasing room-wide, but
    /// not necessarily contiguous within one channel.
    pub(crate) next_message_id: u64,
}

impl Room {
    pub(crate) fn new(id: RoomId, now_ms: u64) -> Self {
        Self {
            id,
            created_at: now_ms,
            last_activity: Instant::now(),
            admin_last_seen: 0,
            projector_last_seen: 0,
            channels: HashMap::new(),
            next_message_id: 1,
        }
    }

    /// Marks the room as active now. `Instant::now()` is monotonic, so
    /// `last_activity` never moves backwards.
    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub(crate) fn last_seen(&self, role: Role) -> u64 {
        match role {
            Role::Admin => self.admin_last_seen,
            Role::Projector => self.projector_last_seen,
        }
    }

    pub(crate) fn mark_seen(&mut self, role: Role, now_ms: u64) {
        match role {
            Role::Admin => self.admin_last_seen = now_ms,
            Role::Projector => self.projector_last_seen = now_ms,
        }
    }

    /// Allocates the next id, appends the message to `channel`, and
    /// trims the buffer from the front to `capacity`. Ids of dropped
    /// messages are gone for good.
    pub(crate) fn append(
        &mut self,
        channel: &str,
        message: MessageInput,
        now_ms: u64,
        capacity: usize,
    ) -> u64 {
        let id = self.next_message_id;
        self.next_message_id += 1;

        let buffer = self.channels.entry(channel.to_string()).or_default();
        buffer.push_back(StoredMessage {
            id,
            kind: message.kind,
            payload: message.payload,
            created_at: now_ms,
        });
        while buffer.len() > capacity {
            buffer.pop_front();
        }

        id
    }
}
