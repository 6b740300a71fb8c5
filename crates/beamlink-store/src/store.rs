//! The room store: registry, polling cursors, liveness, expiry.
//!
//! # Concurrency note
//!
//! `RoomStore` is NOT thread-safe by itself. It uses a plain `HashMap`,
//! and every operation is short, synchronous, and CPU-only. The server
//! wraps the whole store in one coarse mutex; send/poll/heartbeat on the
//! same room from different devices arrive concurrently and must not
//! race on id allocation or buffer trimming, and a single lock around
//! operations this small costs less than per-room locking would.
//!
//! # Error posture
//!
//! The store never errors for a missing room. Timer-driven calls
//! (`poll`, `heartbeat`, `disconnect`) get benign defaults because the
//! room may legitimately have expired between ticks; one-shot calls get
//! a sentinel the RPC layer must surface (`send` returns `0`,
//! `join_room` returns `false`).

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use beamlink_protocol::{
    HeartbeatResponse, MessageInput, PollResponse, Role, RoomId,
};

use crate::room::Room;
use crate::StoreConfig;

/// Derives peer liveness from heartbeat recency.
///
/// There is no stored pairing flag: each side infers the other's
/// presence per call from the peer's most recent heartbeat timestamp.
/// This keeps the state model minimal and self-healing after either
/// side restarts. `peer_last_seen_ms == 0` ("never seen") is always
/// stale because `now_ms` is far beyond any realistic timeout.
pub fn is_peer_connected(
    now_ms: u64,
    peer_last_seen_ms: u64,
    timeout: Duration,
) -> bool {
    now_ms.saturating_sub(peer_last_seen_ms) < timeout.as_millis() as u64
}

/// Milliseconds since the Unix epoch. Falls back to 0 on a pre-epoch
/// clock rather than panicking.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The process-wide registry of ephemeral rooms.
///
/// Sole owner of all room state. Constructed once at startup and handed
/// to the RPC layer by reference; tests build as many independent
/// instances as they like.
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
    config: StoreConfig,
}

impl RoomStore {
    /// Creates an empty store with the given tunables.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Creates a new room and returns its id. Always succeeds.
    ///
    /// The room starts with no channels, no heartbeats seen for either
    /// role, and its message id counter at 1.
    pub fn create_room(&mut self) -> RoomId {
        let room_id = RoomId::random();
        self.rooms.insert(room_id, Room::new(room_id, now_ms()));
        tracing::info!(%room_id, "room created");
        room_id
    }

    /// Pure existence check, used by a joining peer to fail fast.
    ///
    /// Does not mutate anything; in particular it does NOT refresh
    /// `last_activity`.
    pub fn join_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Appends a message to the named channel and returns its id.
    ///
    /// Returns `0` when the room does not exist. Real ids start at 1,
    /// so `0` unambiguously means "not delivered"; callers must treat
    /// it as a failure and report it upward.
    pub fn send(
        &mut self,
        room_id: &RoomId,
        channel: &str,
        message: MessageInput,
    ) -> u64 {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return 0;
        };
        room.touch();
        room.append(channel, message, now_ms(), self.config.channel_capacity)
    }

    /// Reads the named channel's messages with `id > after_id`, in
    /// insertion order.
    ///
    /// The returned `last_id` is the id of the last message returned,
    /// or `after_id` unchanged when nothing new arrived; feeding it
    /// back as the next call's cursor makes polling an idempotent,
    /// resumable incremental read. An unknown room yields a benign
    /// empty result (pollers run on a timer and must tolerate the room
    /// having expired between ticks). A poller more than
    /// `channel_capacity` behind has permanently lost the gap.
    pub fn poll(
        &mut self,
        room_id: &RoomId,
        channel: &str,
        after_id: u64,
    ) -> PollResponse {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return PollResponse {
                messages: Vec::new(),
                last_id: 0,
            };
        };
        room.touch();

        let messages: Vec<_> = room
            .channels
            .get(channel)
            .map(|buffer| {
                buffer
                    .iter()
                    .filter(|m| m.id > after_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let last_id = messages.last().map_or(after_id, |m| m.id);

        PollResponse { messages, last_id }
    }

    /// Sends the same message to the named channel of every room.
    ///
    /// Iterated sends; each room allocates its own message id. Used for
    /// relay-wide notifications on the `projector` channel. Rooms that
    /// vanish mid-iteration are skipped silently.
    pub fn broadcast(&mut self, channel: &str, message: &MessageInput) {
        let room_ids: Vec<RoomId> =
            self.rooms.values().map(|room| room.id).collect();
        for room_id in room_ids {
            self.send(&room_id, channel, message.clone());
        }
    }

    /// Broadcasts on the session-scoped channel `session:<session_id>`.
    ///
    /// Session channels are internal fan-out lanes for events tied to a
    /// user session rather than a room; the RPC layer does not let
    /// external callers send into them.
    pub fn send_to_session(
        &mut self,
        session_id: &str,
        message: &MessageInput,
    ) {
        self.broadcast(&format!("session:{session_id}"), message);
    }

    /// Records a heartbeat for `role` and reports the peer's liveness.
    ///
    /// Liveness is derived, never stored: the peer counts as connected
    /// while its own last heartbeat is more recent than the configured
    /// timeout. An unknown room reports a disconnected peer rather than
    /// erroring, for the same timer-tolerance reason as [`poll`](Self::poll).
    pub fn heartbeat(
        &mut self,
        room_id: &RoomId,
        role: Role,
    ) -> HeartbeatResponse {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return HeartbeatResponse {
                peer_connected: false,
                peer_last_seen: 0,
            };
        };

        let now = now_ms();
        room.touch();
        room.mark_seen(role, now);

        let peer_last_seen = room.last_seen(role.peer());
        HeartbeatResponse {
            peer_connected: is_peer_connected(
                now,
                peer_last_seen,
                self.config.heartbeat_timeout,
            ),
            peer_last_seen,
        }
    }

    /// Handles an explicit disconnect for `role`.
    ///
    /// The two roles are deliberately asymmetric:
    ///
    /// - `projector`: its last-seen stamp is reset, and if no admin has
    ///   ever been seen the room is deleted on the spot ("projector
    ///   closed before anyone paired"). A paired room stays for its
    ///   remaining TTL.
    /// - `admin`: a no-op on room state. Several admin devices may use
    ///   one room over its lifetime, so one admin leaving must not
    ///   poison liveness for the others; admin staleness is only ever
    ///   inferred from heartbeat timeout.
    ///
    /// Returns `true` whenever the room exists, regardless of branch.
    pub fn disconnect(&mut self, room_id: &RoomId, role: Role) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };

        if role == Role::Projector {
            room.projector_last_seen = 0;
            if room.admin_last_seen == 0 {
                self.rooms.remove(room_id);
                tracing::info!(%room_id, "unpaired room closed by projector");
            }
        }

        true
    }

    /// Removes every room idle for longer than the TTL.
    ///
    /// Expiry is otherwise lazy (absent rooms answer benignly), so this
    /// sweep is what actually frees memory; an external timer is
    /// expected to call it periodically.
    pub fn cleanup(&mut self) {
        let ttl = self.config.room_ttl;
        let before = self.rooms.len();
        self.rooms
            .retain(|_, room| room.last_activity.elapsed() <= ttl);

        let swept = before - self.rooms.len();
        if swept > 0 {
            tracing::info!(swept, remaining = self.rooms.len(), "idle rooms expired");
        }
    }

    /// Number of rooms currently in the registry.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Ids of all current rooms.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    /// `true` if no rooms exist.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Epoch milliseconds at which the room was created, if it exists.
    pub fn created_at(&self, room_id: &RoomId) -> Option<u64> {
        self.rooms.get(room_id).map(|room| room.created_at)
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `RoomStore`.
    //!
    //! # Testing time-dependent behavior
    //!
    //! Expiry and liveness both compare stored stamps against "now".
    //! Instead of sleeping, tests pick configs at the poles:
    //!   - `Duration::ZERO` → everything is already expired/stale
    //!   - the defaults (30 min / 15 s) → nothing expires during a test
    //! This keeps the suite fast and deterministic.

    use serde_json::json;

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn store() -> RoomStore {
        RoomStore::new(StoreConfig::default())
    }

    /// A store whose rooms are expired the moment they stop being
    /// touched.
    fn store_with_instant_expiry() -> RoomStore {
        RoomStore::new(StoreConfig {
            room_ttl: Duration::ZERO,
            ..StoreConfig::default()
        })
    }

    /// A store where even a just-received heartbeat already counts as
    /// stale.
    fn store_with_instant_staleness() -> RoomStore {
        RoomStore::new(StoreConfig {
            heartbeat_timeout: Duration::ZERO,
            ..StoreConfig::default()
        })
    }

    /// A syntactically valid id that no store has ever issued.
    fn unknown_room() -> RoomId {
        "00000000-0000-0000-0000-000000000000".parse().unwrap()
    }

    fn msg(kind: &str) -> MessageInput {
        MessageInput::new(kind, json!({}))
    }

    // =====================================================================
    // create_room / join_room
    // =====================================================================

    #[test]
    fn test_create_room_returns_unique_ids() {
        let mut store = store();
        let r1 = store.create_room();
        let r2 = store.create_room();
        assert_ne!(r1, r2);
        assert_eq!(store.room_count(), 2);
    }

    #[test]
    fn test_create_room_records_creation_time() {
        let mut store = store();
        let room = store.create_room();
        let created = store.created_at(&room).unwrap();
        assert!(created > 0);
        assert!(store.created_at(&unknown_room()).is_none());
    }

    #[test]
    fn test_join_room_existing_returns_true() {
        let mut store = store();
        let room = store.create_room();
        assert!(store.join_room(&room));
    }

    #[test]
    fn test_join_room_unknown_returns_false() {
        assert!(!store().join_room(&unknown_room()));
    }

    // =====================================================================
    // send / poll
    // =====================================================================

    #[test]
    fn test_send_then_poll_round_trip() {
        let mut store = store();
        let room = store.create_room();

        let id = store.send(
            &room,
            "upstream",
            MessageInput::new("NFC_SCANNED", json!({ "nfcId": "abc" })),
        );
        assert_eq!(id, 1);

        let result = store.poll(&room, "upstream", 0);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].id, 1);
        assert_eq!(result.messages[0].kind, "NFC_SCANNED");
        assert_eq!(result.messages[0].payload["nfcId"], "abc");
        assert!(result.messages[0].created_at > 0);
        assert_eq!(result.last_id, 1);
    }

    #[test]
    fn test_send_unknown_room_returns_zero_sentinel() {
        let mut store = store();
        assert_eq!(store.send(&unknown_room(), "upstream", msg("A")), 0);
    }

    #[test]
    fn test_message_ids_strictly_increase_across_channels() {
        // Ids are allocated from one per-room counter, so interleaving
        // channels still yields 1..N with no duplicates.
        let mut store = store();
        let room = store.create_room();

        let mut ids = Vec::new();
        for i in 0..8 {
            let channel = if i % 2 == 0 { "upstream" } else { "downstream" };
            ids.push(store.send(&room, channel, msg("tick")));
        }

        assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
    }

    #[test]
    fn test_message_ids_survive_truncation() {
        // Dropping old messages must not rewind the counter: ids keep
        // climbing past the cap and are never reused.
        let mut store = RoomStore::new(StoreConfig {
            channel_capacity: 3,
            ..StoreConfig::default()
        });
        let room = store.create_room();

        for _ in 0..5 {
            store.send(&room, "upstream", msg("m"));
        }
        assert_eq!(store.send(&room, "upstream", msg("m")), 6);

        let result = store.poll(&room, "upstream", 0);
        let ids: Vec<u64> = result.messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
    }

    #[test]
    fn test_poll_with_cursor_returns_only_newer() {
        let mut store = store();
        let room = store.create_room();
        store.send(&room, "upstream", msg("A"));
        store.send(&room, "upstream", msg("B"));
        store.send(&room, "upstream", msg("C"));

        let result = store.poll(&room, "upstream", 1);
        let kinds: Vec<&str> =
            result.messages.iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(kinds, vec!["B", "C"]);
        assert_eq!(result.last_id, 3);
    }

    #[test]
    fn test_poll_cursor_chain_is_resumable() {
        // Feeding each response's last_id back as the next cursor walks
        // the channel exactly once, in order, with no gaps or repeats.
        let mut store = store();
        let room = store.create_room();
        for i in 0..6 {
            store.send(&room, "upstream", msg(&format!("m{i}")));
        }

        let mut cursor = 0;
        let mut seen = Vec::new();
        loop {
            let result = store.poll(&room, "upstream", cursor);
            if result.messages.is_empty() {
                assert_eq!(result.last_id, cursor);
                break;
            }
            seen.extend(result.messages.iter().map(|m| m.id));
            cursor = result.last_id;
        }

        assert_eq!(seen, (1..=6).collect::<Vec<u64>>());
    }

    #[test]
    fn test_poll_caught_up_keeps_cursor() {
        let mut store = store();
        let room = store.create_room();
        store.send(&room, "upstream", msg("A"));

        let result = store.poll(&room, "upstream", 1);
        assert!(result.messages.is_empty());
        assert_eq!(result.last_id, 1, "cursor unchanged when nothing new");
    }

    #[test]
    fn test_poll_unsent_channel_is_empty() {
        let mut store = store();
        let room = store.create_room();

        let result = store.poll(&room, "downstream", 5);
        assert!(result.messages.is_empty());
        assert_eq!(result.last_id, 5);
    }

    #[test]
    fn test_poll_unknown_room_is_benign() {
        let mut store = store();
        let result = store.poll(&unknown_room(), "upstream", 7);
        assert!(result.messages.is_empty());
        assert_eq!(result.last_id, 0);
    }

    #[test]
    fn test_channel_capped_at_100_messages() {
        let mut store = store();
        let room = store.create_room();
        for i in 0..110 {
            store.send(&room, "upstream", MessageInput::new("msg", json!({ "i": i })));
        }

        let result = store.poll(&room, "upstream", 0);
        assert_eq!(result.messages.len(), 100);
        assert_eq!(result.messages[0].id, 11);
        assert_eq!(result.messages[99].id, 110);
        assert_eq!(result.last_id, 110);
    }

    #[test]
    fn test_channels_are_trimmed_independently() {
        let mut store = RoomStore::new(StoreConfig {
            channel_capacity: 2,
            ..StoreConfig::default()
        });
        let room = store.create_room();

        store.send(&room, "upstream", msg("u1"));
        store.send(&room, "upstream", msg("u2"));
        store.send(&room, "upstream", msg("u3"));
        store.send(&room, "downstream", msg("d1"));

        assert_eq!(store.poll(&room, "upstream", 0).messages.len(), 2);
        assert_eq!(store.poll(&room, "downstream", 0).messages.len(), 1);
    }

    // =====================================================================
    // broadcast / send_to_session
    // =====================================================================

    #[test]
    fn test_broadcast_reaches_every_room() {
        let mut store = store();
        let r1 = store.create_room();
        let r2 = store.create_room();

        store.broadcast(
            "projector",
            &MessageInput::new("gacha:result", json!({ "costumeId": "x" })),
        );

        for room in [r1, r2] {
            let result = store.poll(&room, "projector", 0);
            assert_eq!(result.messages.len(), 1);
            assert_eq!(result.messages[0].kind, "gacha:result");
            // Each room allocates from its own counter.
            assert_eq!(result.messages[0].id, 1);
        }
    }

    #[test]
    fn test_broadcast_with_no_rooms_is_a_no_op() {
        let mut store = store();
        store.broadcast("projector", &msg("noop"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_send_to_session_uses_session_channel() {
        let mut store = store();
        let r1 = store.create_room();
        let r2 = store.create_room();

        store.send_to_session("sess-1", &msg("session:updated"));

        for room in [r1, r2] {
            let result = store.poll(&room, "session:sess-1", 0);
            assert_eq!(result.messages.len(), 1);
        }
        // Unrelated session channels stay empty.
        assert!(store.poll(&r1, "session:sess-2", 0).messages.is_empty());
    }

    // =====================================================================
    // heartbeat
    // =====================================================================

    #[test]
    fn test_heartbeat_before_peer_reports_disconnected() {
        let mut store = store();
        let room = store.create_room();

        let status = store.heartbeat(&room, Role::Admin);
        assert!(!status.peer_connected);
        assert_eq!(status.peer_last_seen, 0);
    }

    #[test]
    fn test_heartbeat_sees_recent_peer() {
        let mut store = store();
        let room = store.create_room();

        store.heartbeat(&room, Role::Projector);
        let status = store.heartbeat(&room, Role::Admin);
        assert!(status.peer_connected);
        assert!(status.peer_last_seen > 0);
    }

    #[test]
    fn test_heartbeat_liveness_is_symmetric_once_both_seen() {
        let mut store = store();
        let room = store.create_room();

        store.heartbeat(&room, Role::Admin);
        store.heartbeat(&room, Role::Projector);

        assert!(store.heartbeat(&room, Role::Admin).peer_connected);
        assert!(store.heartbeat(&room, Role::Projector).peer_connected);
    }

    #[test]
    fn test_heartbeat_stale_peer_reports_disconnected() {
        // With a zero timeout even a heartbeat from this same test run
        // is already stale; this exercises the recency comparison
        // without sleeping through the real 15s window.
        let mut store = store_with_instant_staleness();
        let room = store.create_room();

        store.heartbeat(&room, Role::Projector);
        let status = store.heartbeat(&room, Role::Admin);
        assert!(!status.peer_connected);
        assert!(status.peer_last_seen > 0, "raw stamp is still reported");
    }

    #[test]
    fn test_heartbeat_unknown_room_is_benign() {
        let mut store = store();
        let status = store.heartbeat(&unknown_room(), Role::Admin);
        assert!(!status.peer_connected);
        assert_eq!(status.peer_last_seen, 0);
    }

    #[test]
    fn test_is_peer_connected_boundaries() {
        let timeout = Duration::from_secs(15);
        // Never seen: the zero stamp is unreachably old.
        assert!(!is_peer_connected(1_700_000_000_000, 0, timeout));
        // Fresh heartbeat.
        assert!(is_peer_connected(1_700_000_010_000, 1_700_000_000_000, timeout));
        // Exactly at the window is already disconnected (strict <).
        assert!(!is_peer_connected(1_700_000_015_000, 1_700_000_000_000, timeout));
        // Clock skew (peer stamp ahead of now) saturates to connected.
        assert!(is_peer_connected(1_700_000_000_000, 1_700_000_001_000, timeout));
    }

    // =====================================================================
    // disconnect
    // =====================================================================

    #[test]
    fn test_disconnect_unknown_room_returns_false() {
        assert!(!store().disconnect(&unknown_room(), Role::Projector));
    }

    #[test]
    fn test_admin_disconnect_leaves_room_state_alone() {
        // Several admin devices can share one room; one of them leaving
        // must not flip liveness for the rest.
        let mut store = store();
        let room = store.create_room();
        store.heartbeat(&room, Role::Admin);
        store.heartbeat(&room, Role::Projector);

        assert!(store.disconnect(&room, Role::Admin));

        assert!(store.join_room(&room));
        let status = store.heartbeat(&room, Role::Projector);
        assert!(status.peer_connected, "admin stamp must remain intact");
    }

    #[test]
    fn test_projector_disconnect_marks_projector_gone() {
        let mut store = store();
        let room = store.create_room();
        store.heartbeat(&room, Role::Admin);
        store.heartbeat(&room, Role::Projector);

        assert!(store.disconnect(&room, Role::Projector));

        // Paired room survives for its remaining TTL.
        assert!(store.join_room(&room));
        let status = store.heartbeat(&room, Role::Admin);
        assert!(!status.peer_connected);
        assert_eq!(status.peer_last_seen, 0);
    }

    #[test]
    fn test_projector_disconnect_deletes_unpaired_room() {
        // "Projector closed before anyone paired": the only explicit
        // deletion path besides the TTL sweep.
        let mut store = store();
        let room = store.create_room();
        store.heartbeat(&room, Role::Projector);

        assert!(store.disconnect(&room, Role::Projector));
        assert!(!store.join_room(&room));
    }

    #[test]
    fn test_projector_disconnect_keeps_room_once_admin_ever_seen() {
        let mut store = store();
        let room = store.create_room();
        store.heartbeat(&room, Role::Admin);

        assert!(store.disconnect(&room, Role::Projector));
        assert!(store.join_room(&room));
    }

    // =====================================================================
    // cleanup
    // =====================================================================

    #[test]
    fn test_cleanup_removes_idle_rooms() {
        let mut store = store_with_instant_expiry();
        let room = store.create_room();

        store.cleanup();

        assert!(!store.join_room(&room));
        assert!(store.is_empty());
    }

    #[test]
    fn test_cleanup_keeps_rooms_within_ttl() {
        let mut store = store();
        let room = store.create_room();

        store.cleanup();

        assert!(store.join_room(&room));
    }

    #[test]
    fn test_expired_room_answers_like_it_never_existed() {
        let mut store = store_with_instant_expiry();
        let room = store.create_room();
        store.cleanup();

        assert_eq!(store.send(&room, "upstream", msg("late")), 0);
        let result = store.poll(&room, "upstream", 0);
        assert!(result.messages.is_empty());
        assert_eq!(result.last_id, 0);
        assert!(!store.heartbeat(&room, Role::Admin).peer_connected);
        assert!(!store.disconnect(&room, Role::Projector));
    }

    #[test]
    fn test_room_ids_lists_current_rooms() {
        let mut store = store();
        let r1 = store.create_room();
        let r2 = store.create_room();

        let ids = store.room_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&r1));
        assert!(ids.contains(&r2));
    }
}
