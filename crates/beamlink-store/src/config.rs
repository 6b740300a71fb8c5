//! Store configuration.

use std::time::Duration;

/// Tunables for a [`RoomStore`](crate::RoomStore).
///
/// The defaults are a wire contract, not a suggestion: deployed clients
/// poll every second and heartbeat every five, and their reconnect UX is
/// built around these exact windows. Tests shrink them to zero to force
/// expiry without sleeping.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Most recent messages retained per channel. Once a channel
    /// exceeds this, the oldest messages are dropped; their ids are
    /// never reused.
    pub channel_capacity: usize,

    /// How long a room survives without any send or poll against it
    /// before the sweep removes it.
    pub room_ttl: Duration,

    /// How recent the peer's last heartbeat must be for it to count
    /// as connected.
    pub heartbeat_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
            room_ttl: Duration::from_secs(30 * 60),
            heartbeat_timeout: Duration::from_secs(15),
        }
    }
}
