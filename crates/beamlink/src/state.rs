//! Shared server state.

use std::sync::Arc;

use beamlink_store::{RoomStore, StoreConfig};
use tokio::sync::Mutex;

/// State shared by every request handler and the sweeper task.
///
/// The store is the single shared mutable resource in the process, so
/// one coarse mutex around it is enough: every operation it runs is a
/// short, synchronous, CPU-only transaction against at most one room.
/// No handler holds the lock across an await.
pub struct AppState {
    pub(crate) store: Arc<Mutex<RoomStore>>,
}

impl AppState {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(RoomStore::new(config))),
        }
    }

    /// The store handle, for collaborators that outlive a request
    /// (the sweeper).
    pub fn store(&self) -> Arc<Mutex<RoomStore>> {
        Arc::clone(&self.store)
    }
}
