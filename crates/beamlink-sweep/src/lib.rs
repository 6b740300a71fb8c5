//! Periodic room-expiry sweeper.
//!
//! [`RoomStore::cleanup`](beamlink_store::RoomStore::cleanup) only runs
//! when something calls it; absent rooms otherwise just answer benignly
//! while their memory sits around. This crate provides that caller: a
//! small background task that takes the store lock on an interval,
//! sweeps, and releases it.
//!
//! # Integration
//!
//! ```ignore
//! let store = Arc::new(Mutex::new(RoomStore::default()));
//! let sweeper = spawn_sweeper(Arc::clone(&store), SweepConfig::default());
//! // ... serve requests ...
//! sweeper.shutdown().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use beamlink_store::RoomStore;
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;

/// Configuration for the sweeper task.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Time between sweeps. The room TTL (30 minutes) dominates expiry
    /// latency, so the interval only bounds how long an expired room's
    /// memory lingers past that.
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// Handle to a running sweeper task.
///
/// Dropping the handle also stops the task: the sweeper exits when its
/// shutdown channel closes.
pub struct SweeperHandle {
    shutdown: mpsc::Sender<()>,
}

impl SweeperHandle {
    /// Asks the sweeper task to stop. Idempotent; a second call (or a
    /// call after the task died) is a no-op.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(()).await;
    }
}

/// Spawns the sweeper task and returns a handle to stop it.
///
/// The first sweep happens one full interval after spawn, not
/// immediately; a store is empty at startup anyway. If a sweep is
/// delayed (runtime stall, long lock hold), missed ticks are skipped
/// rather than run back to back.
pub fn spawn_sweeper(
    store: Arc<Mutex<RoomStore>>,
    config: SweepConfig,
) -> SweeperHandle {
    let (tx, mut rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately once; swallow that first tick so
        // sweeps start one interval in.
        ticker.tick().await;

        tracing::debug!(interval = ?config.interval, "sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    store.lock().await.cleanup();
                }
                _ = rx.recv() => {
                    tracing::debug!("sweeper stopped");
                    break;
                }
            }
        }
    });

    SweeperHandle { shutdown: tx }
}
