//! # beamlink
//!
//! Polling room relay for pairing scanner and projector devices.
//!
//! A projector display opens a room and renders its id as a scannable
//! code; an admin scanner joins with that id. From then on both sides
//! heartbeat for liveness and exchange messages through bounded
//! per-channel queues, discovering new messages by polling with a
//! cursor. No persistent connection, no external broker.
//!
//! This crate is the HTTP face of the relay: it exposes the store's
//! seven operations as RPC procedures, translates the store's sentinel
//! returns into protocol errors, and runs the expiry sweeper alongside
//! the server.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use beamlink::RelayServer;
//!
//! # async fn run() -> Result<(), beamlink::RelayError> {
//! let server = RelayServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod routes;
mod server;
mod state;

pub use config::Config;
pub use error::RelayError;
pub use routes::router;
pub use server::{RelayServer, RelayServerBuilder};
pub use state::AppState;
