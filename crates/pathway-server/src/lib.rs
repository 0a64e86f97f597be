//! # pathway-server
//!
//! Axum WebSocket server for per-connection waypoint graph editing.
//!
//! - One [`Session`](session::Session) per connection, owning its own graph
//!   and path-search engine
//! - Protobuf commands in, protobuf acknowledgment events out, strictly
//!   alternating reads and writes
//! - `/health` and Prometheus `/metrics` alongside the upgrade routes
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod graph;
pub mod health;
pub mod metrics;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod transport;

pub use config::ServerConfig;
pub use errors::{Result, SessionError, TransportError};
pub use server::{EngineFactory, PathwayServer};
pub use session::{Session, SessionState};
