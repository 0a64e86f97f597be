//! # pathway-proto
//!
//! Wire schema and codec for the graph-editing protocol.
//!
//! One protobuf message travels per WebSocket binary frame:
//!
//! - client → server: [`schema::ToServerCommand`], decoded into [`Command`]
//! - server → client: [`schema::ToClientCommand`], built from [`OutboundEvent`]
//!
//! The schema types are byte-compatible with the browser editor's generated
//! `pathfinding_pb.js` messages.

#![deny(unsafe_code)]

pub mod command;
pub mod errors;
pub mod event;
pub mod schema;

pub use command::Command;
pub use errors::{ProtoError, Result};
pub use event::{OutboundEvent, Route};
