//! Server → client events.

use bytes::Bytes;
use prost::Message;

use crate::errors::{ProtoError, Result};
use crate::schema::{self, to_client_command};

/// A path returned to the client, as node IDs.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    /// Node IDs from start to goal, both inclusive.
    pub nodes: Vec<u32>,
    /// Total path cost.
    pub cost: f32,
}

/// An event queued by a mutation handler for delivery to the client.
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundEvent {
    /// Node `id` now exists at `(x, y)`.
    NodeAdded {
        /// Allocated node ID.
        id: u32,
        /// Horizontal coordinate.
        x: f32,
        /// Vertical coordinate.
        y: f32,
    },
    /// Node `id` was removed together with its edges.
    NodeRemoved {
        /// Released node ID.
        id: u32,
    },
    /// `id1` and `id2` are connected.
    ConnectionAdded {
        /// First endpoint.
        id1: u32,
        /// Second endpoint.
        id2: u32,
    },
    /// `id1` and `id2` are no longer connected.
    ConnectionRemoved {
        /// First endpoint.
        id1: u32,
        /// Second endpoint.
        id2: u32,
    },
    /// Result of a path search; `route` is `None` when `goal` is unreachable.
    PathFound {
        /// Start node ID.
        start: u32,
        /// Goal node ID.
        goal: u32,
        /// The cheapest route, if any.
        route: Option<Route>,
    },
}

impl OutboundEvent {
    /// Encode into a frame payload. Takes the event by value; the encoded
    /// bytes own everything they reference.
    pub fn encode(self) -> Bytes {
        schema::ToClientCommand::from(self).encode_to_vec().into()
    }

    /// Decode a frame payload (used by clients and tests).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let envelope = schema::ToClientCommand::decode(payload)?;
        envelope
            .command
            .map(Self::from)
            .ok_or(ProtoError::MissingCommand)
    }

    /// Stable lowercase name for logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NodeAdded { .. } => "node_added",
            Self::NodeRemoved { .. } => "node_removed",
            Self::ConnectionAdded { .. } => "connection_added",
            Self::ConnectionRemoved { .. } => "connection_removed",
            Self::PathFound { .. } => "path_found",
        }
    }
}

impl From<OutboundEvent> for schema::ToClientCommand {
    fn from(event: OutboundEvent) -> Self {
        use to_client_command::Command as Wire;
        let command = match event {
            OutboundEvent::NodeAdded { id, x, y } => Wire::NodeAdded(schema::NodeAdded { id, x, y }),
            OutboundEvent::NodeRemoved { id } => Wire::NodeRemoved(schema::NodeRemoved { id }),
            OutboundEvent::ConnectionAdded { id1, id2 } => {
                Wire::ConnectionAdded(schema::ConnectionAdded { id1, id2 })
            }
            OutboundEvent::ConnectionRemoved { id1, id2 } => {
                Wire::ConnectionRemoved(schema::ConnectionRemoved { id1, id2 })
            }
            OutboundEvent::PathFound { start, goal, route } => {
                let (found, path, cost) = match route {
                    Some(Route { nodes, cost }) => (true, nodes, cost),
                    None => (false, Vec::new(), 0.0),
                };
                Wire::PathFound(schema::PathFound {
                    start,
                    goal,
                    found,
                    path,
                    cost,
                })
            }
        };
        Self {
            command: Some(command),
        }
    }
}

impl From<to_client_command::Command> for OutboundEvent {
    fn from(command: to_client_command::Command) -> Self {
        use to_client_command::Command as Wire;
        match command {
            Wire::NodeAdded(m) => Self::NodeAdded {
                id: m.id,
                x: m.x,
                y: m.y,
            },
            Wire::NodeRemoved(m) => Self::NodeRemoved { id: m.id },
            Wire::ConnectionAdded(m) => Self::ConnectionAdded {
                id1: m.id1,
                id2: m.id2,
            },
            Wire::ConnectionRemoved(m) => Self::ConnectionRemoved {
                id1: m.id1,
                id2: m.id2,
            },
            Wire::PathFound(m) => Self::PathFound {
                start: m.start,
                goal: m.goal,
                route: m.found.then_some(Route {
                    nodes: m.path,
                    cost: m.cost,
                }),
            },
        }
    }
}
