//! Graph mutation handlers.
//!
//! A [`SessionGraph`] pairs one path-search engine with the [`GraphRegistry`]
//! that names its nodes for the client. Every handler runs to completion
//! without suspending and reports back only by queueing events.
//!
//! Commands that reference unknown IDs or carry invalid arguments are
//! logged and ignored; they leave the graph untouched and queue nothing.

pub mod registry;

use pathway_proto::{Command, OutboundEvent, Route};
use pathway_search::{NodeHandle, PathSearch, Position, SearchError};
use tracing::{debug, warn};

use crate::errors::{Result, SessionError};
use crate::session::Outbox;

pub use registry::{GraphRegistry, NodeId};

/// Outcome of applying one inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The command took effect and its acknowledgment was queued.
    Applied,
    /// The message was dropped without side effects.
    Ignored(IgnoreReason),
}

/// Why a message was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// The payload was not a valid protobuf envelope.
    Malformed,
    /// The envelope carried no command.
    Unset,
    /// A referenced node ID is not registered.
    UnknownNode,
    /// A connection from a node to itself.
    SelfLoop,
    /// A coordinate was NaN or infinite.
    NonFiniteCoordinate,
}

impl IgnoreReason {
    /// Metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Unset => "unset",
            Self::UnknownNode => "unknown_node",
            Self::SelfLoop => "self_loop",
            Self::NonFiniteCoordinate => "non_finite_coordinate",
        }
    }
}

/// One session's graph: engine plus ID registry.
pub struct SessionGraph {
    engine: Box<dyn PathSearch>,
    registry: GraphRegistry,
}

impl SessionGraph {
    /// Wrap an empty engine.
    pub fn new(engine: Box<dyn PathSearch>) -> Self {
        Self {
            engine,
            registry: GraphRegistry::new(),
        }
    }

    /// The ID registry.
    pub fn registry(&self) -> &GraphRegistry {
        &self.registry
    }

    /// The underlying engine.
    pub fn engine(&self) -> &dyn PathSearch {
        self.engine.as_ref()
    }

    /// Route `command` to its handler.
    pub fn apply(&mut self, command: Command, outbox: &mut Outbox) -> Result<Dispatch> {
        match command {
            Command::AddNode { x, y } => self.add_node(x, y, outbox),
            Command::RemoveNode { id } => self.remove_node(id, outbox),
            Command::AddConnection { id1, id2 } => self.add_connection(id1, id2, outbox),
            Command::RemoveConnection { id1, id2 } => self.remove_connection(id1, id2, outbox),
            Command::FindPath { start, goal } => self.find_path(start, goal, outbox),
            Command::Unset => {
                debug!("envelope without command, ignoring");
                Ok(Dispatch::Ignored(IgnoreReason::Unset))
            }
        }
    }

    /// Create a node at `(x, y)` under the lowest unused ID.
    pub fn add_node(&mut self, x: f32, y: f32, outbox: &mut Outbox) -> Result<Dispatch> {
        let position = Position::new(x, y);
        if !position.is_finite() {
            warn!(x, y, "add_node with non-finite coordinate, ignoring");
            return Ok(Dispatch::Ignored(IgnoreReason::NonFiniteCoordinate));
        }

        let handle = self.engine.create_node(position)?;
        let Some(id) = self.registry.insert(handle) else {
            self.engine.destroy_node(handle)?;
            return Err(SessionError::IdsExhausted);
        };

        debug!(id, x, y, node = %handle, "node added");
        outbox.push(OutboundEvent::NodeAdded { id, x, y });
        Ok(Dispatch::Applied)
    }

    /// Destroy node `id` and every edge touching it.
    pub fn remove_node(&mut self, id: NodeId, outbox: &mut Outbox) -> Result<Dispatch> {
        let Some(handle) = self.registry.get(id) else {
            warn!(id, "remove_node for unknown id, ignoring");
            return Ok(Dispatch::Ignored(IgnoreReason::UnknownNode));
        };

        self.engine.destroy_node(handle)?;
        let _ = self.registry.remove(id);

        debug!(id, node = %handle, "node removed");
        outbox.push(OutboundEvent::NodeRemoved { id });
        Ok(Dispatch::Applied)
    }

    /// Connect `id1` and `id2`. Re-linking a connected pair is acknowledged
    /// again without adding a second edge.
    pub fn add_connection(
        &mut self,
        id1: NodeId,
        id2: NodeId,
        outbox: &mut Outbox,
    ) -> Result<Dispatch> {
        let (a, b) = match self.resolve_pair("add_connection", id1, id2) {
            Ok(pair) => pair,
            Err(reason) => return Ok(Dispatch::Ignored(reason)),
        };

        self.engine.link(a, b)?;

        debug!(id1, id2, "connection added");
        outbox.push(OutboundEvent::ConnectionAdded { id1, id2 });
        Ok(Dispatch::Applied)
    }

    /// Disconnect `id1` and `id2`. Removing an absent edge is acknowledged.
    pub fn remove_connection(
        &mut self,
        id1: NodeId,
        id2: NodeId,
        outbox: &mut Outbox,
    ) -> Result<Dispatch> {
        let (a, b) = match self.resolve_pair("remove_connection", id1, id2) {
            Ok(pair) => pair,
            Err(reason) => return Ok(Dispatch::Ignored(reason)),
        };

        self.engine.unlink(a, b)?;

        debug!(id1, id2, "connection removed");
        outbox.push(OutboundEvent::ConnectionRemoved { id1, id2 });
        Ok(Dispatch::Applied)
    }

    /// Search for the cheapest path from `start` to `goal`.
    pub fn find_path(
        &mut self,
        start: NodeId,
        goal: NodeId,
        outbox: &mut Outbox,
    ) -> Result<Dispatch> {
        let (Some(from), Some(to)) = (self.registry.get(start), self.registry.get(goal)) else {
            warn!(start, goal, "find_path for unknown id, ignoring");
            return Ok(Dispatch::Ignored(IgnoreReason::UnknownNode));
        };

        let route = match self.engine.find_path(from, to)? {
            Some(path) => {
                let nodes = path
                    .nodes
                    .iter()
                    .map(|&handle| self.id_for(handle))
                    .collect::<Result<Vec<_>>>()?;
                Some(Route {
                    nodes,
                    cost: path.cost,
                })
            }
            None => None,
        };

        debug!(start, goal, found = route.is_some(), "path search finished");
        outbox.push(OutboundEvent::PathFound { start, goal, route });
        Ok(Dispatch::Applied)
    }

    /// Destroy every node this graph created. Returns how many were released.
    pub fn teardown(&mut self) -> usize {
        let entries = self.registry.drain();
        let released = entries.len();
        for (id, handle) in entries {
            if let Err(error) = self.engine.destroy_node(handle) {
                warn!(id, node = %handle, %error, "failed to release node during teardown");
            }
        }
        released
    }

    fn resolve_pair(
        &self,
        op: &'static str,
        id1: NodeId,
        id2: NodeId,
    ) -> std::result::Result<(NodeHandle, NodeHandle), IgnoreReason> {
        let (Some(a), Some(b)) = (self.registry.get(id1), self.registry.get(id2)) else {
            warn!(op, id1, id2, "unknown node id, ignoring");
            return Err(IgnoreReason::UnknownNode);
        };
        if a == b {
            warn!(op, id = id1, "connection from a node to itself, ignoring");
            return Err(IgnoreReason::SelfLoop);
        }
        Ok((a, b))
    }

    fn id_for(&self, handle: NodeHandle) -> Result<NodeId> {
        self.registry
            .id_of(handle)
            .ok_or(SessionError::Engine(SearchError::UnknownHandle(handle)))
    }
}
