//! Protobuf message definitions.
//!
//! Declared with `prost` derives instead of build-time generation. Field tags
//! are part of the wire contract with the browser editor; never renumber them.

#![allow(missing_docs)]

/// Client request: place a waypoint.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct AddNode {
    #[prost(float, tag = "1")]
    pub x: f32,
    #[prost(float, tag = "2")]
    pub y: f32,
}

/// Client request: delete a waypoint and its edges.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct RemoveNode {
    #[prost(uint32, tag = "1")]
    pub id: u32,
}

/// Client request: connect two waypoints.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct AddConnection {
    #[prost(uint32, tag = "1")]
    pub id1: u32,
    #[prost(uint32, tag = "2")]
    pub id2: u32,
}

/// Client request: disconnect two waypoints.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct RemoveConnection {
    #[prost(uint32, tag = "1")]
    pub id1: u32,
    #[prost(uint32, tag = "2")]
    pub id2: u32,
}

/// Client request: shortest path between two waypoints.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct FindPath {
    #[prost(uint32, tag = "1")]
    pub start: u32,
    #[prost(uint32, tag = "2")]
    pub goal: u32,
}

/// Envelope for every client → server frame.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ToServerCommand {
    #[prost(oneof = "to_server_command::Command", tags = "1, 2, 3, 4, 5")]
    pub command: Option<to_server_command::Command>,
}

/// Nested types for [`ToServerCommand`].
pub mod to_server_command {
    /// The request carried by a [`ToServerCommand`](super::ToServerCommand).
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Command {
        #[prost(message, tag = "1")]
        AddNode(super::AddNode),
        #[prost(message, tag = "2")]
        RemoveNode(super::RemoveNode),
        #[prost(message, tag = "3")]
        AddConnection(super::AddConnection),
        #[prost(message, tag = "4")]
        RemoveConnection(super::RemoveConnection),
        #[prost(message, tag = "5")]
        FindPath(super::FindPath),
    }
}

/// Server event: a waypoint was placed.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct NodeAdded {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(float, tag = "2")]
    pub x: f32,
    #[prost(float, tag = "3")]
    pub y: f32,
}

/// Server event: a waypoint was deleted.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct NodeRemoved {
    #[prost(uint32, tag = "1")]
    pub id: u32,
}

/// Server event: two waypoints were connected.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct ConnectionAdded {
    #[prost(uint32, tag = "1")]
    pub id1: u32,
    #[prost(uint32, tag = "2")]
    pub id2: u32,
}

/// Server event: two waypoints were disconnected.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct ConnectionRemoved {
    #[prost(uint32, tag = "1")]
    pub id1: u32,
    #[prost(uint32, tag = "2")]
    pub id2: u32,
}

/// Server event: result of a path search.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PathFound {
    #[prost(uint32, tag = "1")]
    pub start: u32,
    #[prost(uint32, tag = "2")]
    pub goal: u32,
    #[prost(bool, tag = "3")]
    pub found: bool,
    #[prost(uint32, repeated, tag = "4")]
    pub path: Vec<u32>,
    #[prost(float, tag = "5")]
    pub cost: f32,
}

/// Envelope for every server → client frame.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ToClientCommand {
    #[prost(oneof = "to_client_command::Command", tags = "1, 2, 3, 4, 5")]
    pub command: Option<to_client_command::Command>,
}

/// Nested types for [`ToClientCommand`].
pub mod to_client_command {
    /// The event carried by a [`ToClientCommand`](super::ToClientCommand).
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Command {
        #[prost(message, tag = "1")]
        NodeAdded(super::NodeAdded),
        #[prost(message, tag = "2")]
        NodeRemoved(super::NodeRemoved),
        #[prost(message, tag = "3")]
        ConnectionAdded(super::ConnectionAdded),
        #[prost(message, tag = "4")]
        ConnectionRemoved(super::ConnectionRemoved),
        #[prost(message, tag = "5")]
        PathFound(super::PathFound),
    }
}
