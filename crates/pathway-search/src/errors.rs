//! Search engine error types.

use thiserror::Error;

use crate::engine::NodeHandle;

/// Errors raised by a [`PathSearch`](crate::PathSearch) implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The handle does not refer to a live node (never created, or destroyed).
    #[error("unknown node handle {0}")]
    UnknownHandle(NodeHandle),
    /// Node positions must be finite.
    #[error("non-finite node position ({x}, {y})")]
    NonFinitePosition {
        /// Rejected x coordinate.
        x: f32,
        /// Rejected y coordinate.
        y: f32,
    },
    /// A node cannot be linked to itself.
    #[error("cannot link node {0} to itself")]
    SelfLink(NodeHandle),
    /// The node arena has no more addressable slots.
    #[error("node arena exhausted")]
    Exhausted,
}

/// Result type for search engine operations.
pub type Result<T> = std::result::Result<T, SearchError>;
