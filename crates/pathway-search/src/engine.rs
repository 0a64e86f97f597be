//! The path-search capability contract.

use std::fmt;

use crate::errors::Result;
use crate::geometry::Position;

/// Opaque identity of a node owned by a [`PathSearch`] engine.
///
/// Handles are cheap to copy and carry a generation so a handle to a
/// destroyed node never aliases a node created later in the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle {
    index: u32,
    generation: u32,
}

impl NodeHandle {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) const fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A path returned by [`PathSearch::find_path`].
#[derive(Clone, Debug, PartialEq)]
pub struct SearchPath {
    /// Nodes from start to goal, both inclusive.
    pub nodes: Vec<NodeHandle>,
    /// Sum of edge costs along `nodes`, accumulated in `f64` and narrowed;
    /// may be infinite when the sum exceeds `f32::MAX`.
    pub cost: f32,
}

/// Capabilities a session needs from a path-search engine.
///
/// Edges are undirected: [`link`](Self::link) makes each node a neighbor of
/// the other and [`unlink`](Self::unlink) removes both directions.
pub trait PathSearch: Send {
    /// Create a node at `position`.
    fn create_node(&mut self, position: Position) -> Result<NodeHandle>;

    /// Destroy a node, unlinking it from every neighbor.
    fn destroy_node(&mut self, node: NodeHandle) -> Result<()>;

    /// Connect two nodes. Linking an already linked pair is a no-op.
    fn link(&mut self, a: NodeHandle, b: NodeHandle) -> Result<()>;

    /// Disconnect two nodes. Unlinking an absent edge is a no-op.
    fn unlink(&mut self, a: NodeHandle, b: NodeHandle) -> Result<()>;

    /// Cost between two nodes as evaluated by the engine's cost model.
    fn cost_to(&self, from: NodeHandle, to: NodeHandle) -> Result<f64>;

    /// Cheapest path from `start` to `goal`, or `None` when unreachable.
    fn find_path(&self, start: NodeHandle, goal: NodeHandle) -> Result<Option<SearchPath>>;

    /// Position of a node.
    fn position(&self, node: NodeHandle) -> Result<Position>;

    /// Current neighbors of a node.
    fn neighbors(&self, node: NodeHandle) -> Result<Vec<NodeHandle>>;

    /// Number of live nodes.
    fn len(&self) -> usize;

    /// Whether the engine holds no nodes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
