//! Arena-backed waypoint graph with A* search.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use ordered_float::OrderedFloat;
use tracing::trace;

use crate::engine::{NodeHandle, PathSearch, SearchPath};
use crate::errors::{Result, SearchError};
use crate::geometry::{CostModel, Euclidean, Position};

struct NodeData {
    position: Position,
    neighbors: Vec<NodeHandle>,
}

struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

/// In-memory waypoint graph.
///
/// Nodes live in a slot arena; destroyed slots are recycled with a bumped
/// generation. Adjacency is stored per node and kept symmetric.
pub struct AStarEngine<M = Euclidean> {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    cost_model: M,
}

impl AStarEngine<Euclidean> {
    /// Create an empty engine using Euclidean costs.
    pub fn new() -> Self {
        Self::with_cost_model(Euclidean)
    }
}

impl Default for AStarEngine<Euclidean> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: CostModel> AStarEngine<M> {
    /// Create an empty engine using `cost_model` for edge costs and the
    /// search heuristic.
    pub fn with_cost_model(cost_model: M) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            cost_model,
        }
    }

    fn node(&self, handle: NodeHandle) -> Result<&NodeData> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(SearchError::UnknownHandle(handle))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut NodeData> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(SearchError::UnknownHandle(handle))
    }

    fn edge_cost(&self, from: NodeHandle, to: NodeHandle) -> Result<f64> {
        let from = self.node(from)?.position;
        let to = self.node(to)?.position;
        Ok(self.cost_model.cost(from, to))
    }
}

impl<M: CostModel> PathSearch for AStarEngine<M> {
    fn create_node(&mut self, position: Position) -> Result<NodeHandle> {
        if !position.is_finite() {
            return Err(SearchError::NonFinitePosition {
                x: position.x,
                y: position.y,
            });
        }

        let node = NodeData {
            position,
            neighbors: Vec::new(),
        };

        let handle = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeHandle::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).map_err(|_| SearchError::Exhausted)?;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeHandle::new(index, 0)
        };

        self.live += 1;
        trace!(node = %handle, x = position.x, y = position.y, "node created");
        Ok(handle)
    }

    fn destroy_node(&mut self, node: NodeHandle) -> Result<()> {
        let neighbors = std::mem::take(&mut self.node_mut(node)?.neighbors);
        for neighbor in neighbors {
            if let Ok(data) = self.node_mut(neighbor) {
                data.neighbors.retain(|n| *n != node);
            }
        }

        let slot = &mut self.slots[node.index()];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        #[allow(clippy::cast_possible_truncation)]
        self.free.push(node.index() as u32);
        self.live -= 1;
        trace!(node = %node, "node destroyed");
        Ok(())
    }

    fn link(&mut self, a: NodeHandle, b: NodeHandle) -> Result<()> {
        if a == b {
            return Err(SearchError::SelfLink(a));
        }
        // Validate both before mutating either side.
        let _ = self.node(b)?;
        let node_a = self.node_mut(a)?;
        if !node_a.neighbors.contains(&b) {
            node_a.neighbors.push(b);
        }
        let node_b = self.node_mut(b)?;
        if !node_b.neighbors.contains(&a) {
            node_b.neighbors.push(a);
        }
        Ok(())
    }

    fn unlink(&mut self, a: NodeHandle, b: NodeHandle) -> Result<()> {
        let _ = self.node(b)?;
        self.node_mut(a)?.neighbors.retain(|n| *n != b);
        self.node_mut(b)?.neighbors.retain(|n| *n != a);
        Ok(())
    }

    fn cost_to(&self, from: NodeHandle, to: NodeHandle) -> Result<f64> {
        self.edge_cost(from, to)
    }

    fn find_path(&self, start: NodeHandle, goal: NodeHandle) -> Result<Option<SearchPath>> {
        let _ = self.node(start)?;
        let goal_position = self.node(goal)?.position;

        let mut open = BinaryHeap::new();
        let mut best: HashMap<NodeHandle, f64> = HashMap::new();
        let mut came_from: HashMap<NodeHandle, NodeHandle> = HashMap::new();
        let mut closed: HashSet<NodeHandle> = HashSet::new();

        let _ = best.insert(start, 0.0);
        let start_estimate = self
            .cost_model
            .estimate(self.node(start)?.position, goal_position);
        open.push(Reverse((OrderedFloat(start_estimate), start)));

        while let Some(Reverse((_, current))) = open.pop() {
            if current == goal {
                let cost = best.get(&goal).copied().unwrap_or_default();
                let mut nodes = vec![goal];
                let mut cursor = goal;
                while let Some(&previous) = came_from.get(&cursor) {
                    nodes.push(previous);
                    cursor = previous;
                }
                nodes.reverse();
                trace!(%start, %goal, hops = nodes.len() - 1, cost, "path found");
                #[allow(clippy::cast_possible_truncation)]
                let cost = cost as f32;
                return Ok(Some(SearchPath { nodes, cost }));
            }
            if !closed.insert(current) {
                continue;
            }

            let current_cost = best.get(&current).copied().unwrap_or(f64::INFINITY);
            let node = self.node(current)?;
            for &next in &node.neighbors {
                if closed.contains(&next) {
                    continue;
                }
                let next_position = self.node(next)?.position;
                let tentative = current_cost + self.cost_model.cost(node.position, next_position);
                if tentative < best.get(&next).copied().unwrap_or(f64::INFINITY) {
                    let _ = best.insert(next, tentative);
                    let _ = came_from.insert(next, current);
                    let priority = tentative + self.cost_model.estimate(next_position, goal_position);
                    open.push(Reverse((OrderedFloat(priority), next)));
                }
            }
        }

        trace!(%start, %goal, explored = closed.len(), "no path");
        Ok(None)
    }

    fn position(&self, node: NodeHandle) -> Result<Position> {
        Ok(self.node(node)?.position)
    }

    fn neighbors(&self, node: NodeHandle) -> Result<Vec<NodeHandle>> {
        Ok(self.node(node)?.neighbors.clone())
    }

    fn len(&self) -> usize {
        self.live
    }
}
