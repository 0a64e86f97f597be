//! Per-session mapping from client-visible node IDs to engine handles.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use pathway_search::NodeHandle;

/// Client-visible node identifier.
pub type NodeId = u32;

/// Bidirectional ID ↔ handle map with lowest-unused ID allocation.
///
/// IDs are allocated densely from 0. A removed ID goes onto a free list and
/// is handed out again before any ID above the high-water mark, so the next
/// ID is always the smallest one not currently registered.
#[derive(Debug, Default)]
pub struct GraphRegistry {
    nodes: BTreeMap<NodeId, NodeHandle>,
    ids: HashMap<NodeHandle, NodeId>,
    released: BTreeSet<NodeId>,
    high_water: u64,
}

impl GraphRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under the lowest unused ID.
    ///
    /// Returns `None` only when all `u32` IDs are taken.
    pub fn insert(&mut self, handle: NodeHandle) -> Option<NodeId> {
        let id = self.allocate()?;
        let _ = self.nodes.insert(id, handle);
        let _ = self.ids.insert(handle, id);
        Some(id)
    }

    /// Remove `id`, returning the handle it mapped to.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeHandle> {
        let handle = self.nodes.remove(&id)?;
        let _ = self.ids.remove(&handle);
        self.release(id);
        Some(handle)
    }

    /// Handle registered under `id`.
    pub fn get(&self, id: NodeId) -> Option<NodeHandle> {
        self.nodes.get(&id).copied()
    }

    /// ID registered for `handle`.
    pub fn id_of(&self, handle: NodeHandle) -> Option<NodeId> {
        self.ids.get(&handle).copied()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes are registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove every entry and reset allocation to 0.
    pub fn drain(&mut self) -> Vec<(NodeId, NodeHandle)> {
        let entries = std::mem::take(&mut self.nodes).into_iter().collect();
        self.ids.clear();
        self.released.clear();
        self.high_water = 0;
        entries
    }

    fn allocate(&mut self) -> Option<NodeId> {
        if let Some(id) = self.released.pop_first() {
            return Some(id);
        }
        let id = NodeId::try_from(self.high_water).ok()?;
        self.high_water += 1;
        Some(id)
    }

    fn release(&mut self, id: NodeId) {
        let _ = self.released.insert(id);
        // Released IDs at the top of the range shrink the high-water mark.
        while let Some(&top) = self.released.last() {
            if u64::from(top) + 1 != self.high_water {
                break;
            }
            let _ = self.released.pop_last();
            self.high_water -= 1;
        }
    }
}

#[cfg(test)]
impl GraphRegistry {
    fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn iter(&self) -> impl Iterator<Item = (NodeId, NodeHandle)> + '_ {
        self.nodes.iter().map(|(&id, &handle)| (id, handle))
    }
}
