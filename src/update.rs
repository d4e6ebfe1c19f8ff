use crate::dec::{EdgeKey, NodeKey};
use crate::graph::GraphKey;

/// The buffered (node-add, node-remove, edge-add, edge-remove) event
/// sequences flowing between consecutive levels.
///
/// Events carry keys; entity data is read from the producing level's graph
/// at consumption time. The consumer replays in the canonical order
/// E⁻, V⁻, V⁺, E⁺: removals first with edges before their endpoint nodes,
/// then additions with endpoint nodes before edges.
///
/// Journalling is net-change: an entity created and destroyed within the
/// same pass cancels out instead of surfacing as an add/remove pair.
#[derive(Clone, Debug)]
pub struct UpdateQuadruple<K: GraphKey> {
    added_nodes: Vec<NodeKey<K>>,
    removed_nodes: Vec<NodeKey<K>>,
    added_edges: Vec<EdgeKey<K>>,
    removed_edges: Vec<EdgeKey<K>>,
}

impl<K: GraphKey> Default for UpdateQuadruple<K> {
    fn default() -> Self {
        Self {
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            added_edges: Vec::new(),
            removed_edges: Vec::new(),
        }
    }
}

impl<K: GraphKey> UpdateQuadruple<K> {
    /// Nodes added since the last propagation, in enqueue order.
    pub fn added_nodes(&self) -> &[NodeKey<K>] {
        &self.added_nodes
    }

    /// Nodes removed since the last propagation, in enqueue order.
    pub fn removed_nodes(&self) -> &[NodeKey<K>] {
        &self.removed_nodes
    }

    /// Edges added since the last propagation, in enqueue order.
    pub fn added_edges(&self) -> &[EdgeKey<K>] {
        &self.added_edges
    }

    /// Edges removed since the last propagation, in enqueue order.
    pub fn removed_edges(&self) -> &[EdgeKey<K>] {
        &self.removed_edges
    }

    /// Return `true` if nothing is buffered. Doubles as the per-level
    /// clean flag for lazy propagation.
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
    }

    /// Take the buffered events, leaving the quadruple empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub(crate) fn push_added_node(&mut self, n: NodeKey<K>) {
        if let Some(at) = self.removed_nodes.iter().position(|&x| x == n) {
            // removed and re-added within one pass: net nothing
            self.removed_nodes.remove(at);
            return;
        }
        debug_assert!(!self.added_nodes.contains(&n), "duplicate node addition");
        self.added_nodes.push(n);
    }

    pub(crate) fn push_removed_node(&mut self, n: NodeKey<K>) {
        if let Some(at) = self.added_nodes.iter().position(|&x| x == n) {
            // added and removed within one pass: net nothing
            self.added_nodes.remove(at);
            return;
        }
        debug_assert!(!self.removed_nodes.contains(&n), "duplicate node removal");
        self.removed_nodes.push(n);
    }

    pub(crate) fn push_added_edge(&mut self, e: EdgeKey<K>) {
        if let Some(at) = self.removed_edges.iter().position(|&x| x == e) {
            self.removed_edges.remove(at);
            return;
        }
        debug_assert!(!self.added_edges.contains(&e), "duplicate edge addition");
        self.added_edges.push(e);
    }

    pub(crate) fn push_removed_edge(&mut self, e: EdgeKey<K>) {
        if let Some(at) = self.added_edges.iter().position(|&x| x == e) {
            self.added_edges.remove(at);
            return;
        }
        debug_assert!(!self.removed_edges.contains(&e), "duplicate edge removal");
        self.removed_edges.push(e);
    }

    /// Total number of buffered events.
    pub fn len(&self) -> usize {
        self.added_nodes.len()
            + self.removed_nodes.len()
            + self.added_edges.len()
            + self.removed_edges.len()
    }
}
