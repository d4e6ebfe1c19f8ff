use crate::dec::{DecGraph, EdgeKey, NodeKey};
use crate::graph::{DiGraph, GraphKey};

/// A lazily materialised plain mirror of the level below, for rules whose
/// algorithms must run on the flattened underlying graph.
///
/// The mirror is built from the lower graph on first use and maintained
/// incrementally through the event hooks afterwards, so handlers see the
/// flattened graph without re-deriving it per event.
#[derive(Clone, Debug)]
pub struct Decontraction<K: GraphKey> {
    graph: Option<DiGraph<NodeKey<K>>>,
}

impl<K: GraphKey> Default for Decontraction<K> {
    fn default() -> Self {
        Self { graph: None }
    }
}

impl<K: GraphKey> Decontraction<K> {
    /// Return `true` once the mirror has been materialised.
    pub fn materialized(&self) -> bool {
        self.graph.is_some()
    }

    /// Materialise from the lower graph if needed and return the mirror.
    pub fn ensure(&mut self, lower: &DecGraph<K>) -> &DiGraph<NodeKey<K>> {
        if self.graph.is_none() {
            self.graph = Some(lower.graph());
        }
        self.graph.as_ref().unwrap()
    }

    /// The mirror, if materialised.
    pub fn graph(&self) -> Option<&DiGraph<NodeKey<K>>> {
        self.graph.as_ref()
    }

    /// Drop the mirror; the next [ensure](Self::ensure) rebuilds it.
    pub fn clear(&mut self) {
        self.graph = None;
    }

    pub(crate) fn edge_added(&mut self, e: EdgeKey<K>) {
        if let Some(g) = self.graph.as_mut() {
            g.add_edge(e.0, e.1);
        }
    }

    pub(crate) fn edge_removed(&mut self, e: EdgeKey<K>) {
        if let Some(g) = self.graph.as_mut() {
            g.remove_edge(e.0, e.1);
        }
    }

    pub(crate) fn node_added(&mut self, n: NodeKey<K>) {
        if let Some(g) = self.graph.as_mut() {
            g.add_node(n);
        }
    }

    pub(crate) fn node_removed(&mut self, n: NodeKey<K>) {
        if let Some(g) = self.graph.as_mut() {
            g.remove_node(n);
        }
    }
}
