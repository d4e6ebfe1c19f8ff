use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};

use crate::attr::Attrs;
use crate::comp::CompId;
use crate::error::PreconditionViolation;
use crate::graph::{DiGraph, Direction, GraphKey};

/// The key of a node within one level's [DecGraph].
///
/// Keys are unique among siblings within one graph; a node of key `Base(1)`
/// may itself contain a node of key `Base(1)` one level down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey<K: GraphKey> {
    /// A node of the base graph, keyed by the caller.
    Base(K),
    /// A supernode allocated from a component set id.
    Comp(CompId),
}

impl<K: GraphKey> NodeKey<K> {
    /// The base key, if this is a level-0 node.
    pub fn as_base(self) -> Option<K> {
        if let Self::Base(k) = self { Some(k) } else { None }
    }

    /// The component set id, if this is a contracted supernode.
    pub fn as_comp(self) -> Option<CompId> {
        if let Self::Comp(id) = self { Some(id) } else { None }
    }
}

/// The key of an edge: its (tail, head) node keys.
pub type EdgeKey<K> = (NodeKey<K>, NodeKey<K>);

pub(crate) fn fmt_key<K: GraphKey>(k: NodeKey<K>) -> String {
    format!("{k:?}")
}

pub(crate) fn fmt_edge<K: GraphKey>(e: EdgeKey<K>) -> String {
    format!("{:?} -> {:?}", e.0, e.1)
}

/// The interior graph of a [Supernode]: the subgraph of the level below
/// induced by the nodes this supernode contracts, stored as key sets
/// resolved against the lower level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteriorGraph<K: GraphKey> {
    nodes: IndexSet<NodeKey<K>>,
    edges: IndexSet<EdgeKey<K>>,
}

impl<K: GraphKey> Default for InteriorGraph<K> {
    fn default() -> Self {
        Self {
            nodes: IndexSet::new(),
            edges: IndexSet::new(),
        }
    }
}

impl<K: GraphKey> InteriorGraph<K> {
    /// The contained lower-level node keys.
    pub fn nodes(&self) -> &IndexSet<NodeKey<K>> {
        &self.nodes
    }

    /// The contained lower-level edge keys.
    pub fn edges(&self) -> &IndexSet<EdgeKey<K>> {
        &self.edges
    }

    /// Return `true` if the lower-level node `n` is contained.
    pub fn contains_node(&self, n: NodeKey<K>) -> bool {
        self.nodes.contains(&n)
    }

    /// Return `true` if the lower-level edge `e` is contained.
    pub fn contains_edge(&self, e: EdgeKey<K>) -> bool {
        self.edges.contains(&e)
    }

    /// Number of contained nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of contained edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Return `true` if nothing is contained.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// A plain directed-graph view of the interior, for algorithms.
    pub fn to_digraph(&self) -> DiGraph<NodeKey<K>> {
        let mut g = DiGraph::default();
        for &n in &self.nodes {
            g.add_node(n);
        }
        for &(a, b) in &self.edges {
            g.add_edge(a, b);
        }
        g
    }

    pub(crate) fn insert_node(&mut self, n: NodeKey<K>) {
        self.nodes.insert(n);
    }

    pub(crate) fn remove_node(&mut self, n: NodeKey<K>) {
        self.nodes.shift_remove(&n);
    }

    pub(crate) fn insert_edge(&mut self, e: EdgeKey<K>) {
        self.edges.insert(e);
    }

    pub(crate) fn remove_edge(&mut self, e: EdgeKey<K>) {
        self.edges.shift_remove(&e);
    }
}

/// A node of a [DecGraph]: carries the interior graph it contracts, the
/// non-owning key of its home supernode one level up, and the ids of the
/// upper-level component sets containing it.
#[derive(Clone, Debug)]
pub struct Supernode<K: GraphKey> {
    key: NodeKey<K>,
    level: usize,
    dec: InteriorGraph<K>,
    supernode: Option<NodeKey<K>>,
    component_sets: BTreeSet<CompId>,
    attrs: Attrs,
}

impl<K: GraphKey> Supernode<K> {
    pub(crate) fn new(key: NodeKey<K>, level: usize) -> Self {
        Self {
            key,
            level,
            dec: InteriorGraph::default(),
            supernode: None,
            component_sets: BTreeSet::new(),
            attrs: Attrs::default(),
        }
    }

    pub(crate) fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// This node's key, unique within its graph.
    pub fn key(&self) -> NodeKey<K> {
        self.key
    }

    /// The level this node lives at (0 is the base).
    pub fn level(&self) -> usize {
        self.level
    }

    /// The interior graph (empty for level-0 nodes).
    pub fn dec(&self) -> &InteriorGraph<K> {
        &self.dec
    }

    pub(crate) fn dec_mut(&mut self) -> &mut InteriorGraph<K> {
        &mut self.dec
    }

    /// The key of the home supernode one level up, if contracted.
    pub fn supernode(&self) -> Option<NodeKey<K>> {
        self.supernode
    }

    pub(crate) fn set_supernode(&mut self, key: Option<NodeKey<K>>) {
        self.supernode = key;
    }

    /// Ids of the upper-level component sets containing this node, sorted.
    pub fn component_sets(&self) -> &BTreeSet<CompId> {
        &self.component_sets
    }

    pub(crate) fn set_component_sets(&mut self, sets: BTreeSet<CompId>) {
        self.component_sets = sets;
    }

    /// The user attribute bag.
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    #[allow(missing_docs, reason = "obvious")]
    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    /// Convenience lookup into the attribute bag.
    pub fn attr(&self, name: &str) -> Option<&crate::attr::AttrValue> {
        self.attrs.get(name)
    }
}

/// An edge of a [DecGraph], aggregating the lower-level edges whose
/// endpoints contract into its tail and head.
#[derive(Clone, Debug)]
pub struct Superedge<K: GraphKey> {
    tail: NodeKey<K>,
    head: NodeKey<K>,
    level: usize,
    dec: IndexSet<EdgeKey<K>>,
    attrs: Attrs,
}

impl<K: GraphKey> Superedge<K> {
    pub(crate) fn new(tail: NodeKey<K>, head: NodeKey<K>, level: usize) -> Self {
        Self {
            tail,
            head,
            level,
            dec: IndexSet::new(),
            attrs: Attrs::default(),
        }
    }

    pub(crate) fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// The tail node key.
    pub fn tail(&self) -> NodeKey<K> {
        self.tail
    }

    /// The head node key.
    pub fn head(&self) -> NodeKey<K> {
        self.head
    }

    /// The (tail, head) edge key.
    pub fn key(&self) -> EdgeKey<K> {
        (self.tail, self.head)
    }

    /// The level this edge lives at.
    pub fn level(&self) -> usize {
        self.level
    }

    /// The keys of the aggregated lower-level edges (empty at level 0).
    pub fn dec(&self) -> &IndexSet<EdgeKey<K>> {
        &self.dec
    }

    pub(crate) fn dec_mut(&mut self) -> &mut IndexSet<EdgeKey<K>> {
        &mut self.dec
    }

    /// The user attribute bag.
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    #[allow(missing_docs, reason = "obvious")]
    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    pub(crate) fn set_attrs(&mut self, attrs: Attrs) {
        self.attrs = attrs;
    }
}

/// One level of the hierarchy: a directed graph whose nodes and edges carry
/// interior graphs referring one level down.
///
/// Node and edge tables are insertion-ordered; an adjacency table mirrors
/// the edge set so incidence checks are constant-time.
#[derive(Clone, Debug)]
pub struct DecGraph<K: GraphKey> {
    level: usize,
    nodes: IndexMap<NodeKey<K>, Supernode<K>>,
    edges: IndexMap<EdgeKey<K>, Superedge<K>>,
    adj: IndexMap<NodeKey<K>, Vec<(NodeKey<K>, Direction)>>,
}

impl<K: GraphKey> Default for DecGraph<K> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K: GraphKey> DecGraph<K> {
    /// Create an empty graph at the given level.
    pub fn new(level: usize) -> Self {
        Self {
            level,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            adj: IndexMap::new(),
        }
    }

    /// The level this graph describes (0 is the base).
    pub fn level(&self) -> usize {
        self.level
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Return `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node.
    ///
    /// Rejects a key already present at this level.
    pub fn add_node(&mut self, node: Supernode<K>) -> Result<(), PreconditionViolation> {
        if self.nodes.contains_key(&node.key()) {
            return Err(PreconditionViolation::DuplicateNode(fmt_key(node.key())));
        }
        self.adj.entry(node.key()).or_default();
        self.nodes.insert(node.key(), node);
        Ok(())
    }

    /// Remove a node, returning it.
    ///
    /// The caller must have drained incident edges first.
    pub fn remove_node(&mut self, key: NodeKey<K>) -> Result<Supernode<K>, PreconditionViolation> {
        if !self.nodes.contains_key(&key) {
            return Err(PreconditionViolation::UnknownNode(fmt_key(key)));
        }
        if self.adj.get(&key).is_some_and(|links| !links.is_empty()) {
            return Err(PreconditionViolation::NodeHasEdges(fmt_key(key)));
        }
        self.adj.shift_remove(&key);
        Ok(self.nodes.shift_remove(&key).unwrap())
    }

    /// Add an edge.
    ///
    /// Rejects missing endpoints and duplicate ordered pairs; self-loops are
    /// allowed.
    pub fn add_edge(&mut self, edge: Superedge<K>) -> Result<(), PreconditionViolation> {
        let (tail, head) = edge.key();
        if !self.nodes.contains_key(&tail) {
            return Err(PreconditionViolation::UnknownNode(fmt_key(tail)));
        }
        if !self.nodes.contains_key(&head) {
            return Err(PreconditionViolation::UnknownNode(fmt_key(head)));
        }
        if self.edges.contains_key(&(tail, head)) {
            return Err(PreconditionViolation::DuplicateEdge(fmt_edge((tail, head))));
        }
        self.adj
            .entry(tail)
            .or_default()
            .push((head, Direction::Outgoing));
        if tail != head {
            // self loops don't have the Incoming entry
            self.adj
                .entry(head)
                .or_default()
                .push((tail, Direction::Incoming));
        }
        self.edges.insert((tail, head), edge);
        Ok(())
    }

    /// Remove an edge, returning it.
    pub fn remove_edge(&mut self, key: EdgeKey<K>) -> Result<Superedge<K>, PreconditionViolation> {
        let Some(edge) = self.edges.shift_remove(&key) else {
            return Err(PreconditionViolation::UnknownEdge(fmt_edge(key)));
        };
        let (tail, head) = key;
        self.remove_adj(tail, head, Direction::Outgoing);
        if tail != head {
            self.remove_adj(head, tail, Direction::Incoming);
        }
        Ok(edge)
    }

    fn remove_adj(&mut self, a: NodeKey<K>, b: NodeKey<K>, dir: Direction) {
        if let Some(links) = self.adj.get_mut(&a) {
            if let Some(index) = links.iter().position(|&l| l == (b, dir)) {
                links.swap_remove(index);
            }
        }
    }

    /// Return `true` if a node with this key is present.
    pub fn contains_node(&self, key: NodeKey<K>) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Return `true` if an edge with this key is present.
    pub fn contains_edge(&self, key: EdgeKey<K>) -> bool {
        self.edges.contains_key(&key)
    }

    /// Look up a node.
    pub fn node(&self, key: NodeKey<K>) -> Option<&Supernode<K>> {
        self.nodes.get(&key)
    }

    pub(crate) fn node_mut(&mut self, key: NodeKey<K>) -> Option<&mut Supernode<K>> {
        self.nodes.get_mut(&key)
    }

    /// Look up an edge.
    pub fn edge(&self, key: EdgeKey<K>) -> Option<&Superedge<K>> {
        self.edges.get(&key)
    }

    pub(crate) fn edge_mut(&mut self, key: EdgeKey<K>) -> Option<&mut Superedge<K>> {
        self.edges.get_mut(&key)
    }

    /// Iterate over the nodes in insertion order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Supernode<K>> + '_ {
        self.nodes.values()
    }

    /// Iterate over the node keys in insertion order.
    pub fn node_keys(&self) -> impl ExactSizeIterator<Item = NodeKey<K>> + '_ {
        self.nodes.keys().copied()
    }

    /// Iterate over the edges in insertion order.
    pub fn edges(&self) -> impl ExactSizeIterator<Item = &Superedge<K>> + '_ {
        self.edges.values()
    }

    /// Iterate over the edge keys in insertion order.
    pub fn edge_keys(&self) -> impl ExactSizeIterator<Item = EdgeKey<K>> + '_ {
        self.edges.keys().copied()
    }

    /// Return `true` if the node has at least one incident edge.
    pub fn has_incident_edges(&self, key: NodeKey<K>) -> bool {
        self.adj.get(&key).is_some_and(|links| !links.is_empty())
    }

    /// The keys of every edge incident to `key`, both directions, self-loops
    /// listed once.
    pub fn edges_of(&self, key: NodeKey<K>) -> Vec<EdgeKey<K>> {
        let Some(links) = self.adj.get(&key) else {
            return vec![];
        };
        links
            .iter()
            .map(|&(other, dir)| {
                if dir == Direction::Outgoing {
                    (key, other)
                } else {
                    (other, key)
                }
            })
            .collect()
    }

    /// A plain directed-graph view of this level (keys only), for
    /// algorithms. The snapshot shares no state with the graph.
    pub fn graph(&self) -> DiGraph<NodeKey<K>> {
        let mut g = DiGraph::default();
        for key in self.nodes.keys() {
            g.add_node(*key);
        }
        for key in self.edges.keys() {
            g.add_edge(key.0, key.1);
        }
        g
    }
}

/// Structural equality: node keys with their interiors, edge keys with
/// their decontractions. Attribute bags, back-pointers, and component-set
/// memberships are ignored.
impl<K: GraphKey> PartialEq for DecGraph<K> {
    fn eq(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() || self.edges.len() != other.edges.len() {
            return false;
        }
        self.nodes.iter().all(|(key, node)| {
            other
                .nodes
                .get(key)
                .is_some_and(|theirs| node.dec == theirs.dec)
        }) && self.edges.iter().all(|(key, edge)| {
            other
                .edges
                .get(key)
                .is_some_and(|theirs| edge.dec == theirs.dec)
        })
    }
}
impl<K: GraphKey> Eq for DecGraph<K> {}

impl<K: GraphKey> Hash for DecGraph<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash over sorted keys only: a subset of the equality fields, so
        // equal graphs hash equally regardless of insertion order.
        let mut node_keys: Vec<_> = self.nodes.keys().copied().collect();
        node_keys.sort_unstable();
        node_keys.hash(state);
        let mut edge_keys: Vec<_> = self.edges.keys().copied().collect();
        edge_keys.sort_unstable();
        edge_keys.hash(state);
    }
}
