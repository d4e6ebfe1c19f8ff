use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;

use indexmap::IndexSet;
use tracing::debug;

use crate::attr::Attrs;
use crate::comp::ComponentSet;
use crate::dec::{DecGraph, EdgeKey, NodeKey, Superedge, Supernode};
use crate::error::{InvalidSchemeComposition, InvariantViolation, MlgError, PreconditionViolation};
use crate::graph::{DiGraph, GraphKey};
use crate::scheme::{self, ContractionScheme};
use crate::update::UpdateQuadruple;

/// A hierarchy of graph contractions over a base directed graph.
///
/// Level 0 is the base; each appended scheme derives the next level by
/// covering the one below with component sets and collapsing them into
/// supernodes. Base edits are buffered and pushed upward lazily: queries
/// for level *i* force propagation through levels 1..=i and no further.
#[derive(Debug)]
pub struct MultilevelGraph<K: GraphKey> {
    base: DecGraph<K>,
    base_out: UpdateQuadruple<K>,
    schemes: Vec<ContractionScheme<K>>,
}

impl<K: GraphKey> Default for MultilevelGraph<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: GraphKey> MultilevelGraph<K> {
    /// An empty hierarchy with an empty base graph and no schemes.
    pub fn new() -> Self {
        Self {
            base: DecGraph::new(0),
            base_out: UpdateQuadruple::default(),
            schemes: Vec::new(),
        }
    }

    /// Build a hierarchy from a plain node and edge listing (the input
    /// adapter). Duplicate keys and duplicate ordered pairs are rejected.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = (K, Attrs)>,
        edges: impl IntoIterator<Item = (K, K, Attrs)>,
    ) -> Result<Self, MlgError> {
        let mut this = Self::new();
        for (k, attrs) in nodes {
            this.add_node_with(k, attrs)?;
        }
        for (u, v, attrs) in edges {
            this.add_edge_with(u, v, attrs)?;
        }
        Ok(this)
    }

    /// Wrap a plain directed graph as a single-level [DecGraph]: every node
    /// becomes a level-0 supernode with an empty interior, every edge a
    /// level-0 superedge with an empty decontraction.
    pub fn natural_transformation(graph: &DiGraph<K>) -> DecGraph<K> {
        let mut base = DecGraph::new(0);
        for k in graph.nodes() {
            base.add_node(Supernode::new(NodeKey::Base(k), 0))
                .expect("plain graph keys are unique");
        }
        for (u, v) in graph.all_edges() {
            base.add_edge(Superedge::new(NodeKey::Base(u), NodeKey::Base(v), 0))
                .expect("plain graph edges connect existing nodes");
        }
        base
    }

    /// Append a contraction scheme on top of the hierarchy. The scheme is
    /// cloned unbound; building is lazy.
    pub fn append_contraction_scheme(
        &mut self,
        scheme: &ContractionScheme<K>,
    ) -> Result<(), InvalidSchemeComposition> {
        if scheme.is_built() {
            return Err(InvalidSchemeComposition::AlreadyBound(scheme.name()));
        }
        self.schemes.push(scheme.clone_unbuilt());
        Ok(())
    }

    /// Remove and return the topmost scheme, shrinking the hierarchy by one
    /// level. The scheme keeps its built state and cannot be re-appended
    /// as-is; clone it unbuilt instead.
    pub fn pop_contraction_scheme(&mut self) -> Option<ContractionScheme<K>> {
        self.schemes.pop()
    }

    /// The appended schemes, bottom-up; `schemes()[i]` produces level
    /// `i + 1`.
    pub fn schemes(&self) -> &[ContractionScheme<K>] {
        &self.schemes
    }

    /// Number of contraction levels above the base.
    pub fn height(&self) -> usize {
        self.schemes.len()
    }

    /// The base graph (level 0).
    pub fn base(&self) -> &DecGraph<K> {
        &self.base
    }

    // ---- base edits -------------------------------------------------------

    /// Add a base node.
    pub fn add_node(&mut self, k: K) -> Result<(), MlgError> {
        self.add_node_with(k, Attrs::default())
    }

    /// Add a base node carrying attributes.
    pub fn add_node_with(&mut self, k: K, attrs: Attrs) -> Result<(), MlgError> {
        let key = NodeKey::Base(k);
        self.base.add_node(Supernode::new(key, 0).with_attrs(attrs))?;
        self.base_out.push_added_node(key);
        Ok(())
    }

    /// Remove a base node. Its incident edges must be removed first.
    pub fn remove_node(&mut self, k: K) -> Result<(), MlgError> {
        let key = NodeKey::Base(k);
        self.base.remove_node(key)?;
        self.base_out.push_removed_node(key);
        Ok(())
    }

    /// Add a base edge.
    pub fn add_edge(&mut self, u: K, v: K) -> Result<(), MlgError> {
        self.add_edge_with(u, v, Attrs::default())
    }

    /// Add a base edge carrying attributes.
    pub fn add_edge_with(&mut self, u: K, v: K, attrs: Attrs) -> Result<(), MlgError> {
        let key = (NodeKey::Base(u), NodeKey::Base(v));
        self.base
            .add_edge(Superedge::new(key.0, key.1, 0).with_attrs(attrs))?;
        self.base_out.push_added_edge(key);
        Ok(())
    }

    /// Remove a base edge.
    pub fn remove_edge(&mut self, u: K, v: K) -> Result<(), MlgError> {
        let key = (NodeKey::Base(u), NodeKey::Base(v));
        self.base.remove_edge(key)?;
        self.base_out.push_removed_edge(key);
        Ok(())
    }

    // ---- queries ----------------------------------------------------------

    /// A view of level `i`, forcing propagation of buffered edits through
    /// levels 1..=i.
    pub fn graph(&mut self, i: usize) -> Result<&DecGraph<K>, MlgError> {
        self.ensure_built(i)?;
        Ok(self.level_graph(i))
    }

    /// A deep structural copy of level `i`.
    pub fn get_graph(&mut self, i: usize) -> Result<DecGraph<K>, MlgError> {
        Ok(self.graph(i)?.clone())
    }

    /// The component sets of the scheme producing level `i` (so the sets
    /// covering level `i - 1`).
    pub fn get_component_sets(&mut self, i: usize) -> Result<Vec<ComponentSet<K>>, MlgError> {
        if i == 0 || i > self.height() {
            return Err(PreconditionViolation::LevelOutOfRange(i, self.height()).into());
        }
        self.ensure_built(i)?;
        let level = self.schemes[i - 1].level.as_ref().unwrap();
        Ok(level.table().sets().cloned().collect())
    }

    /// Recursively flatten level `i` back to a level-0 graph. For a
    /// consistent hierarchy this is structurally equal to the base.
    pub fn complete_decontraction(&mut self, i: usize) -> Result<DecGraph<K>, MlgError> {
        self.ensure_built(i)?;
        if i == 0 {
            return Ok(self.base.clone());
        }

        let mut cur_nodes: IndexSet<NodeKey<K>> = self.level_graph(i).node_keys().collect();
        let mut cur_edges: IndexSet<EdgeKey<K>> = self.level_graph(i).edge_keys().collect();
        for j in (1..=i).rev() {
            let g = self.level_graph(j);
            let mut down_nodes: IndexSet<NodeKey<K>> = IndexSet::new();
            let mut down_edges: IndexSet<EdgeKey<K>> = IndexSet::new();
            for &n in &cur_nodes {
                let node = g.node(n).expect("hierarchy node resolves");
                down_nodes.extend(node.dec().nodes().iter().copied());
                down_edges.extend(node.dec().edges().iter().copied());
            }
            for &e in &cur_edges {
                let edge = g.edge(e).expect("hierarchy edge resolves");
                down_edges.extend(edge.dec().iter().copied());
            }
            cur_nodes = down_nodes;
            cur_edges = down_edges;
        }

        let mut out = DecGraph::new(0);
        for key in self.base.node_keys() {
            if cur_nodes.contains(&key) {
                let attrs = self.base.node(key).unwrap().attrs().clone();
                out.add_node(Supernode::new(key, 0).with_attrs(attrs))?;
            }
        }
        for key in self.base.edge_keys() {
            if cur_edges.contains(&key) {
                let attrs = self.base.edge(key).unwrap().attrs().clone();
                out.add_edge(Superedge::new(key.0, key.1, 0).with_attrs(attrs))?;
            }
        }
        Ok(out)
    }

    /// The canonical signature of level `i`: nodes as the base keys and
    /// base edges they flatten to, edges as leaf-key pairs with their
    /// decontractions resolved to base edges.
    ///
    /// Supernode keys embed scheme-allocated ids, which legitimately differ
    /// between an incrementally maintained hierarchy and a fresh rebuild;
    /// signatures compare the structure those keys describe instead.
    pub fn level_signature(&mut self, i: usize) -> Result<LevelSignature<K>, MlgError> {
        self.ensure_built(i)?;
        let mut nodes: BTreeMap<(Vec<K>, Vec<(K, K)>), usize> = BTreeMap::new();
        let mut edges: BTreeMap<(Vec<K>, Vec<K>, Vec<(K, K)>), usize> = BTreeMap::new();

        let node_keys: Vec<NodeKey<K>> = self.level_graph(i).node_keys().collect();
        for n in node_keys {
            let sig = self.leaf_content(i, n);
            *nodes.entry(sig).or_default() += 1;
        }
        let edge_keys: Vec<EdgeKey<K>> = self.level_graph(i).edge_keys().collect();
        for e in edge_keys {
            let (tail, _) = self.leaf_content(i, e.0);
            let (head, _) = self.leaf_content(i, e.1);
            let dec = self.leaf_edges(i, e);
            *edges.entry((tail, head, dec)).or_default() += 1;
        }
        Ok(LevelSignature { nodes, edges })
    }

    /// Drop level `i` and everything above it; the next query rebuilds them
    /// from scratch. This is the recovery path after a failed update.
    pub fn rebuild(&mut self, i: usize) -> Result<(), MlgError> {
        if i == 0 || i > self.height() {
            return Err(PreconditionViolation::LevelOutOfRange(i, self.height()).into());
        }
        for scheme in &mut self.schemes[i - 1..] {
            scheme.level = None;
        }
        debug!(from = i, "levels dropped for rebuild");
        Ok(())
    }

    // ---- internals --------------------------------------------------------

    fn level_graph(&self, i: usize) -> &DecGraph<K> {
        if i == 0 {
            &self.base
        } else {
            self.schemes[i - 1]
                .level
                .as_ref()
                .expect("level built")
                .graph()
        }
    }

    /// Everything a node flattens to: the base keys it contains and the
    /// base edges interior to it at any depth.
    fn leaf_content(&self, level: usize, key: NodeKey<K>) -> (Vec<K>, Vec<(K, K)>) {
        let mut leaves: BTreeSet<K> = BTreeSet::new();
        let mut interior: BTreeSet<(K, K)> = BTreeSet::new();
        let mut stack = vec![(level, key)];
        while let Some((j, n)) = stack.pop() {
            if j == 0 {
                if let NodeKey::Base(k) = n {
                    leaves.insert(k);
                }
                continue;
            }
            let node = self.level_graph(j).node(n).expect("hierarchy node resolves");
            for &m in node.dec().nodes() {
                stack.push((j - 1, m));
            }
            for &e in node.dec().edges() {
                interior.extend(self.leaf_edges(j - 1, e));
            }
        }
        (
            leaves.into_iter().collect(),
            interior.into_iter().collect(),
        )
    }

    fn leaf_edges(&self, level: usize, key: EdgeKey<K>) -> Vec<(K, K)> {
        let mut out: BTreeSet<(K, K)> = BTreeSet::new();
        let mut stack = vec![(level, key)];
        while let Some((j, e)) = stack.pop() {
            if j == 0 {
                if let (NodeKey::Base(u), NodeKey::Base(v)) = e {
                    out.insert((u, v));
                }
                continue;
            }
            let edge = self.level_graph(j).edge(e).expect("hierarchy edge resolves");
            for &x in edge.dec() {
                stack.push((j - 1, x));
            }
        }
        out.into_iter().collect()
    }

    fn ensure_built(&mut self, i: usize) -> Result<(), MlgError> {
        if i > self.height() {
            return Err(PreconditionViolation::LevelOutOfRange(i, self.height()).into());
        }
        for j in 1..=i {
            if j == 1 {
                let scheme = &mut self.schemes[0];
                step(scheme, &mut self.base, &mut self.base_out, j)?;
            } else {
                let (left, right) = self.schemes.split_at_mut(j - 1);
                let lower = left[j - 2].level.as_mut().expect("lower level built");
                step(&mut right[0], &mut lower.graph, &mut lower.out, j)?;
            }
        }
        Ok(())
    }
}

fn step<K: GraphKey>(
    scheme: &mut ContractionScheme<K>,
    lower: &mut DecGraph<K>,
    pending: &mut UpdateQuadruple<K>,
    index: usize,
) -> Result<(), MlgError> {
    if scheme.level.is_none() {
        // a fresh build reads the lower graph as it stands; buffered edits
        // are already baked in
        pending.take();
        scheme::build(scheme, lower, index)?;
        return Ok(());
    }
    if scheme.level.as_ref().unwrap().needs_rebuild() {
        return Err(InvariantViolation::NeedsRebuild(index).into());
    }
    let quad = pending.take();
    if !quad.is_empty() {
        scheme::run_update(scheme, lower, quad)?;
    }
    Ok(())
}

/// A level view by index. Panics when the level has not been built yet or
/// the index exceeds the height; use [MultilevelGraph::graph] to force
/// propagation first.
impl<K: GraphKey> Index<usize> for MultilevelGraph<K> {
    type Output = DecGraph<K>;

    fn index(&self, i: usize) -> &Self::Output {
        if i == 0 {
            return &self.base;
        }
        self.schemes[i - 1]
            .level
            .as_ref()
            .expect("level not built; query with graph(i) first")
            .graph()
    }
}

/// The canonical, key-independent description of one level. See
/// [MultilevelGraph::level_signature].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSignature<K: GraphKey> {
    nodes: BTreeMap<(Vec<K>, Vec<(K, K)>), usize>,
    edges: BTreeMap<(Vec<K>, Vec<K>, Vec<(K, K)>), usize>,
}

impl<K: GraphKey> LevelSignature<K> {
    /// The node signatures (leaf keys, interior base edges) with
    /// multiplicities.
    pub fn nodes(&self) -> &BTreeMap<(Vec<K>, Vec<(K, K)>), usize> {
        &self.nodes
    }

    /// The edge signatures with multiplicities.
    pub fn edges(&self) -> &BTreeMap<(Vec<K>, Vec<K>, Vec<(K, K)>), usize> {
        &self.edges
    }
}
