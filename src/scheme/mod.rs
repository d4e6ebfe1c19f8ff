pub mod config;
pub mod decontraction;
pub mod edge_based;

mod circuits;
mod cliques;
mod sccs;
mod stars;

pub use circuits::CircuitsRule;
pub use cliques::CliquesRule;
pub use config::AttrFns;
pub use decontraction::Decontraction;
pub use edge_based::EdgeBasedRule;
pub use sccs::SccsRule;
pub use stars::StarsRule;

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::comp::{CompId, CompTable, ComponentSet};
use crate::dec::{fmt_key, DecGraph, EdgeKey, NodeKey, Superedge, Supernode};
use crate::error::{InvariantViolation, MlgError};
use crate::graph::{DiGraph, GraphKey};
use crate::update::UpdateQuadruple;

/// The abstract surface of a contraction scheme: the rule that produces a
/// covering from the level below and the four single-event reactions that
/// maintain it incrementally.
///
/// Rules whose only grouping criterion is connectivity through edges should
/// implement [EdgeBasedRule] instead and inherit the default node handling.
pub trait ContractionRule<K: GraphKey>: Debug {
    /// String identity of the scheme, including parameter values.
    fn name(&self) -> String;

    /// Produce a fresh rule with identical configuration and no state.
    fn clone_rule(&self) -> Box<dyn ContractionRule<K>>;

    /// The initial full computation: a covering of the lower level's nodes.
    ///
    /// Uncovered nodes are singleton-covered by the engine afterwards, and
    /// the modified frontier is cleared before the level is built.
    fn contract(&mut self, cx: &mut SchemeCx<'_, K>) -> Result<CompTable<K>, MlgError>;

    /// React to a node added at the lower level.
    fn added_node(&mut self, cx: &mut SchemeCx<'_, K>, n: NodeKey<K>) -> Result<(), MlgError>;

    /// React to a node removed at the lower level. Its incident edges are
    /// already gone.
    fn removed_node(&mut self, cx: &mut SchemeCx<'_, K>, n: NodeKey<K>) -> Result<(), MlgError>;

    /// React to an edge added at the lower level. The engine has already
    /// routed it into the upper structure.
    fn added_edge(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError>;

    /// React to an edge removed at the lower level. The engine has already
    /// removed it from the upper structure.
    fn removed_edge(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError>;
}

/// One scheme of a hierarchy: a rule, its attribute functions, and (once
/// built) the level state it maintains.
#[derive(Debug)]
pub struct ContractionScheme<K: GraphKey> {
    pub(crate) rule: Box<dyn ContractionRule<K>>,
    pub(crate) attrs: AttrFns<K>,
    pub(crate) level: Option<Level<K>>,
}

impl<K: GraphKey> ContractionScheme<K> {
    /// Wrap a rule with default (absent) attribute functions.
    pub fn new(rule: impl ContractionRule<K> + 'static) -> Self {
        Self {
            rule: Box::new(rule),
            attrs: AttrFns::default(),
            level: None,
        }
    }

    /// A strongly-connected-components scheme.
    pub fn sccs() -> Self {
        Self::new(SccsRule::default())
    }

    /// A simple-circuits scheme; `maximal` keeps only inclusion-maximal
    /// circuits.
    pub fn circuits(maximal: bool) -> Self {
        Self::new(CircuitsRule::new(maximal))
    }

    /// A maximal-cliques scheme over the chosen edge symmetry.
    pub fn cliques(reciprocal: bool) -> Self {
        Self::new(CliquesRule::new(reciprocal))
    }

    /// A star-cover scheme.
    pub fn stars() -> Self {
        Self::new(StarsRule)
    }

    /// Attach attribute functions to this scheme's configuration.
    pub fn with_attr_fns(mut self, attrs: AttrFns<K>) -> Self {
        self.attrs = attrs;
        self
    }

    /// The scheme's identity string, including parameter values.
    pub fn name(&self) -> String {
        self.rule.name()
    }

    /// Return `true` once the scheme has built its level.
    pub fn is_built(&self) -> bool {
        self.level.is_some()
    }

    /// The level state, once built.
    pub fn level(&self) -> Option<&Level<K>> {
        self.level.as_ref()
    }

    /// Produce an unbound scheme with identical configuration.
    pub fn clone_unbuilt(&self) -> Self {
        Self {
            rule: self.rule.clone_rule(),
            attrs: self.attrs.clone(),
            level: None,
        }
    }
}

/// Per-scheme level state: the level's graph, the covering that produced
/// it, the outgoing journal, and the bookkeeping the reconciler consumes.
#[derive(Debug)]
pub struct Level<K: GraphKey> {
    pub(crate) index: usize,
    pub(crate) graph: DecGraph<K>,
    pub(crate) table: CompTable<K>,
    pub(crate) out: UpdateQuadruple<K>,
    pub(crate) deleted_subnodes: IndexMap<NodeKey<K>, IndexSet<NodeKey<K>>>,
    next_id: u64,
    pub(crate) needs_rebuild: bool,
}

impl<K: GraphKey> Level<K> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            graph: DecGraph::new(index),
            table: CompTable::default(),
            out: UpdateQuadruple::default(),
            deleted_subnodes: IndexMap::new(),
            next_id: 0,
            needs_rebuild: false,
        }
    }

    /// The level index this state describes.
    pub fn index(&self) -> usize {
        self.index
    }

    /// This level's graph.
    pub fn graph(&self) -> &DecGraph<K> {
        &self.graph
    }

    /// The covering of the level below.
    pub fn table(&self) -> &CompTable<K> {
        &self.table
    }

    /// The arena-directory lookup: the supernode materialised for a set.
    pub fn supernode_of_set(&self, id: CompId) -> Option<&Supernode<K>> {
        self.graph.node(NodeKey::Comp(id))
    }

    /// Return `true` if a failed update poisoned this level.
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    fn alloc_id(&mut self) -> CompId {
        let id = CompId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// The context handed to a rule's handlers: the scheme's level state, the
/// level below (for back-pointer repair), and the attribute functions.
pub struct SchemeCx<'a, K: GraphKey> {
    pub(crate) level: &'a mut Level<K>,
    pub(crate) lower: &'a mut DecGraph<K>,
    pub(crate) attrs: &'a AttrFns<K>,
}

impl<'a, K: GraphKey> SchemeCx<'a, K> {
    /// The graph one level down.
    pub fn lower(&self) -> &DecGraph<K> {
        self.lower
    }

    /// This level's graph.
    pub fn upper(&self) -> &DecGraph<K> {
        &self.level.graph
    }

    /// The covering table.
    pub fn table(&self) -> &CompTable<K> {
        &self.level.table
    }

    /// The index of the level being maintained.
    pub fn level_index(&self) -> usize {
        self.level.index
    }

    /// Allocate a fresh component set over `members`, applying the
    /// configured attribute function.
    pub fn alloc_set(
        &mut self,
        members: impl IntoIterator<Item = NodeKey<K>>,
    ) -> ComponentSet<K> {
        let id = self.level.alloc_id();
        let set = ComponentSet::new(id, members);
        let attrs = self.attrs.comp_set_attrs(set.members());
        set.with_attrs(attrs)
    }

    /// Insert a set into the covering.
    pub fn add_set(&mut self, set: ComponentSet<K>) {
        self.level.table.add_set(set);
    }

    /// Insert a set keeping the covering maximal under inclusion. Returns
    /// `true` if the set went in.
    pub fn add_set_maximal(&mut self, set: ComponentSet<K>) -> bool {
        self.level.table.add_set_maximal(set)
    }

    /// Remove a set from the covering.
    pub fn remove_set(&mut self, id: CompId) -> Option<ComponentSet<K>> {
        self.level.table.remove_set(id)
    }

    /// The home supernode key of a lower node, per the current covering.
    pub fn home_key(&self, n: NodeKey<K>) -> Option<NodeKey<K>> {
        self.level.table.home_of(n).map(NodeKey::Comp)
    }

    /// A plain view of a supernode's interior, for algorithms.
    pub fn interior_digraph(&self, u: NodeKey<K>) -> Option<DiGraph<NodeKey<K>>> {
        self.level.graph.node(u).map(|n| n.dec().to_digraph())
    }

    /// Reconcile the level's graph with the current modified frontier.
    ///
    /// Handlers that mutate the covering and afterwards depend on the upper
    /// structure being consistent must call this before proceeding.
    pub fn update_graph(&mut self) -> Result<(), MlgError> {
        self.reconcile()
    }

    // ---- engine machinery -------------------------------------------------

    pub(crate) fn reconcile_if_dirty(&mut self) -> Result<(), MlgError> {
        if !self.level.table.modified().is_empty() || !self.level.deleted_subnodes.is_empty() {
            self.reconcile()?;
        }
        Ok(())
    }

    /// Route a freshly added lower edge into the upper structure: into the
    /// interior of every set containing both endpoints, and into the
    /// (created-on-demand) superedge between the endpoint homes when they
    /// differ.
    pub(crate) fn place_edge(&mut self, e: EdgeKey<K>) -> Result<(), MlgError> {
        self.reconcile_if_dirty()?;
        let (a, b) = e;
        let ha = self
            .level
            .table
            .home_of(a)
            .map(NodeKey::Comp)
            .ok_or_else(|| InvariantViolation::UncoveredNode(fmt_key(a)))?;
        let hb = self
            .level
            .table
            .home_of(b)
            .map(NodeKey::Comp)
            .ok_or_else(|| InvariantViolation::UncoveredNode(fmt_key(b)))?;

        self.insert_into_shared_interiors(e);

        if ha != hb {
            self.add_edge_in_superedge((ha, hb), e)?;
        }
        Ok(())
    }

    /// Remove a lower edge from wherever the upper structure holds it.
    /// Tolerates partial presence: a preceding reconcile may already have
    /// stripped stale placements.
    pub(crate) fn unplace_edge(&mut self, e: EdgeKey<K>) -> Result<(), MlgError> {
        self.reconcile_if_dirty()?;
        let (a, b) = e;

        // interiors of every set containing both endpoints
        let shared = self.shared_set_ids(a, b);
        for id in shared {
            if let Some(u) = self.level.graph.node_mut(NodeKey::Comp(id)) {
                u.dec_mut().remove_edge(e);
            }
        }

        let ha = self.level.table.home_of(a).map(NodeKey::Comp);
        let hb = self.level.table.home_of(b).map(NodeKey::Comp);
        if let (Some(ha), Some(hb)) = (ha, hb) {
            if ha != hb {
                self.remove_edge_in_superedge((ha, hb), e)?;
            }
        }
        Ok(())
    }

    fn shared_set_ids(&self, a: NodeKey<K>, b: NodeKey<K>) -> Vec<CompId> {
        let Some(sa) = self.level.table.sets_of(a) else {
            return vec![];
        };
        let Some(sb) = self.level.table.sets_of(b) else {
            return vec![];
        };
        sa.intersection(sb).copied().collect()
    }

    fn insert_into_shared_interiors(&mut self, e: EdgeKey<K>) {
        let shared = self.shared_set_ids(e.0, e.1);
        for id in shared {
            if let Some(u) = self.level.graph.node_mut(NodeKey::Comp(id)) {
                u.dec_mut().insert_edge(e);
            }
        }
    }

    /// Append a lower edge to the superedge `key`, creating it on demand.
    /// Returns `true` when the superedge came into existence here.
    fn add_edge_in_superedge(&mut self, key: EdgeKey<K>, x: EdgeKey<K>) -> Result<bool, MlgError> {
        let created = if self.level.graph.contains_edge(key) {
            false
        } else {
            self.level
                .graph
                .add_edge(Superedge::new(key.0, key.1, self.level.index))?;
            self.level.out.push_added_edge(key);
            true
        };
        let edge = self.level.graph.edge_mut(key).unwrap();
        edge.dec_mut().insert(x);
        let attrs = self.attrs.superedge_attrs(edge.dec());
        edge.set_attrs(attrs);
        Ok(created)
    }

    /// Drop a lower edge from the superedge `key`, destroying the superedge
    /// when its decontraction empties.
    fn remove_edge_in_superedge(&mut self, key: EdgeKey<K>, x: EdgeKey<K>) -> Result<(), MlgError> {
        let Some(edge) = self.level.graph.edge_mut(key) else {
            return Ok(());
        };
        edge.dec_mut().shift_remove(&x);
        if edge.dec().is_empty() {
            self.level.graph.remove_edge(key)?;
            self.level.out.push_removed_edge(key);
        } else {
            let attrs = self.attrs.superedge_attrs(edge.dec());
            let edge = self.level.graph.edge_mut(key).unwrap();
            edge.set_attrs(attrs);
        }
        Ok(())
    }

    /// Materialise the supernode for a set with its full induced interior.
    fn materialize_set(&mut self, id: CompId, journal: bool) -> Result<(), MlgError> {
        let key = NodeKey::Comp(id);
        if self.level.graph.contains_node(key) {
            return Ok(());
        }
        let set = self
            .level
            .table
            .get(id)
            .ok_or(InvariantViolation::MissingSupernode(id.value()))?;
        let mut node = Supernode::new(key, self.level.index);
        for &m in set.members() {
            node.dec_mut().insert_node(m);
        }
        for &m in set.members() {
            for e in self.lower.edges_of(m) {
                if set.contains(e.0) && set.contains(e.1) {
                    node.dec_mut().insert_edge(e);
                }
            }
        }
        let attrs = self.attrs.supernode_attrs(node.dec());
        self.level.graph.add_node(node.with_attrs(attrs))?;
        if journal {
            self.level.out.push_added_node(key);
        }
        Ok(())
    }

    /// Build the upper graph from scratch out of the current covering.
    /// Only used for the initial construction of a level; journals nothing.
    pub(crate) fn make_dec_graph(&mut self) -> Result<(), MlgError> {
        let set_ids: Vec<CompId> = self.level.table.sets().map(|s| s.id()).collect();
        for id in set_ids {
            self.materialize_set(id, false)?;
        }

        // back-pointers and set memberships into the lower level
        let lower_keys: Vec<NodeKey<K>> = self.lower.node_keys().collect();
        for n in lower_keys {
            let sets = self
                .level
                .table
                .sets_of(n)
                .cloned()
                .ok_or_else(|| InvariantViolation::UncoveredNode(fmt_key(n)))?;
            let home = NodeKey::Comp(*sets.first().unwrap());
            let node = self.lower.node_mut(n).unwrap();
            node.set_supernode(Some(home));
            node.set_component_sets(sets);
        }

        // aggregate the lower edges crossing homes
        let lower_edges: Vec<EdgeKey<K>> = self.lower.edge_keys().collect();
        for e in lower_edges {
            let ha = self.lower.node(e.0).unwrap().supernode().unwrap();
            let hb = self.lower.node(e.1).unwrap().supernode().unwrap();
            if ha != hb {
                self.add_edge_in_superedge((ha, hb), e)?;
            }
            // interiors already carry the induced intra edges
        }
        Ok(())
    }

    /// Reconcile the upper structure with the modified frontier and the
    /// deleted-subnode record, journalling every created or destroyed
    /// supernode and superedge.
    fn reconcile(&mut self) -> Result<(), MlgError> {
        // 1. lower nodes that were deleted outright
        let deleted = std::mem::take(&mut self.level.deleted_subnodes);
        for (u_key, nodes) in &deleted {
            if let Some(u) = self.level.graph.node_mut(*u_key) {
                for &n in nodes {
                    strip_node_from_interior(u, n);
                }
            }
        }

        let modified = self.level.table.take_modified();
        trace!(
            level = self.level.index,
            modified = modified.len(),
            deleted = deleted.len(),
            "reconciling"
        );

        // capture pre-change homes and memberships
        let mut old_home: HashMap<NodeKey<K>, Option<NodeKey<K>>> = HashMap::new();
        let mut old_sets: HashMap<NodeKey<K>, BTreeSet<CompId>> = HashMap::new();
        for &n in &modified {
            if let Some(node) = self.lower.node(n) {
                old_home.insert(n, node.supernode());
                old_sets.insert(n, node.component_sets().clone());
            }
        }

        // 2/3. membership moves: leave old interiors, enter (materialising
        // on demand) new ones, re-point homes
        for &n in &modified {
            if !self.lower.contains_node(n) {
                continue;
            }
            let new_sets = self
                .level
                .table
                .sets_of(n)
                .cloned()
                .ok_or_else(|| InvariantViolation::UncoveredNode(fmt_key(n)))?;
            let old = &old_sets[&n];

            for id in old.difference(&new_sets) {
                if let Some(u) = self.level.graph.node_mut(NodeKey::Comp(*id)) {
                    strip_node_from_interior(u, n);
                }
            }
            for id in new_sets.difference(old) {
                self.materialize_set(*id, true)?;
                if let Some(u) = self.level.graph.node_mut(NodeKey::Comp(*id)) {
                    u.dec_mut().insert_node(n);
                }
            }

            let home = NodeKey::Comp(*new_sets.first().unwrap());
            let node = self.lower.node_mut(n).unwrap();
            node.set_supernode(Some(home));
            node.set_component_sets(new_sets);
        }

        // 4. re-route every lower edge incident to the frontier
        let mut touched: IndexSet<EdgeKey<K>> = IndexSet::new();
        for &n in &modified {
            if self.lower.contains_node(n) {
                touched.extend(self.lower.edges_of(n));
            }
        }
        for e in touched {
            let (a, b) = e;
            let get_old = |x: NodeKey<K>, lower: &DecGraph<K>| -> Option<NodeKey<K>> {
                match old_home.get(&x) {
                    Some(h) => *h,
                    None => lower.node(x).and_then(|n| n.supernode()),
                }
            };
            let oha = get_old(a, self.lower);
            let ohb = get_old(b, self.lower);
            if let (Some(oha), Some(ohb)) = (oha, ohb) {
                if oha != ohb {
                    self.remove_edge_in_superedge((oha, ohb), e)?;
                }
            }

            self.insert_into_shared_interiors(e);
            let ha = self.lower.node(a).unwrap().supernode().unwrap();
            let hb = self.lower.node(b).unwrap().supernode().unwrap();
            if ha != hb {
                self.add_edge_in_superedge((ha, hb), e)?;
            }
        }

        // 5. sweep supernodes whose set is gone
        let dead: Vec<NodeKey<K>> = self
            .level
            .graph
            .node_keys()
            .filter(|k| match k.as_comp() {
                Some(id) => !self.level.table.contains_set(id),
                None => false,
            })
            .collect();
        for u in dead {
            for e in self.level.graph.edges_of(u) {
                self.level.graph.remove_edge(e)?;
                self.level.out.push_removed_edge(e);
            }
            self.level.graph.remove_node(u)?;
            self.level.out.push_removed_node(u);
        }
        Ok(())
    }
}

fn strip_node_from_interior<K: GraphKey>(u: &mut Supernode<K>, n: NodeKey<K>) {
    let stale: Vec<EdgeKey<K>> = u
        .dec()
        .edges()
        .iter()
        .filter(|(x, y)| *x == n || *y == n)
        .copied()
        .collect();
    for e in stale {
        u.dec_mut().remove_edge(e);
    }
    u.dec_mut().remove_node(n);
}

/// Build a scheme's level from the current lower graph: run the rule's
/// contraction, singleton-cover anything it left out, then materialise the
/// level graph.
#[tracing::instrument(skip_all, fields(level = index, scheme = %scheme.name()))]
pub(crate) fn build<K: GraphKey>(
    scheme: &mut ContractionScheme<K>,
    lower: &mut DecGraph<K>,
    index: usize,
) -> Result<(), MlgError> {
    let ContractionScheme { rule, attrs, level } = scheme;
    *level = Some(Level::new(index));
    let level = level.as_mut().unwrap();

    let table = {
        let mut cx = SchemeCx {
            level: &mut *level,
            lower: &mut *lower,
            attrs,
        };
        rule.contract(&mut cx)?
    };
    level.table = table;

    // singleton cover for anything the rule left out
    let uncovered: Vec<NodeKey<K>> = lower
        .node_keys()
        .filter(|&n| !level.table.contains_node(n))
        .collect();
    for n in uncovered {
        let mut cx = SchemeCx {
            level: &mut *level,
            lower: &mut *lower,
            attrs,
        };
        let set = cx.alloc_set([n]);
        cx.add_set(set);
    }
    level.table.clear_modified();

    let mut cx = SchemeCx {
        level: &mut *level,
        lower: &mut *lower,
        attrs,
    };
    cx.make_dec_graph()?;
    // the initial construction is not an update; nothing flows upward
    level.out = UpdateQuadruple::default();

    debug!(
        nodes = level.graph.node_count(),
        edges = level.graph.edge_count(),
        sets = level.table.len(),
        "level built"
    );
    Ok(())
}

/// The incremental entry point: replay a quadruple from the level below in
/// the canonical order E⁻, V⁻, V⁺, E⁺, reconcile, and leave the outgoing
/// journal in the level for the scheme above.
///
/// Any error poisons the level; recovery requires a rebuild.
#[tracing::instrument(skip_all, fields(level = scheme.level.as_ref().map(|l| l.index), events = quad.len()))]
pub(crate) fn run_update<K: GraphKey>(
    scheme: &mut ContractionScheme<K>,
    lower: &mut DecGraph<K>,
    quad: UpdateQuadruple<K>,
) -> Result<(), MlgError> {
    let ContractionScheme { rule, attrs, level } = scheme;
    let level = level.as_mut().expect("update on an unbuilt scheme");
    if level.needs_rebuild {
        return Err(InvariantViolation::NeedsRebuild(level.index).into());
    }

    let mut cx = SchemeCx {
        level: &mut *level,
        lower,
        attrs,
    };
    let result = replay(&mut cx, rule.as_mut(), &quad);

    match result {
        Ok(()) => {
            debug!(out = level.out.len(), "update propagated");
            Ok(())
        }
        Err(err) => {
            level.needs_rebuild = true;
            Err(err)
        }
    }
}

fn replay<K: GraphKey>(
    cx: &mut SchemeCx<'_, K>,
    rule: &mut dyn ContractionRule<K>,
    quad: &UpdateQuadruple<K>,
) -> Result<(), MlgError> {
    for &e in quad.removed_edges() {
        trace!(edge = ?e, "edge removed below");
        cx.unplace_edge(e)?;
        rule.removed_edge(cx, e)?;
    }
    for &n in quad.removed_nodes() {
        trace!(node = ?n, "node removed below");
        rule.removed_node(cx, n)?;
    }
    for &n in quad.added_nodes() {
        trace!(node = ?n, "node added below");
        rule.added_node(cx, n)?;
    }
    for &e in quad.added_edges() {
        trace!(edge = ?e, "edge added below");
        cx.place_edge(e)?;
        rule.added_edge(cx, e)?;
    }
    cx.reconcile_if_dirty()?;
    Ok(())
}
