use indexmap::IndexSet;

use crate::comp::{CompId, CompTable};
use crate::dec::{EdgeKey, NodeKey};
use crate::error::MlgError;
use crate::graph::cliques::{maximal_cliques, undirected_view};
use crate::graph::{DiGraph, GraphKey};

use super::edge_based::EdgeBasedRule;
use super::{ContractionRule, SchemeCx};

/// Cliques of fewer members than this stay uncontracted; otherwise every
/// adjacent pair would collapse.
const MIN_CLIQUE: usize = 3;

/// Contraction by maximal cliques of the undirected view of the level
/// below, with singletons covering the rest.
///
/// Maintaining maximal cliques incrementally is NP-hard in general, so the
/// handlers recompute locally: every set touching a changed edge's
/// endpoints is dropped and the cliques of the endpoints' closed
/// neighbourhood are re-derived in its place.
#[derive(Clone, Debug)]
pub struct CliquesRule {
    reciprocal: bool,
}

impl CliquesRule {
    /// Create the rule; `reciprocal` demands mutual edges for undirected
    /// adjacency.
    pub fn new(reciprocal: bool) -> Self {
        Self { reciprocal }
    }

    fn local_recompute<K: GraphKey>(
        &self,
        cx: &mut SchemeCx<'_, K>,
        a: NodeKey<K>,
        b: NodeKey<K>,
    ) -> Result<(), MlgError> {
        // drop every set touching the changed edge's endpoints
        let mut affected: Vec<CompId> = vec![];
        for n in [a, b] {
            if let Some(sets) = cx.table().sets_of(n) {
                for &id in sets {
                    if !affected.contains(&id) {
                        affected.push(id);
                    }
                }
            }
        }
        let mut freed: IndexSet<NodeKey<K>> = IndexSet::from_iter([a, b]);
        for id in affected {
            if let Some(set) = cx.remove_set(id) {
                freed.extend(set.members().iter().copied());
            }
        }

        // re-derive cliques over the closed neighbourhood of the endpoints
        let snapshot = cx.lower().graph();
        let adjacency = undirected_view(&snapshot, self.reciprocal);
        let mut region: IndexSet<NodeKey<K>> = IndexSet::new();
        for n in [a, b] {
            if snapshot.contains_node(n) {
                region.insert(n);
                if let Some(neighbors) = adjacency.get(&n) {
                    region.extend(neighbors.iter().copied());
                }
            }
        }
        let mut induced: DiGraph<NodeKey<K>> = DiGraph::default();
        for &n in &region {
            induced.add_node(n);
        }
        for (x, y) in snapshot.all_edges() {
            if region.contains(&x) && region.contains(&y) {
                induced.add_edge(x, y);
            }
        }

        for clique in maximal_cliques(&induced, self.reciprocal) {
            if clique.len() < MIN_CLIQUE || !(clique.contains(&a) || clique.contains(&b)) {
                continue;
            }
            let set = cx.alloc_set(clique);
            cx.add_set_maximal(set);
        }

        // whatever is left uncovered falls back to singletons
        for m in freed {
            if cx.lower().contains_node(m) && !cx.table().contains_node(m) {
                let set = cx.alloc_set([m]);
                cx.add_set(set);
            }
        }
        Ok(())
    }
}

impl<K: GraphKey> EdgeBasedRule<K> for CliquesRule {
    fn name(&self) -> String {
        format!("cliques(reciprocal={})", self.reciprocal)
    }

    fn clone_rule(&self) -> Box<dyn ContractionRule<K>> {
        Box::new(self.clone())
    }

    fn contract(&mut self, cx: &mut SchemeCx<'_, K>) -> Result<CompTable<K>, MlgError> {
        let snapshot = cx.lower().graph();
        let mut table = CompTable::default();
        for clique in maximal_cliques(&snapshot, self.reciprocal) {
            if clique.len() < MIN_CLIQUE {
                continue;
            }
            let set = cx.alloc_set(clique);
            table.add_set(set);
        }

        let uncovered: Vec<NodeKey<K>> = snapshot
            .nodes()
            .filter(|n| !table.contains_node(*n))
            .collect();
        for n in uncovered {
            let set = cx.alloc_set([n]);
            table.add_set(set);
        }
        table.clear_modified();
        Ok(table)
    }

    fn edge_added(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError> {
        self.local_recompute(cx, e.0, e.1)
    }

    fn edge_removed(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError> {
        self.local_recompute(cx, e.0, e.1)
    }
}
