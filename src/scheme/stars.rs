use indexmap::IndexSet;

use crate::comp::{CompId, CompTable};
use crate::dec::{EdgeKey, NodeKey};
use crate::error::MlgError;
use crate::graph::cliques::undirected_view;
use crate::graph::GraphKey;

use super::edge_based::EdgeBasedRule;
use super::{ContractionRule, SchemeCx};

/// Contraction into stars: scanning nodes in key order, every node not yet
/// assigned becomes a hub grouped with its unassigned undirected
/// neighbours. Leftover nodes are the hubs of their own singleton stars,
/// which is the degenerate case of the same cover.
#[derive(Clone, Copy, Debug, Default)]
pub struct StarsRule;

impl<K: GraphKey> EdgeBasedRule<K> for StarsRule {
    fn name(&self) -> String {
        "stars".into()
    }

    fn clone_rule(&self) -> Box<dyn ContractionRule<K>> {
        Box::new(Self)
    }

    fn contract(&mut self, cx: &mut SchemeCx<'_, K>) -> Result<CompTable<K>, MlgError> {
        let snapshot = cx.lower().graph();
        let adjacency = undirected_view(&snapshot, false);

        let mut keys: Vec<NodeKey<K>> = snapshot.nodes().collect();
        keys.sort_unstable();

        let mut assigned: IndexSet<NodeKey<K>> = IndexSet::new();
        let mut table = CompTable::default();
        for hub in keys {
            if assigned.contains(&hub) {
                continue;
            }
            let mut star: Vec<NodeKey<K>> = vec![hub];
            if let Some(neighbors) = adjacency.get(&hub) {
                let mut leaves: Vec<NodeKey<K>> = neighbors
                    .iter()
                    .filter(|m| !assigned.contains(*m))
                    .copied()
                    .collect();
                leaves.sort_unstable();
                star.extend(leaves);
            }
            assigned.extend(star.iter().copied());
            let set = cx.alloc_set(star);
            table.add_set(set);
        }
        table.clear_modified();
        Ok(table)
    }

    fn edge_added(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError> {
        recover_around(cx, e.0, e.1)
    }

    fn edge_removed(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError> {
        recover_around(cx, e.0, e.1)
    }
}

/// Drop the stars touching the changed edge's endpoints and re-run the
/// cover over the freed nodes.
fn recover_around<K: GraphKey>(
    cx: &mut SchemeCx<'_, K>,
    a: NodeKey<K>,
    b: NodeKey<K>,
) -> Result<(), MlgError> {
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
    let mut freed: IndexSet<NodeKey<K>> = IndexSet::new();
    for id in affected {
        if let Some(set) = cx.remove_set(id) {
            freed.extend(set.members().iter().copied());
        }
    }

    let snapshot = cx.lower().graph();
    let adjacency = undirected_view(&snapshot, false);
    let mut hubs: Vec<NodeKey<K>> = freed
        .iter()
        .filter(|m| snapshot.contains_node(**m))
        .copied()
        .collect();
    hubs.sort_unstable();

    for hub in hubs {
        if cx.table().contains_node(hub) {
            continue;
        }
        let mut star: Vec<NodeKey<K>> = vec![hub];
        if let Some(neighbors) = adjacency.get(&hub) {
            let mut leaves: Vec<NodeKey<K>> = neighbors
                .iter()
                .filter(|m| freed.contains(*m) && !cx.table().contains_node(**m))
                .copied()
                .collect();
            leaves.sort_unstable();
            star.extend(leaves);
        }
        let set = cx.alloc_set(star);
        cx.add_set(set);
    }
    Ok(())
}
