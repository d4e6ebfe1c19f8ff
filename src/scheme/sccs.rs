use indexmap::IndexSet;

use crate::comp::{CompId, CompTable};
use crate::dec::{fmt_edge, EdgeKey, NodeKey};
use crate::error::{InvariantViolation, MlgError};
use crate::graph::tarjan::strongly_connected_components;
use crate::graph::GraphKey;

use super::edge_based::EdgeBasedRule;
use super::{ContractionRule, SchemeCx};

/// Contraction by strongly connected components: one component set per SCC
/// of the level below.
///
/// On an edge addition that closes a directed cycle at the upper level,
/// every supernode on the cycle collapses into one set. On an intra-set
/// edge removal, the set splits along the recomputed components of its
/// interior.
#[derive(Clone, Debug, Default)]
pub struct SccsRule;

impl<K: GraphKey> EdgeBasedRule<K> for SccsRule {
    fn name(&self) -> String {
        "sccs".into()
    }

    fn clone_rule(&self) -> Box<dyn ContractionRule<K>> {
        Box::new(Self)
    }

    fn contract(&mut self, cx: &mut SchemeCx<'_, K>) -> Result<CompTable<K>, MlgError> {
        let snapshot = cx.lower().graph();
        let mut table = CompTable::default();
        for scc in strongly_connected_components(&snapshot) {
            let set = cx.alloc_set(scc);
            table.add_set(set);
        }
        table.clear_modified();
        Ok(table)
    }

    fn edge_added(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError> {
        let (a, b) = e;
        let Some(ha) = cx.home_key(a) else {
            return Err(InvariantViolation::UncoveredNode(format!("{a:?}")).into());
        };
        let Some(hb) = cx.home_key(b) else {
            return Err(InvariantViolation::UncoveredNode(format!("{b:?}")).into());
        };
        if ha == hb {
            // interior to an existing component; nothing to regroup
            return Ok(());
        }

        let superedge = cx
            .upper()
            .edge((ha, hb))
            .ok_or_else(|| InvariantViolation::EmptySuperedge(fmt_edge((ha, hb))))?;
        if superedge.dec().len() > 1 {
            // the superedge predates this event, so no new upper-level path
            return Ok(());
        }

        let upper = cx.upper().graph();
        if !upper.is_reachable(hb, ha) {
            return Ok(());
        }

        // The new superedge closed a directed cycle: every supernode on a
        // path hb -> ha collapses into one component.
        let mut on_cycle: Vec<NodeKey<K>> = upper.nodes_on_paths(hb, ha).into_iter().collect();
        on_cycle.sort_unstable();

        let mut members: IndexSet<NodeKey<K>> = IndexSet::new();
        let mut merged: Vec<CompId> = Vec::with_capacity(on_cycle.len());
        for u in on_cycle {
            let id = u
                .as_comp()
                .ok_or_else(|| InvariantViolation::CorruptIndex(format!("{u:?}")))?;
            let set = cx
                .table()
                .get(id)
                .ok_or(InvariantViolation::MissingSupernode(id.value()))?;
            members.extend(set.members().iter().copied());
            merged.push(id);
        }
        for id in merged {
            cx.remove_set(id);
        }
        let union = cx.alloc_set(members);
        cx.add_set(union);

        // subsequent events of this pass must see the merge
        cx.update_graph()
    }

    fn edge_removed(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError> {
        let (a, b) = e;
        let (Some(ha), Some(hb)) = (cx.home_key(a), cx.home_key(b)) else {
            return Ok(());
        };
        if ha != hb {
            // inter-component edge; aggregation was already adjusted
            return Ok(());
        }

        let interior = cx
            .interior_digraph(ha)
            .ok_or_else(|| InvariantViolation::CorruptIndex(format!("{ha:?}")))?;
        let sccs = strongly_connected_components(&interior);
        if sccs.len() <= 1 {
            return Ok(());
        }

        // the removal disconnected the component: split its set
        let id = ha.as_comp().unwrap();
        cx.remove_set(id);
        for scc in sccs {
            let set = cx.alloc_set(scc);
            cx.add_set(set);
        }
        Ok(())
    }
}
