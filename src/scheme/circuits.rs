use std::collections::HashMap;

use indexmap::IndexSet;

use crate::comp::{CompId, CompTable};
use crate::dec::{EdgeKey, NodeKey};
use crate::error::MlgError;
use crate::graph::cycles::{cycles_through, simple_cycles};
use crate::graph::GraphKey;

use super::decontraction::Decontraction;
use super::edge_based::EdgeBasedRule;
use super::{ContractionRule, SchemeCx};

/// Contraction by elementary circuits: one component set per simple cycle
/// of the level below, with singletons covering acyclic nodes.
///
/// With `maximal` set, only circuits maximal under set inclusion survive.
/// The rule keeps a decontraction mirror of the lower level so new cycles
/// through an added edge can be enumerated without reflattening, plus the
/// edge list of each circuit so removals know which sets died.
#[derive(Debug)]
pub struct CircuitsRule<K: GraphKey> {
    maximal: bool,
    decon: Decontraction<K>,
    cycle_edges: HashMap<CompId, Vec<EdgeKey<K>>>,
}

impl<K: GraphKey> CircuitsRule<K> {
    /// Create the rule; `maximal` keeps only inclusion-maximal circuits.
    pub fn new(maximal: bool) -> Self {
        Self {
            maximal,
            decon: Decontraction::default(),
            cycle_edges: HashMap::new(),
        }
    }

    /// The edges a cycle traverses, including the closing edge; a length-1
    /// cycle is a self-loop.
    fn cycle_to_edges(cycle: &[NodeKey<K>]) -> Vec<EdgeKey<K>> {
        if cycle.len() == 1 {
            return vec![(cycle[0], cycle[0])];
        }
        let mut edges = Vec::with_capacity(cycle.len());
        for pair in cycle.windows(2) {
            edges.push((pair[0], pair[1]));
        }
        edges.push((cycle[cycle.len() - 1], cycle[0]));
        edges
    }

    /// Insert a circuit set, evicting singleton cover-fillers of its
    /// members. Returns `true` if the set survived insertion.
    fn insert_circuit(
        &mut self,
        cx: &mut SchemeCx<'_, K>,
        cycle: &[NodeKey<K>],
    ) -> Result<bool, MlgError> {
        let set = cx.alloc_set(cycle.iter().copied());
        let id = set.id();
        let edges = Self::cycle_to_edges(cycle);

        let inserted = if self.maximal {
            cx.add_set_maximal(set)
        } else {
            // evict pure cover-fillers by hand: singletons that are not
            // themselves self-loop circuits
            let fillers: Vec<CompId> = cycle
                .iter()
                .filter_map(|m| cx.table().sets_of(*m))
                .flatten()
                .filter(|sid| {
                    cx.table().get(**sid).is_some_and(|s| s.len() == 1)
                        && !self.cycle_edges.contains_key(*sid)
                })
                .copied()
                .collect();
            for filler in fillers {
                cx.remove_set(filler);
            }
            cx.add_set(set);
            true
        };
        if inserted {
            self.cycle_edges.insert(id, edges);
        }
        // maximal insertion may have evicted older circuits wholesale
        self.cycle_edges.retain(|sid, _| cx.table().contains_set(*sid));
        Ok(inserted)
    }
}

impl<K: GraphKey> EdgeBasedRule<K> for CircuitsRule<K> {
    fn name(&self) -> String {
        format!("circuits(maximal={})", self.maximal)
    }

    fn clone_rule(&self) -> Box<dyn ContractionRule<K>> {
        Box::new(Self::new(self.maximal))
    }

    fn contract(&mut self, cx: &mut SchemeCx<'_, K>) -> Result<CompTable<K>, MlgError> {
        let snapshot = cx.lower().graph();
        self.decon.clear();
        self.cycle_edges.clear();

        let mut table = CompTable::default();
        for cycle in simple_cycles(&snapshot) {
            let set = cx.alloc_set(cycle.iter().copied());
            let id = set.id();
            let inserted = if self.maximal {
                table.add_set_maximal(set)
            } else {
                table.add_set(set);
                true
            };
            if inserted {
                self.cycle_edges.insert(id, Self::cycle_to_edges(&cycle));
            }
        }
        self.cycle_edges.retain(|id, _| table.contains_set(*id));

        // acyclic nodes become singletons
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
        self.decon.ensure(cx.lower());
        self.decon.edge_added(e);

        let new_cycles = cycles_through(self.decon.graph().unwrap(), e.0, e.1);
        let mut inserted_any = false;
        for cycle in new_cycles {
            inserted_any |= self.insert_circuit(cx, &cycle)?;
        }
        if inserted_any {
            // later events of this pass depend on the regrouped structure
            cx.update_graph()?;
        }
        Ok(())
    }

    fn edge_removed(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError> {
        self.decon.ensure(cx.lower());
        self.decon.edge_removed(e);

        let dead: Vec<CompId> = self
            .cycle_edges
            .iter()
            .filter(|(_, edges)| edges.contains(&e))
            .map(|(id, _)| *id)
            .collect();

        let mut freed: IndexSet<NodeKey<K>> = IndexSet::new();
        for id in dead {
            if let Some(set) = cx.remove_set(id) {
                freed.extend(set.members().iter().copied());
            }
            self.cycle_edges.remove(&id);
        }

        // members whose every circuit died fall back to singletons
        for m in freed {
            if cx.lower().contains_node(m) && !cx.table().contains_node(m) {
                let set = cx.alloc_set([m]);
                cx.add_set(set);
            }
        }
        Ok(())
    }

    fn node_attached(&mut self, _cx: &mut SchemeCx<'_, K>, n: NodeKey<K>) -> Result<(), MlgError> {
        self.decon.node_added(n);
        Ok(())
    }

    fn node_detached(&mut self, _cx: &mut SchemeCx<'_, K>, n: NodeKey<K>) -> Result<(), MlgError> {
        self.decon.node_removed(n);
        Ok(())
    }
}
