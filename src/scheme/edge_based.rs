use std::fmt::Debug;

use crate::comp::CompTable;
use crate::dec::{fmt_key, EdgeKey, NodeKey};
use crate::error::{InvariantViolation, MlgError};
use crate::graph::GraphKey;

use super::{ContractionRule, SchemeCx};

/// A contraction rule whose only grouping criterion is connectivity through
/// edges.
///
/// The blanket [ContractionRule] implementation supplies the default node
/// behaviour: an added node starts life in a fresh singleton set, and a
/// removed node must sit in exactly one singleton by the time its removal
/// arrives (edge removals precede it and strip its connectivity).
pub trait EdgeBasedRule<K: GraphKey>: Debug {
    /// String identity of the scheme, including parameter values.
    fn name(&self) -> String;

    /// Produce a fresh rule with identical configuration and no state.
    fn clone_rule(&self) -> Box<dyn ContractionRule<K>>;

    /// The initial full computation: a covering of the lower level's nodes.
    fn contract(&mut self, cx: &mut SchemeCx<'_, K>) -> Result<CompTable<K>, MlgError>;

    /// React to an edge added at the lower level (already routed into the
    /// upper structure by the engine).
    fn edge_added(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError>;

    /// React to an edge removed at the lower level (already removed from
    /// the upper structure by the engine).
    fn edge_removed(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError>;

    /// Hook running after the default singleton insertion for an added
    /// node. Rules carrying auxiliary structures sync them here.
    fn node_attached(&mut self, _cx: &mut SchemeCx<'_, K>, _n: NodeKey<K>) -> Result<(), MlgError> {
        Ok(())
    }

    /// Hook running after the default bookkeeping for a removed node.
    fn node_detached(&mut self, _cx: &mut SchemeCx<'_, K>, _n: NodeKey<K>) -> Result<(), MlgError> {
        Ok(())
    }
}

impl<K: GraphKey, T: EdgeBasedRule<K> + 'static> ContractionRule<K> for T {
    fn name(&self) -> String {
        EdgeBasedRule::name(self)
    }

    fn clone_rule(&self) -> Box<dyn ContractionRule<K>> {
        EdgeBasedRule::clone_rule(self)
    }

    fn contract(&mut self, cx: &mut SchemeCx<'_, K>) -> Result<CompTable<K>, MlgError> {
        EdgeBasedRule::contract(self, cx)
    }

    fn added_node(&mut self, cx: &mut SchemeCx<'_, K>, n: NodeKey<K>) -> Result<(), MlgError> {
        let set = cx.alloc_set([n]);
        cx.add_set(set);
        self.node_attached(cx, n)
    }

    fn removed_node(&mut self, cx: &mut SchemeCx<'_, K>, n: NodeKey<K>) -> Result<(), MlgError> {
        let sets = cx.table().sets_of(n).cloned().unwrap_or_default();
        let lone = sets.len() == 1
            && sets
                .first()
                .and_then(|id| cx.table().get(*id))
                .is_some_and(|s| s.len() == 1);
        if !lone {
            return Err(InvariantViolation::RemovedNodeStillGrouped(fmt_key(n)).into());
        }

        let id = *sets.first().unwrap();
        let home = NodeKey::Comp(id);
        cx.remove_set(id);
        cx.level
            .deleted_subnodes
            .entry(home)
            .or_default()
            .insert(n);
        self.node_detached(cx, n)
    }

    fn added_edge(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError> {
        self.edge_added(cx, e)
    }

    fn removed_edge(&mut self, cx: &mut SchemeCx<'_, K>, e: EdgeKey<K>) -> Result<(), MlgError> {
        self.edge_removed(cx, e)
    }
}
