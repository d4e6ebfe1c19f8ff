use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::attr::Attrs;
use crate::dec::{EdgeKey, InteriorGraph, NodeKey};
use crate::graph::GraphKey;

/// Computes a supernode's attributes from its interior graph.
pub type SupernodeAttrFn<K> = Arc<dyn Fn(&InteriorGraph<K>) -> Attrs + Send + Sync>;
/// Computes a superedge's attributes from its aggregated lower edges.
pub type SuperedgeAttrFn<K> = Arc<dyn Fn(&IndexSet<EdgeKey<K>>) -> Attrs + Send + Sync>;
/// Computes a component set's attributes from its members.
pub type CompSetAttrFn<K> = Arc<dyn Fn(&IndexSet<NodeKey<K>>) -> Attrs + Send + Sync>;

/// The three optional attribute functions of a scheme's configuration.
///
/// Each is called with the current members whenever the corresponding
/// entity is (re)computed. They must be pure; the engine hands them
/// borrowed views only.
pub struct AttrFns<K: GraphKey> {
    supernode: Option<SupernodeAttrFn<K>>,
    superedge: Option<SuperedgeAttrFn<K>>,
    comp_set: Option<CompSetAttrFn<K>>,
}

impl<K: GraphKey> Default for AttrFns<K> {
    fn default() -> Self {
        Self {
            supernode: None,
            superedge: None,
            comp_set: None,
        }
    }
}

impl<K: GraphKey> AttrFns<K> {
    /// Set the supernode attribute function.
    pub fn with_supernode_fn(
        mut self,
        f: impl Fn(&InteriorGraph<K>) -> Attrs + Send + Sync + 'static,
    ) -> Self {
        self.supernode = Some(Arc::new(f));
        self
    }

    /// Set the superedge attribute function.
    pub fn with_superedge_fn(
        mut self,
        f: impl Fn(&IndexSet<EdgeKey<K>>) -> Attrs + Send + Sync + 'static,
    ) -> Self {
        self.superedge = Some(Arc::new(f));
        self
    }

    /// Set the component-set attribute function.
    pub fn with_comp_set_fn(
        mut self,
        f: impl Fn(&IndexSet<NodeKey<K>>) -> Attrs + Send + Sync + 'static,
    ) -> Self {
        self.comp_set = Some(Arc::new(f));
        self
    }

    pub(crate) fn supernode_attrs(&self, dec: &InteriorGraph<K>) -> Attrs {
        self.supernode.as_ref().map(|f| f(dec)).unwrap_or_default()
    }

    pub(crate) fn superedge_attrs(&self, dec: &IndexSet<EdgeKey<K>>) -> Attrs {
        self.superedge.as_ref().map(|f| f(dec)).unwrap_or_default()
    }

    pub(crate) fn comp_set_attrs(&self, members: &IndexSet<NodeKey<K>>) -> Attrs {
        self.comp_set.as_ref().map(|f| f(members)).unwrap_or_default()
    }
}

impl<K: GraphKey> Clone for AttrFns<K> {
    fn clone(&self) -> Self {
        Self {
            supernode: self.supernode.clone(),
            superedge: self.superedge.clone(),
            comp_set: self.comp_set.clone(),
        }
    }
}

impl<K: GraphKey> fmt::Debug for AttrFns<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrFns")
            .field("supernode", &self.supernode.is_some())
            .field("superedge", &self.superedge.is_some())
            .field("comp_set", &self.comp_set.is_some())
            .finish()
    }
}
