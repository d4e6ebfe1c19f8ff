use std::collections::{BTreeSet, HashMap};
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::attr::Attrs;
use crate::dec::NodeKey;
use crate::graph::GraphKey;

/// Identity of a [ComponentSet], allocated freshly by the owning scheme.
///
/// Two component sets are the same set iff they share an id; member-wise
/// comparison is a separate predicate used only by maximal insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompId(pub(crate) u64);

impl CompId {
    /// The raw id value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CompId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A labelled, attributed set of same-level supernodes. One level's
/// [CompTable] covers the lower level's nodes with these.
#[derive(Clone, Debug)]
pub struct ComponentSet<K: GraphKey> {
    id: CompId,
    members: IndexSet<NodeKey<K>>,
    attrs: Attrs,
}

impl<K: GraphKey> ComponentSet<K> {
    pub(crate) fn new(id: CompId, members: impl IntoIterator<Item = NodeKey<K>>) -> Self {
        Self {
            id,
            members: members.into_iter().collect(),
            attrs: Attrs::default(),
        }
    }

    pub(crate) fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// The set's identity.
    pub fn id(&self) -> CompId {
        self.id
    }

    /// The member supernode keys.
    pub fn members(&self) -> &IndexSet<NodeKey<K>> {
        &self.members
    }

    /// Return `true` if `n` is a member.
    pub fn contains(&self, n: NodeKey<K>) -> bool {
        self.members.contains(&n)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Return `true` if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The user attribute bag.
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    #[allow(missing_docs, reason = "obvious")]
    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    /// Member-wise subset test against another set.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.members.is_subset(&other.members)
    }
}

impl<K: GraphKey> PartialEq for ComponentSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<K: GraphKey> Eq for ComponentSet<K> {}

/// The covering of a level's nodes by [ComponentSet]s, together with the
/// reverse index node -> containing sets and the `modified` frontier the
/// engine reconciles against.
#[derive(Clone, Debug)]
pub struct CompTable<K: GraphKey> {
    sets: IndexMap<CompId, ComponentSet<K>>,
    index: HashMap<NodeKey<K>, BTreeSet<CompId>>,
    modified: IndexSet<NodeKey<K>>,
}

impl<K: GraphKey> Default for CompTable<K> {
    fn default() -> Self {
        Self {
            sets: IndexMap::new(),
            index: HashMap::new(),
            modified: IndexSet::new(),
        }
    }
}

impl<K: GraphKey> CompTable<K> {
    /// Add a set; every member joins the reverse index and the modified
    /// frontier.
    pub fn add_set(&mut self, set: ComponentSet<K>) {
        for &m in set.members() {
            self.index.entry(m).or_default().insert(set.id());
            self.modified.insert(m);
        }
        self.sets.insert(set.id(), set);
    }

    /// Add a set keeping the table maximal under set inclusion: insertion is
    /// skipped when an existing set already contains every member, and
    /// existing subsets of the new set are evicted first.
    ///
    /// Returns `true` if the set was inserted.
    pub fn add_set_maximal(&mut self, set: ComponentSet<K>) -> bool {
        // A superset must contain every member, so it indexes the first one.
        if let Some(first) = set.members().first() {
            if let Some(candidates) = self.index.get(first) {
                let covered = candidates.iter().any(|id| {
                    set.members().is_subset(self.sets[id].members())
                });
                if covered {
                    return false;
                }
            }
        }

        let mut subsumed: Vec<CompId> = vec![];
        for &m in set.members() {
            let Some(containing) = self.index.get(&m) else {
                continue;
            };
            for &id in containing {
                if !subsumed.contains(&id) && self.sets[&id].members().is_subset(set.members()) {
                    subsumed.push(id);
                }
            }
        }
        for id in subsumed {
            self.remove_set(id);
        }

        self.add_set(set);
        true
    }

    /// Remove a set by id; every former member joins the modified frontier,
    /// and members left without any containing set drop out of the index
    /// entirely (uncovered; the caller must re-cover or delete them).
    pub fn remove_set(&mut self, id: CompId) -> Option<ComponentSet<K>> {
        let set = self.sets.shift_remove(&id)?;
        for &m in set.members() {
            if let Some(containing) = self.index.get_mut(&m) {
                containing.remove(&id);
                if containing.is_empty() {
                    self.index.remove(&m);
                }
            }
            self.modified.insert(m);
        }
        Some(set)
    }

    /// Return `true` if `n` is covered by at least one set.
    pub fn contains_node(&self, n: NodeKey<K>) -> bool {
        self.index.contains_key(&n)
    }

    /// The ids of every set containing `n`, sorted.
    pub fn sets_of(&self, n: NodeKey<K>) -> Option<&BTreeSet<CompId>> {
        self.index.get(&n)
    }

    /// The home set of `n`: the lowest id among its containing sets.
    pub fn home_of(&self, n: NodeKey<K>) -> Option<CompId> {
        self.index.get(&n).and_then(|s| s.first().copied())
    }

    /// Look up a set by id.
    pub fn get(&self, id: CompId) -> Option<&ComponentSet<K>> {
        self.sets.get(&id)
    }

    /// Return `true` if a set with this id is present.
    pub fn contains_set(&self, id: CompId) -> bool {
        self.sets.contains_key(&id)
    }

    /// Iterate over the sets in insertion order.
    pub fn sets(&self) -> impl ExactSizeIterator<Item = &ComponentSet<K>> + '_ {
        self.sets.values()
    }

    /// Number of sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Return `true` if the table holds no sets.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The frontier of nodes whose containing-set collection changed since
    /// the last [clear_modified](Self::clear_modified).
    pub fn modified(&self) -> &IndexSet<NodeKey<K>> {
        &self.modified
    }

    pub(crate) fn take_modified(&mut self) -> IndexSet<NodeKey<K>> {
        std::mem::take(&mut self.modified)
    }

    /// Reset the frontier.
    pub fn clear_modified(&mut self) {
        self.modified.clear();
    }

    /// Coverage check: `true` if every node of `nodes` is in some set.
    pub fn is_covering(&self, mut nodes: impl Iterator<Item = NodeKey<K>>) -> bool {
        nodes.all(|n| self.index.contains_key(&n))
    }
}
