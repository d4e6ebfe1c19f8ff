pub mod cliques;
pub mod cycles;
pub(crate) mod tarjan;

pub use tarjan::strongly_connected_components;

use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;
use smallvec::SmallVec;

/// Types usable as node identifiers in a [DiGraph].
///
/// `Ord` is required so traversals and algorithm outputs can be made
/// deterministic regardless of insertion order.
pub trait GraphKey: Copy + Eq + Hash + Ord + Debug + 'static {}
impl<T: Copy + Eq + Hash + Ord + Debug + 'static> GraphKey for T {}

/// Compact storage of a node and a [`Direction`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adjacent<N>(N, Direction);

/// Edge direction.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// An `Outgoing` edge is an outward edge *from* the current node.
    Outgoing = 0,
    /// An `Incoming` edge is an inbound edge *to* the current node.
    Incoming = 1,
}

impl Direction {
    /// Return the opposite `Direction`.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Self::Outgoing => Self::Incoming,
            Self::Incoming => Self::Outgoing,
        }
    }
}

/// A directed graph over plain node keys.
///
/// This is the snapshot representation the algorithms run on: contraction
/// schemes take one via [graph()](crate::dec::DecGraph::graph) (or maintain
/// one as a decontraction mirror) and never mutate engine state through it.
#[derive(Debug, Clone)]
pub struct DiGraph<N: GraphKey> {
    nodes: IndexMap<N, Vec<Adjacent<N>>>,
    edges: HashSet<(N, N)>,
}

impl<N: GraphKey> Default for DiGraph<N> {
    fn default() -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: HashSet::new(),
        }
    }
}

impl<N: GraphKey> DiGraph<N> {
    /// Return the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Add node `n` to the graph if it doesn't already exist.
    pub fn add_node(&mut self, n: N) {
        self.nodes.entry(n).or_default();
    }

    /// Remove a node `n` from the graph.
    ///
    /// Computes in **O(N)** time, due to the removal of edges with other
    /// nodes.
    pub fn remove_node(&mut self, n: N) {
        let Some(links) = self.nodes.swap_remove(&n) else {
            return;
        };

        for Adjacent(succ, dir) in links {
            let edge = if dir == Direction::Outgoing {
                (n, succ)
            } else {
                (succ, n)
            };
            // remove all successor links
            self.remove_single_edge(succ, n, dir.opposite());
            // Remove all edge values
            self.edges.remove(&edge);
        }
    }

    /// Return `true` if the node is contained in the graph.
    pub fn contains_node(&self, n: N) -> bool {
        self.nodes.contains_key(&n)
    }

    /// Add an edge connecting `a` and `b` to the graph, directed from `a`
    /// to `b`.
    ///
    /// Inserts nodes `a` and/or `b` if they aren't already part of the graph.
    pub fn add_edge(&mut self, a: N, b: N) {
        if self.edges.insert((a, b)) {
            // insert in the adjacency list if it's a new edge
            self.nodes
                .entry(a)
                .or_insert_with(|| Vec::with_capacity(1))
                .push(Adjacent(b, Direction::Outgoing));
            if a != b {
                // self loops don't have the Incoming entry
                self.nodes
                    .entry(b)
                    .or_insert_with(|| Vec::with_capacity(1))
                    .push(Adjacent(a, Direction::Incoming));
            }
        }
    }

    /// Remove edge relation from a to b
    ///
    /// Return `true` if it did exist.
    fn remove_single_edge(&mut self, a: N, b: N, dir: Direction) -> bool {
        let Some(sus) = self.nodes.get_mut(&a) else {
            return false;
        };

        let Some(index) = sus
            .iter()
            .copied()
            .position(|elt| (elt == Adjacent(b, dir)))
        else {
            return false;
        };

        sus.swap_remove(index);
        true
    }

    /// Remove edge from `a` to `b` from the graph.
    ///
    /// Return `false` if the edge didn't exist.
    pub fn remove_edge(&mut self, a: N, b: N) -> bool {
        let exist1 = self.remove_single_edge(a, b, Direction::Outgoing);
        let exist2 = if a != b {
            self.remove_single_edge(b, a, Direction::Incoming)
        } else {
            exist1
        };
        let weight = self.edges.remove(&(a, b));
        debug_assert!(exist1 == exist2 && exist1 == weight);
        weight
    }

    /// Return `true` if the edge connecting `a` with `b` is contained in the
    /// graph.
    pub fn contains_edge(&self, a: N, b: N) -> bool {
        self.edges.contains(&(a, b))
    }

    /// Return an iterator over the nodes of the graph.
    pub fn nodes(
        &self,
    ) -> impl DoubleEndedIterator<Item = N> + ExactSizeIterator<Item = N> + '_ {
        self.nodes.keys().copied()
    }

    /// Return an iterator of all nodes with an edge starting from `a`.
    pub fn neighbors(&self, a: N) -> impl DoubleEndedIterator<Item = N> + '_ {
        let iter = match self.nodes.get(&a) {
            Some(neigh) => neigh.iter(),
            None => [].iter(),
        };

        iter.copied()
            .filter_map(|Adjacent(n, dir)| (dir == Direction::Outgoing).then_some(n))
    }

    /// Return an iterator of all neighbors that have an edge between them and
    /// `a`, in the specified direction.
    pub fn neighbors_directed(
        &self,
        a: N,
        dir: Direction,
    ) -> impl DoubleEndedIterator<Item = N> + '_ {
        let iter = match self.nodes.get(&a) {
            Some(neigh) => neigh.iter(),
            None => [].iter(),
        };

        iter.copied()
            .filter_map(move |Adjacent(n, d)| (d == dir || n == a).then_some(n))
    }

    /// Return an iterator over all edges of the graph in arbitrary order.
    pub fn all_edges(&self) -> impl ExactSizeIterator<Item = (N, N)> + '_ {
        self.edges.iter().copied()
    }

    pub(crate) fn to_index(&self, ix: N) -> usize {
        self.nodes.get_index_of(&ix).unwrap()
    }

    /// Iterate over all *Strongly Connected Components* in this graph.
    pub(crate) fn iter_sccs(&self) -> impl Iterator<Item = SmallVec<[N; 4]>> + '_ {
        tarjan::new_tarjan_scc(self)
    }

    /// Return `true` if `to` is reachable from `from` along directed edges.
    ///
    /// Plain BFS; `from` reaches itself trivially.
    pub fn is_reachable(&self, from: N, to: N) -> bool {
        if from == to {
            return true;
        }
        if !self.contains_node(from) {
            return false;
        }
        let mut seen: HashSet<N> = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(from);
        queue.push_back(from);
        while let Some(n) = queue.pop_front() {
            for succ in self.neighbors(n) {
                if succ == to {
                    return true;
                }
                if seen.insert(succ) {
                    queue.push_back(succ);
                }
            }
        }
        false
    }

    /// Collect every node lying on some directed path from `from` to `to`,
    /// including the endpoints when such a path exists.
    ///
    /// This is the set used to decide which supernodes collapse when a new
    /// superedge closes a cycle: descendants of `from` intersected with
    /// ancestors of `to`.
    pub fn nodes_on_paths(&self, from: N, to: N) -> HashSet<N> {
        let forward = self.flood(from, Direction::Outgoing);
        let backward = self.flood(to, Direction::Incoming);
        forward.intersection(&backward).copied().collect()
    }

    fn flood(&self, start: N, dir: Direction) -> HashSet<N> {
        let mut seen: HashSet<N> = HashSet::new();
        if !self.contains_node(start) {
            return seen;
        }
        let mut queue = VecDeque::new();
        seen.insert(start);
        queue.push_back(start);
        while let Some(n) = queue.pop_front() {
            for next in self.neighbors_directed(n, dir) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }
}
