use std::num::NonZeroUsize;

use smallvec::SmallVec;

use super::{DiGraph, GraphKey};

/// Compute the *strongly connected components* of `graph` as sorted node
/// lists, ordered by their smallest key.
pub fn strongly_connected_components<N: GraphKey>(graph: &DiGraph<N>) -> Vec<SmallVec<[N; 4]>> {
    let mut sccs: Vec<SmallVec<[N; 4]>> = new_tarjan_scc(graph).collect();
    for scc in &mut sccs {
        scc.sort_unstable();
    }
    sccs.sort_unstable_by(|a, b| a[0].cmp(&b[0]));
    sccs
}

/// Create an iterator over *strongly connected components* using Algorithm 3
/// in [A Space-Efficient Algorithm for Finding Strongly Connected
/// Components][1] by David J. Pierce, which is a memory-efficient variation
/// of [Tarjan's algorithm][2].
///
/// [1]: https://homepages.ecs.vuw.ac.nz/~djp/files/P05.pdf
/// [2]: https://en.wikipedia.org/wiki/Tarjan%27s_strongly_connected_components_algorithm
///
/// Returns each strongly connected component (scc). The order of node ids
/// within each scc is arbitrary, but the order of the sccs is their
/// postorder (reverse topological sort). Roots are visited in sorted key
/// order so the result is stable across insertion orders.
pub(crate) fn new_tarjan_scc<N: GraphKey>(
    graph: &DiGraph<N>,
) -> impl Iterator<Item = SmallVec<[N; 4]>> + '_ {
    // Create a list of all nodes we need to visit, in a stable order.
    let mut roots: Vec<N> = graph.nodes().collect();
    roots.sort_unstable();

    // For each node we need to visit, we also need to visit its neighbors.
    // Storing the iterator for each set of neighbors allows this list to be
    // computed without an additional allocation.
    let nodes = graph
        .nodes()
        .map(|node| NodeData {
            root_index: None,
            neighbors: graph.neighbors(node),
        })
        .collect::<Vec<_>>();

    TarjanScc {
        graph,
        unchecked_nodes: roots.into_iter(),
        index: 1,
        // Will hold as long as component_count is initialized to number of
        // nodes - 1 or higher.
        component_count: usize::MAX,
        nodes,
        stack: Vec::new(),
        visitation_stack: Vec::new(),
        start: None,
        index_adjustment: None,
    }
}

struct NodeData<Neighbors> {
    root_index: Option<NonZeroUsize>,
    neighbors: Neighbors,
}

/// State for computing the *strongly connected components* using Tarjan's
/// algorithm, held between `next` calls of the iterator.
struct TarjanScc<'graph, N, AllNodes, Neighbors>
where
    N: GraphKey,
    AllNodes: Iterator<Item = N>,
    Neighbors: Iterator<Item = N>,
{
    graph: &'graph DiGraph<N>,
    /// Nodes of the graph which may not have been visited yet.
    unchecked_nodes: AllNodes,
    /// The index of the next SCC.
    index: usize,
    /// A count of potentially remaining SCCs.
    component_count: usize,
    /// Per-node: a possible SCC index and an iterator of possibly unvisited
    /// neighbors.
    nodes: Vec<NodeData<Neighbors>>,
    /// A stack of nodes where an SCC will be found starting at its top.
    stack: Vec<N>,
    /// Nodes that need to be visited to determine which SCC they belong to.
    visitation_stack: Vec<(N, bool)>,
    /// An index into `stack` indicating the starting point of an SCC.
    start: Option<usize>,
    /// An adjustment to `index` applied once the current SCC is found.
    index_adjustment: Option<usize>,
}

impl<'graph, N, A, Neighbors> TarjanScc<'graph, N, A, Neighbors>
where
    N: GraphKey,
    A: Iterator<Item = N>,
    Neighbors: Iterator<Item = N>,
{
    /// Returns `Some` for each strongly connected component (scc).
    fn next_scc(&mut self) -> Option<&[N]> {
        // Cleanup from a possible previous iteration.
        if let (Some(start), Some(index_adjustment)) =
            (self.start.take(), self.index_adjustment.take())
        {
            self.stack.truncate(start);
            self.index -= index_adjustment;
            self.component_count -= 1;
        }

        loop {
            // If there are items on the visitation stack, then we haven't
            // finished visiting the node at the bottom of the stack yet.
            // Must visit all nodes in the stack from top to bottom before
            // visiting the next node.
            while let Some((v, v_is_local_root)) = self.visitation_stack.pop() {
                // If this visitation finds a complete SCC, return it
                // immediately.
                if let Some(start) = self.visit_once(v, v_is_local_root) {
                    return Some(&self.stack[start..]);
                }
            }

            // Get the next node to check, otherwise we're done.
            let Some(node) = self.unchecked_nodes.next() else {
                break None;
            };

            let visited = self.nodes[self.graph.to_index(node)].root_index.is_some();

            // If this node hasn't already been visited (e.g. it was the
            // neighbor of a previously checked node) add it to the
            // visitation stack.
            if !visited {
                self.visitation_stack.push((node, true));
            }
        }
    }

    // Attempt to find the starting point on the stack for a new SCC without
    // visiting neighbors. If a visitation is required, this returns `None`
    // and marks the required neighbor and the current node as in need of
    // visitation again.
    fn visit_once(&mut self, v: N, mut v_is_local_root: bool) -> Option<usize> {
        let node_v = &mut self.nodes[self.graph.to_index(v)];

        if node_v.root_index.is_none() {
            let v_index = self.index;
            node_v.root_index = NonZeroUsize::new(v_index);
            self.index += 1;
        }

        while let Some(w) = self.nodes[self.graph.to_index(v)].neighbors.next() {
            // If a neighbor hasn't been visited yet...
            if self.nodes[self.graph.to_index(w)].root_index.is_none() {
                // Push the current node and the neighbor back onto the
                // visitation stack. On the next execution of `visit_once`,
                // the neighbor will be visited.
                self.visitation_stack.push((v, v_is_local_root));
                self.visitation_stack.push((w, true));

                return None;
            }

            if self.nodes[self.graph.to_index(w)].root_index
                < self.nodes[self.graph.to_index(v)].root_index
            {
                self.nodes[self.graph.to_index(v)].root_index =
                    self.nodes[self.graph.to_index(w)].root_index;
                v_is_local_root = false;
            }
        }

        if !v_is_local_root {
            // The stack is filled up when backtracking, unlike in Tarjan's
            // original algorithm.
            self.stack.push(v);
            return None;
        }

        // Pop the stack and generate an SCC.
        let mut index_adjustment = 1;
        let c = NonZeroUsize::new(self.component_count);
        let nodes = &mut self.nodes;
        let start = self
            .stack
            .iter()
            .rposition(|&w| {
                if nodes[self.graph.to_index(v)].root_index
                    > nodes[self.graph.to_index(w)].root_index
                {
                    true
                } else {
                    nodes[self.graph.to_index(w)].root_index = c;
                    index_adjustment += 1;
                    false
                }
            })
            .map(|x| x + 1)
            .unwrap_or_default();
        nodes[self.graph.to_index(v)].root_index = c;
        self.stack.push(v);

        self.start = Some(start);
        self.index_adjustment = Some(index_adjustment);

        Some(start)
    }
}

impl<'graph, N, A, Neighbors> Iterator for TarjanScc<'graph, N, A, Neighbors>
where
    N: GraphKey,
    A: Iterator<Item = N>,
    Neighbors: Iterator<Item = N>,
{
    // It is expected that input graphs are sparse, and as such won't have
    // many large SCCs. Returning a `SmallVec` allows this iterator to skip
    // allocation in cases where that assumption holds.
    type Item = SmallVec<[N; 4]>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = SmallVec::from_slice(self.next_scc()?);
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // There can be no more than the number of nodes in a graph worth of
        // SCCs.
        (0, Some(self.nodes.len()))
    }
}
