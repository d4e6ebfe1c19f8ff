use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use super::{DiGraph, GraphKey};

/// Returns all elementary circuits of a directed graph.
///
/// The algorithm implemented comes from
/// ["Finding all the elementary circuits of a directed graph"][1] by D. B.
/// Johnson. Self-loops are reported as length-1 cycles. Every cycle is
/// rotated so its smallest node comes first and the result is sorted, so
/// the output is stable across insertion orders.
///
/// [1]: https://doi.org/10.1137/0204007
pub fn simple_cycles<N: GraphKey>(graph: &DiGraph<N>) -> Vec<Vec<N>> {
    let mut cycles = vec![];

    // Self-loops won't surface from the SCC seeding below (a single node is
    // a component of one), so collect them up front.
    let mut loops: Vec<N> = graph
        .nodes()
        .filter(|&n| graph.contains_edge(n, n))
        .collect();
    loops.sort_unstable();
    cycles.extend(loops.into_iter().map(|n| vec![n]));

    let mut sccs: Vec<SmallVec<[N; 4]>> =
        graph.iter_sccs().filter(|scc| scc.len() > 1).collect();

    while let Some(mut scc) = sccs.pop() {
        // only look at nodes and edges in this strongly-connected component
        let mut subgraph = DiGraph::default();
        for &node in &scc {
            subgraph.add_node(node);
        }

        for &node in &scc {
            for successor in graph.neighbors(node) {
                // self edges were already reported above
                if successor != node && subgraph.contains_node(successor) {
                    subgraph.add_edge(node, successor);
                }
            }
        }

        // path of nodes that may form a cycle
        let mut path = Vec::with_capacity(subgraph.node_count());
        // we mark nodes as "blocked" to avoid finding permutations of the
        // same cycles
        let mut blocked: HashSet<N> = HashSet::with_capacity(subgraph.node_count());
        // connects nodes along path segments that can't be part of a cycle
        // (given current root); those nodes can be unblocked at the same
        // time
        let mut unblock_together: HashMap<N, HashSet<N>> =
            HashMap::with_capacity(subgraph.node_count());
        // stack for unblocking nodes
        let mut unblock_stack = Vec::with_capacity(subgraph.node_count());
        // nodes can be involved in multiple cycles
        let mut maybe_in_more_cycles: HashSet<N> =
            HashSet::with_capacity(subgraph.node_count());
        // stack for DFS
        let mut stack = Vec::with_capacity(subgraph.node_count());

        // we're going to look for all cycles that begin and end at this node
        let root = scc.pop().unwrap();
        // start a path at the root
        path.clear();
        path.push(root);
        // mark this node as blocked
        blocked.insert(root);

        // DFS
        stack.clear();
        stack.push((root, subgraph.neighbors(root).peekable()));
        while !stack.is_empty() {
            let &mut (ref node, ref mut successors) = stack.last_mut().unwrap();
            if let Some(next) = successors.next() {
                if next == root {
                    // found a cycle
                    maybe_in_more_cycles.extend(path.iter());
                    cycles.push(path.clone());
                } else if !blocked.contains(&next) {
                    // first time seeing `next` on this path
                    maybe_in_more_cycles.remove(&next);
                    path.push(next);
                    blocked.insert(next);
                    stack.push((next, subgraph.neighbors(next).peekable()));
                    continue;
                } else {
                    // not first time seeing `next` on this path
                }
            }

            if successors.peek().is_none() {
                if maybe_in_more_cycles.contains(node) {
                    unblock_stack.push(*node);
                    // unblock this node's ancestors
                    while let Some(n) = unblock_stack.pop() {
                        if blocked.remove(&n) {
                            let unblock_predecessors =
                                unblock_together.entry(n).or_default();
                            unblock_stack.extend(unblock_predecessors.iter());
                            unblock_predecessors.clear();
                        }
                    }
                } else {
                    // if its descendants can be unblocked later, this node
                    // will be too
                    for successor in subgraph.neighbors(*node) {
                        unblock_together
                            .entry(successor)
                            .or_default()
                            .insert(*node);
                    }
                }

                // remove node from path and DFS stack
                path.pop();
                stack.pop();
            }
        }

        drop(stack);

        // remove node from subgraph
        subgraph.remove_node(root);

        // divide remainder into smaller SCCs
        sccs.extend(subgraph.iter_sccs().filter(|scc| scc.len() > 1));
    }

    for cycle in &mut cycles {
        rotate_to_min(cycle);
    }
    cycles.sort();
    cycles
}

/// Returns every simple cycle that uses the edge `a -> b` exactly once.
///
/// Each result is listed in traversal order starting from the cycle's
/// smallest node; a self-loop `a -> a` yields `[a]`. Returns an empty list
/// when the edge is absent.
pub fn cycles_through<N: GraphKey>(graph: &DiGraph<N>, a: N, b: N) -> Vec<Vec<N>> {
    if !graph.contains_edge(a, b) {
        return vec![];
    }
    if a == b {
        return vec![vec![a]];
    }

    // Every cycle through a->b is the edge followed by a simple path b->a,
    // so enumerate those paths with a backtracking DFS.
    let mut cycles = vec![];
    let mut path = vec![b];
    let mut on_path: HashSet<N> = HashSet::from([a, b]);
    let mut stack = vec![graph.neighbors(b)];

    while !stack.is_empty() {
        let successors = stack.last_mut().unwrap();
        if let Some(next) = successors.next() {
            if next == a {
                let mut cycle = Vec::with_capacity(path.len() + 1);
                cycle.push(a);
                cycle.extend(path.iter().copied());
                rotate_to_min(&mut cycle);
                cycles.push(cycle);
            } else if !on_path.contains(&next) {
                on_path.insert(next);
                path.push(next);
                stack.push(graph.neighbors(next));
            }
        } else {
            let done = path.pop().unwrap();
            if done != b {
                on_path.remove(&done);
            }
            stack.pop();
        }
    }

    cycles.sort();
    cycles
}

/// Rotate a cycle in place so that its smallest node comes first, keeping
/// the traversal direction.
fn rotate_to_min<N: GraphKey>(cycle: &mut [N]) {
    if cycle.is_empty() {
        return;
    }
    let min_at = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, n)| **n)
        .map(|(i, _)| i)
        .unwrap();
    cycle.rotate_left(min_at);
}
