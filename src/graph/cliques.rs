use std::collections::{HashMap, HashSet};

use super::{DiGraph, GraphKey};

/// Returns the maximal cliques of the undirected view of `graph`.
///
/// When `reciprocal` is set, an undirected edge {u, v} exists iff both
/// `u -> v` and `v -> u` are present; otherwise either direction suffices.
/// Self-loops are ignored. Bron-Kerbosch with pivoting; each clique is
/// sorted and the output is ordered by its smallest element, so the result
/// is stable across insertion orders.
pub fn maximal_cliques<N: GraphKey>(graph: &DiGraph<N>, reciprocal: bool) -> Vec<Vec<N>> {
    if graph.node_count() == 0 {
        return vec![];
    }
    let adjacency = undirected_view(graph, reciprocal);

    let mut out = vec![];
    let mut r = vec![];
    let p: Vec<N> = {
        let mut nodes: Vec<N> = graph.nodes().collect();
        nodes.sort_unstable();
        nodes
    };
    bron_kerbosch(&adjacency, &mut r, p, HashSet::new(), &mut out);

    for clique in &mut out {
        clique.sort_unstable();
    }
    out.sort();
    out
}

/// Undirected adjacency under the chosen edge symmetry.
pub(crate) fn undirected_view<N: GraphKey>(
    graph: &DiGraph<N>,
    reciprocal: bool,
) -> HashMap<N, HashSet<N>> {
    let mut adjacency: HashMap<N, HashSet<N>> = HashMap::with_capacity(graph.node_count());
    for n in graph.nodes() {
        adjacency.entry(n).or_default();
    }
    for (a, b) in graph.all_edges() {
        if a == b {
            continue;
        }
        if reciprocal && !graph.contains_edge(b, a) {
            continue;
        }
        adjacency.entry(a).or_default().insert(b);
        adjacency.entry(b).or_default().insert(a);
    }
    adjacency
}

fn bron_kerbosch<N: GraphKey>(
    adjacency: &HashMap<N, HashSet<N>>,
    r: &mut Vec<N>,
    p: Vec<N>,
    mut x: HashSet<N>,
    out: &mut Vec<Vec<N>>,
) {
    if p.is_empty() && x.is_empty() {
        out.push(r.clone());
        return;
    }

    // Pivot on the candidate with the most neighbors still in `p`; only
    // non-neighbors of the pivot need to be branched on.
    let pivot = p
        .iter()
        .chain(x.iter())
        .copied()
        .max_by_key(|n| adjacency[n].iter().filter(|w| p.contains(*w)).count())
        .unwrap();
    let pivot_neighbors = &adjacency[&pivot];

    let mut p = p;
    let candidates: Vec<N> = p
        .iter()
        .filter(|n| !pivot_neighbors.contains(*n))
        .copied()
        .collect();

    for v in candidates {
        let neighbors = &adjacency[&v];
        r.push(v);
        let next_p: Vec<N> = p.iter().filter(|n| neighbors.contains(*n)).copied().collect();
        let next_x: HashSet<N> =
            x.iter().filter(|n| neighbors.contains(*n)).copied().collect();
        bron_kerbosch(adjacency, r, next_p, next_x, out);
        r.pop();
        p.retain(|n| *n != v);
        x.insert(v);
    }
}
