#![allow(unused, reason = "Actually used across test crates")]

use std::collections::BTreeSet;

use mlgraph::prelude::*;

pub fn init_logs() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Build a hierarchy over integer keys from plain node and edge lists.
pub fn mlg(nodes: &[i64], edges: &[(i64, i64)]) -> MultilevelGraph<i64> {
    MultilevelGraph::from_parts(
        nodes.iter().map(|&k| (k, Attrs::default())),
        edges.iter().map(|&(u, v)| (u, v, Attrs::default())),
    )
    .unwrap()
}

/// The component sets covering level 0, as sorted base-key lists.
pub fn level1_partition(mlg: &mut MultilevelGraph<i64>) -> Vec<Vec<i64>> {
    let mut sets: Vec<Vec<i64>> = mlg
        .get_component_sets(1)
        .unwrap()
        .iter()
        .map(|s| {
            let mut v: Vec<i64> = s.members().iter().map(|m| m.as_base().unwrap()).collect();
            v.sort_unstable();
            v
        })
        .collect();
    sets.sort();
    sets
}

/// Node signatures of a level, flattened to a sorted list of leaf-key
/// sets.
pub fn node_sigs(mlg: &mut MultilevelGraph<i64>, i: usize) -> Vec<Vec<i64>> {
    let sig = mlg.level_signature(i).unwrap();
    let mut out = vec![];
    for ((leaves, _), count) in sig.nodes() {
        for _ in 0..*count {
            out.push(leaves.clone());
        }
    }
    out.sort();
    out
}

/// Edge signatures of a level: (tail leaves, head leaves, dec as base
/// edges), flattened to a sorted list.
pub fn edge_sigs(
    mlg: &mut MultilevelGraph<i64>,
    i: usize,
) -> Vec<(Vec<i64>, Vec<i64>, Vec<(i64, i64)>)> {
    let sig = mlg.level_signature(i).unwrap();
    let mut out = vec![];
    for (s, count) in sig.edges() {
        for _ in 0..*count {
            out.push(s.clone());
        }
    }
    out.sort();
    out
}

/// Assert every quantified invariant of a built level: coverage, supernode
/// consistency, and edge placement/aggregation.
pub fn assert_level_invariants(mlg: &mut MultilevelGraph<i64>, i: usize) {
    let upper = mlg.get_graph(i).unwrap();
    let lower = mlg.get_graph(i - 1).unwrap();
    let sets = mlg.get_component_sets(i).unwrap();

    // coverage: the sets partition-or-cover exactly the lower node set
    let mut covered: BTreeSet<NodeKey<i64>> = BTreeSet::new();
    for s in &sets {
        covered.extend(s.members().iter().copied());
    }
    let all: BTreeSet<NodeKey<i64>> = lower.node_keys().collect();
    assert_eq!(covered, all, "covering broken at level {i}");

    // supernode consistency
    for n in lower.nodes() {
        let home = n.supernode().expect("contracted node has a home");
        let u = upper.node(home).expect("home supernode exists");
        assert!(
            u.dec().contains_node(n.key()),
            "{:?} missing from its home interior",
            n.key()
        );
        let from_table: BTreeSet<CompId> = sets
            .iter()
            .filter(|s| s.contains(n.key()))
            .map(|s| s.id())
            .collect();
        assert_eq!(n.component_sets(), &from_table);
        assert_eq!(home, NodeKey::Comp(*from_table.first().unwrap()));
    }

    // edge placement
    for e in lower.edge_keys() {
        let hu = lower.node(e.0).unwrap().supernode().unwrap();
        let hv = lower.node(e.1).unwrap().supernode().unwrap();
        if hu == hv {
            let u = upper.node(hu).unwrap();
            assert!(u.dec().contains_edge(e), "intra edge {e:?} not interior");
            for se in upper.edges() {
                assert!(!se.dec().contains(&e), "intra edge {e:?} in a superedge");
            }
        } else {
            let mut hits = 0;
            for se in upper.edges() {
                if se.dec().contains(&e) {
                    assert_eq!((se.tail(), se.head()), (hu, hv));
                    hits += 1;
                }
            }
            assert_eq!(hits, 1, "crossing edge {e:?} aggregated {hits} times");
        }
    }

    // superedge aggregation is tight
    for se in upper.edges() {
        assert!(!se.dec().is_empty(), "superedge {:?} is empty", se.key());
        for &x in se.dec() {
            let hu = lower.node(x.0).unwrap().supernode().unwrap();
            let hv = lower.node(x.1).unwrap().supernode().unwrap();
            assert_eq!((hu, hv), (se.tail(), se.head()));
        }
    }
}

/// Assert two hierarchies agree on every level up to `height`.
pub fn assert_same_structure(a: &mut MultilevelGraph<i64>, b: &mut MultilevelGraph<i64>) {
    assert_eq!(a.height(), b.height());
    for i in 0..=a.height() {
        assert_eq!(
            a.level_signature(i).unwrap(),
            b.level_signature(i).unwrap(),
            "levels {i} diverge"
        );
    }
}
