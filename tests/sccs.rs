mod common;
use common::*;
use mlgraph::prelude::*;

fn scenario() -> MultilevelGraph<i64> {
    let mut mlg = mlg(
        &[1, 2, 3, 4, 5],
        &[(1, 2), (2, 3), (3, 1), (3, 4), (4, 5)],
    );
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg
}

#[test]
fn initial_contraction() {
    init_logs();
    let mut mlg = scenario();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3], vec![4], vec![5]]
    );
    assert_eq!(
        edge_sigs(&mut mlg, 1),
        vec![
            (vec![1, 2, 3], vec![4], vec![(3, 4)]),
            (vec![4], vec![5], vec![(4, 5)]),
        ]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn closing_edge_collapses_everything() {
    init_logs();
    let mut mlg = scenario();
    mlg.graph(1).unwrap();

    mlg.add_edge(5, 3).unwrap();
    let level1 = mlg.get_graph(1).unwrap();
    assert_eq!(level1.node_count(), 1);
    assert_eq!(level1.edge_count(), 0);
    let only = level1.nodes().next().unwrap();
    assert_eq!(only.dec().node_count(), 5);
    assert_eq!(only.dec().edge_count(), 6);
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn removing_the_closing_edge_reverts() {
    init_logs();
    let mut mlg = scenario();
    let before = mlg.level_signature(1).unwrap();

    mlg.add_edge(5, 3).unwrap();
    mlg.graph(1).unwrap();
    mlg.remove_edge(5, 3).unwrap();

    assert_eq!(mlg.level_signature(1).unwrap(), before);
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn partial_merge_keeps_outsiders() {
    init_logs();
    // 4 -> 2 closes a cycle through {1,2,3} and {4} but not {5}
    let mut mlg = scenario();
    mlg.graph(1).unwrap();

    mlg.add_edge(4, 2).unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3, 4], vec![5]]
    );
    assert_eq!(
        edge_sigs(&mut mlg, 1),
        vec![(vec![1, 2, 3, 4], vec![5], vec![(4, 5)])]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn intra_edge_addition_changes_nothing() {
    init_logs();
    let mut mlg = scenario();
    let before = mlg.level_signature(1).unwrap();

    mlg.add_edge(1, 3).unwrap();
    assert_eq!(level1_partition(&mut mlg), vec![vec![1, 2, 3], vec![4], vec![5]]);
    // the chord shows up inside the supernode
    let level1 = mlg.get_graph(1).unwrap();
    let sets = mlg.get_component_sets(1).unwrap();
    let triple = sets.iter().find(|s| s.len() == 3).unwrap();
    let u = level1.node(NodeKey::Comp(triple.id())).unwrap();
    assert!(u
        .dec()
        .contains_edge((NodeKey::Base(1), NodeKey::Base(3))));
    assert_ne!(mlg.level_signature(1).unwrap(), before); // dec grew
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn intra_removal_splits_the_component() {
    init_logs();
    let mut mlg = scenario();
    mlg.graph(1).unwrap();

    mlg.remove_edge(2, 3).unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1], vec![2], vec![3], vec![4], vec![5]]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn intra_removal_without_disconnect_keeps_the_set() {
    init_logs();
    let mut mlg = mlg(&[1, 2, 3], &[(1, 2), (2, 3), (3, 1), (1, 3)]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg.graph(1).unwrap();

    // the chord is redundant for strong connectivity
    mlg.remove_edge(1, 3).unwrap();
    assert_eq!(level1_partition(&mut mlg), vec![vec![1, 2, 3]]);
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn node_lifecycle() {
    init_logs();
    let mut mlg = scenario();
    mlg.graph(1).unwrap();

    mlg.add_node(6).unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3], vec![4], vec![5], vec![6]]
    );

    mlg.remove_edge(4, 5).unwrap();
    mlg.remove_node(5).unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3], vec![4], vec![6]]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn matches_fresh_rebuild_after_edits() {
    init_logs();
    let mut mlg = scenario();
    mlg.graph(1).unwrap();

    mlg.add_edge(5, 3).unwrap();
    mlg.graph(1).unwrap();
    mlg.add_node(6).unwrap();
    mlg.add_edge(5, 6).unwrap();
    mlg.graph(1).unwrap();
    mlg.remove_edge(3, 4).unwrap();
    mlg.graph(1).unwrap();

    let mut fresh = common::mlg(
        &[1, 2, 3, 4, 5, 6],
        &[(1, 2), (2, 3), (3, 1), (4, 5), (5, 3), (5, 6)],
    );
    fresh
        .append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    assert_same_structure(&mut mlg, &mut fresh);
    assert_level_invariants(&mut mlg, 1);
}
