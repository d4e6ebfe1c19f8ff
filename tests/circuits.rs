mod common;
use common::*;
use mlgraph::prelude::*;

fn scenario() -> MultilevelGraph<i64> {
    // two elementary cycles {1,2,3} and {2,4}, neither containing the other
    let mut mlg = mlg(
        &[1, 2, 3, 4],
        &[(1, 2), (2, 3), (3, 1), (2, 4), (4, 2)],
    );
    mlg.append_contraction_scheme(&ContractionScheme::circuits(true))
        .unwrap();
    mlg
}

#[test]
fn initial_contraction_keeps_both_cycles() {
    init_logs();
    let mut mlg = scenario();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3], vec![2, 4]]
    );
    assert_level_invariants(&mut mlg, 1);

    // node 2 belongs to both circuits; its home hosts it, the other set
    // still lists it
    let lower = mlg.get_graph(0).unwrap();
    assert_eq!(
        lower
            .node(NodeKey::Base(2))
            .unwrap()
            .component_sets()
            .len(),
        2
    );
}

#[test]
fn acyclic_nodes_are_singletons() {
    init_logs();
    let mut mlg = mlg(&[1, 2, 3], &[(1, 2), (2, 3)]);
    mlg.append_contraction_scheme(&ContractionScheme::circuits(true))
        .unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1], vec![2], vec![3]]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn new_edge_creates_new_circuit() {
    init_logs();
    let mut mlg = mlg(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 1), (2, 4)]);
    mlg.append_contraction_scheme(&ContractionScheme::circuits(true))
        .unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3], vec![4]]
    );

    mlg.add_edge(4, 2).unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3], vec![2, 4]]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn removed_edge_kills_its_circuits() {
    init_logs();
    let mut mlg = scenario();
    mlg.graph(1).unwrap();

    mlg.remove_edge(2, 3).unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1], vec![2, 4], vec![3]]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn maximal_swallows_subcycles() {
    init_logs();
    // the chord 3 -> 1 gives the subcycle {1,2,3} inside {1,2,3,4}
    let mut mlg = mlg(
        &[1, 2, 3, 4],
        &[(1, 2), (2, 3), (3, 4), (4, 1), (3, 1)],
    );
    mlg.append_contraction_scheme(&ContractionScheme::circuits(true))
        .unwrap();
    assert_eq!(level1_partition(&mut mlg), vec![vec![1, 2, 3, 4]]);
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn non_maximal_keeps_subcycles() {
    init_logs();
    let mut mlg = mlg(
        &[1, 2, 3, 4],
        &[(1, 2), (2, 3), (3, 4), (4, 1), (3, 1)],
    );
    mlg.append_contraction_scheme(&ContractionScheme::circuits(false))
        .unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3], vec![1, 2, 3, 4]]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn self_loop_is_a_circuit() {
    init_logs();
    let mut mlg = mlg(&[1, 2], &[(1, 1), (1, 2)]);
    mlg.append_contraction_scheme(&ContractionScheme::circuits(true))
        .unwrap();
    assert_eq!(level1_partition(&mut mlg), vec![vec![1], vec![2]]);
    // the loop lives inside the circuit supernode, not on a superedge
    assert_level_invariants(&mut mlg, 1);
    let sets = mlg.get_component_sets(1).unwrap();
    let loop_set = sets
        .iter()
        .find(|s| s.contains(NodeKey::Base(1)))
        .unwrap();
    let level1 = mlg.get_graph(1).unwrap();
    let u = level1.node(NodeKey::Comp(loop_set.id())).unwrap();
    assert!(u
        .dec()
        .contains_edge((NodeKey::Base(1), NodeKey::Base(1))));
}

#[test]
fn matches_fresh_rebuild_after_edits() {
    init_logs();
    let mut mlg = scenario();
    mlg.graph(1).unwrap();

    mlg.add_edge(3, 4).unwrap();
    mlg.graph(1).unwrap();
    mlg.remove_edge(4, 2).unwrap();
    mlg.graph(1).unwrap();
    mlg.remove_edge(1, 2).unwrap();
    mlg.graph(1).unwrap();

    let mut fresh = common::mlg(
        &[1, 2, 3, 4],
        &[(2, 3), (3, 1), (2, 4), (3, 4)],
    );
    fresh
        .append_contraction_scheme(&ContractionScheme::circuits(true))
        .unwrap();
    assert_same_structure(&mut mlg, &mut fresh);
    assert_level_invariants(&mut mlg, 1);
}
