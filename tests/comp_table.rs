mod common;
use common::*;
use mlgraph::prelude::*;

// The table is exercised through the cliques scheme here because overlapping
// sets (a node in several cliques) stress the index and the home choice.

#[test]
fn index_tracks_overlapping_sets() {
    // 2 and 3 sit in both triangles
    let mut mlg = mlg(
        &[1, 2, 3, 4],
        &[(1, 2), (2, 3), (3, 1), (2, 4), (4, 3)],
    );
    mlg.append_contraction_scheme(&ContractionScheme::cliques(false))
        .unwrap();

    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3], vec![2, 3, 4]]
    );
    assert_level_invariants(&mut mlg, 1);

    let sets = mlg.get_component_sets(1).unwrap();
    let containing_2: Vec<_> = sets
        .iter()
        .filter(|s| s.contains(NodeKey::Base(2)))
        .collect();
    assert_eq!(containing_2.len(), 2);

    // the home of a doubly-covered node is the lowest containing id
    let lower = mlg.get_graph(0).unwrap();
    let node2 = lower.node(NodeKey::Base(2)).unwrap();
    let lowest = *node2.component_sets().first().unwrap();
    assert_eq!(node2.supernode(), Some(NodeKey::Comp(lowest)));
}

#[test]
fn maximal_insertion_is_inclusion_maximal() {
    // circuits with maximal=true exercise add_set_maximal: the 2-cycle
    // {1, 2} is swallowed by nothing, the singleton fillers are
    let mut mlg = mlg(&[1, 2, 3], &[(1, 2), (2, 1), (2, 3)]);
    mlg.append_contraction_scheme(&ContractionScheme::circuits(true))
        .unwrap();
    assert_eq!(level1_partition(&mut mlg), vec![vec![1, 2], vec![3]]);
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn removing_a_set_uncovers_members() {
    // removing the only circuit re-covers its members as singletons
    let mut mlg = mlg(&[1, 2, 3], &[(1, 2), (2, 1), (2, 3)]);
    mlg.append_contraction_scheme(&ContractionScheme::circuits(true))
        .unwrap();
    mlg.graph(1).unwrap();

    mlg.remove_edge(2, 1).unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1], vec![2], vec![3]]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn level_state_is_inspectable() {
    let mut mlg = mlg(&[1, 2, 3], &[(1, 2), (2, 1)]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg.graph(1).unwrap();

    let level = mlg.schemes()[0].level().unwrap();
    assert_eq!(level.index(), 1);
    assert!(!level.needs_rebuild());
    assert!(level
        .table()
        .is_covering(mlg.base().node_keys()));

    // the supernode table is the level's node arena keyed by set id
    for set in level.table().sets() {
        let u = level.supernode_of_set(set.id()).unwrap();
        assert_eq!(u.dec().node_count(), set.len());
        assert_eq!(u.level(), 1);
    }
}

#[test]
fn set_identity_is_by_id() {
    let mut mlg = mlg(&[1, 2], &[(1, 2), (2, 1)]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    let sets = mlg.get_component_sets(1).unwrap();
    assert_eq!(sets.len(), 1);
    let again = mlg.get_component_sets(1).unwrap();
    assert_eq!(sets[0], again[0]);
    assert_eq!(sets[0].id(), again[0].id());
}
