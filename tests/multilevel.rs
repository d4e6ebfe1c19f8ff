mod common;
use common::*;
use mlgraph::prelude::*;

#[test]
fn empty_base_means_empty_levels() {
    init_logs();
    let mut mlg = MultilevelGraph::<i64>::new();
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg.append_contraction_scheme(&ContractionScheme::cliques(false))
        .unwrap();
    assert_eq!(mlg.height(), 2);
    for i in 0..=2 {
        let g = mlg.get_graph(i).unwrap();
        assert!(g.is_empty());
        assert_eq!(g.edge_count(), 0);
    }
}

#[test]
fn lone_node_is_a_singleton_everywhere() {
    init_logs();
    let mut mlg = mlg(&[7], &[]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg.append_contraction_scheme(&ContractionScheme::circuits(true))
        .unwrap();
    assert_eq!(node_sigs(&mut mlg, 1), vec![vec![7]]);
    assert_eq!(node_sigs(&mut mlg, 2), vec![vec![7]]);
    assert_level_invariants(&mut mlg, 1);
    assert_level_invariants(&mut mlg, 2);
}

#[test]
fn self_loops_stay_interior() {
    init_logs();
    let mut mlg = mlg(&[1, 2], &[(1, 1), (1, 2)]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    // the loop never surfaces as a superedge
    for i in 1..=2 {
        let g = mlg.get_graph(i).unwrap();
        for se in g.edges() {
            assert_ne!(se.tail(), se.head());
        }
        assert_level_invariants(&mut mlg, i);
    }
}

#[test]
fn added_isolated_node_appears_at_every_level() {
    init_logs();
    let mut mlg = mlg(&[1, 2], &[(1, 2), (2, 1)]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg.append_contraction_scheme(&ContractionScheme::cliques(false))
        .unwrap();
    mlg.graph(2).unwrap();

    mlg.add_node(6).unwrap();
    assert_eq!(node_sigs(&mut mlg, 1), vec![vec![1, 2], vec![6]]);
    assert_eq!(node_sigs(&mut mlg, 2), vec![vec![1, 2], vec![6]]);
    let g2 = mlg.get_graph(2).unwrap();
    assert_eq!(g2.edge_count(), 0);
    assert_level_invariants(&mut mlg, 1);
    assert_level_invariants(&mut mlg, 2);
}

#[test]
fn add_then_remove_is_idempotent() {
    init_logs();
    let mut mlg = mlg(
        &[1, 2, 3, 4, 5],
        &[(1, 2), (2, 3), (3, 1), (3, 4), (4, 5)],
    );
    mlg.append_contraction_scheme(&ContractionScheme::cliques(false))
        .unwrap();
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    let before: Vec<_> = (0..=2).map(|i| mlg.level_signature(i).unwrap()).collect();

    mlg.add_edge(5, 1).unwrap();
    mlg.graph(2).unwrap();
    mlg.remove_edge(5, 1).unwrap();
    mlg.graph(2).unwrap();

    for (i, sig) in before.iter().enumerate() {
        assert_eq!(&mlg.level_signature(i).unwrap(), sig, "level {i} drifted");
    }
}

#[test]
fn propagation_is_lazy() {
    init_logs();
    let mut mlg = mlg(&[1, 2, 3], &[(1, 2), (2, 3), (3, 1)]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg.graph(1).unwrap();

    // buffered, not yet propagated: the view still shows the old level
    mlg.remove_edge(2, 3).unwrap();
    assert_eq!(mlg[1].node_count(), 1);

    // the query forces it
    assert_eq!(mlg.graph(1).unwrap().node_count(), 3);
    assert_eq!(mlg[1].node_count(), 3);
}

#[test]
fn view_and_copy_agree() {
    init_logs();
    let mut mlg = mlg(&[1, 2, 3], &[(1, 2), (2, 1)]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    let copy = mlg.get_graph(1).unwrap();
    assert_eq!(&copy, &mlg[1]);

    // two queries with no edits in between are structurally equal
    let again = mlg.get_graph(1).unwrap();
    assert_eq!(copy, again);
}

#[test]
fn complete_decontraction_recovers_the_base() {
    init_logs();
    let mut mlg = mlg(
        &[1, 2, 3, 4, 5],
        &[(1, 2), (2, 3), (3, 1), (3, 4), (4, 5)],
    );
    mlg.append_contraction_scheme(&ContractionScheme::cliques(false))
        .unwrap();
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();

    for i in 0..=2 {
        let flat = mlg.complete_decontraction(i).unwrap();
        let base = mlg.get_graph(0).unwrap();
        assert_eq!(flat, base, "flattening level {i} lost structure");
    }
}

#[test]
fn stars_cover_deterministically() {
    init_logs();
    let mut mlg = mlg(&[1, 2, 3, 4, 5], &[(1, 2), (1, 3), (4, 3), (4, 5)]);
    mlg.append_contraction_scheme(&ContractionScheme::stars())
        .unwrap();
    // hub 1 takes 2 and 3; hub 4 keeps 5
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2, 3], vec![4, 5]]
    );
    assert_level_invariants(&mut mlg, 1);

    // local re-cover around the removed edge
    mlg.remove_edge(1, 3).unwrap();
    assert_eq!(
        level1_partition(&mut mlg),
        vec![vec![1, 2], vec![3], vec![4, 5]]
    );
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn appending_a_bound_scheme_is_rejected() {
    init_logs();
    let mut mlg = mlg(&[1], &[]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg.graph(1).unwrap();

    // popping the built scheme off the hierarchy and appending it again is
    // a composition error
    let bound = mlg.pop_contraction_scheme().unwrap();
    assert!(bound.is_built());
    let err = mlg.append_contraction_scheme(&bound).unwrap_err();
    assert!(matches!(err, InvalidSchemeComposition::AlreadyBound(_)));

    // an unbound clone is fine
    mlg.append_contraction_scheme(&bound.clone_unbuilt()).unwrap();
    assert_eq!(mlg.height(), 1);
}

#[test]
fn level_out_of_range() {
    init_logs();
    let mut mlg = mlg(&[1], &[]);
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    let err = mlg.graph(2).unwrap_err();
    assert!(matches!(
        err,
        MlgError::Precondition(PreconditionViolation::LevelOutOfRange(2, 1))
    ));
    let err = mlg.get_component_sets(0).unwrap_err();
    assert!(matches!(
        err,
        MlgError::Precondition(PreconditionViolation::LevelOutOfRange(0, 1))
    ));
}

#[test]
fn rebuild_recovers_the_same_structure() {
    init_logs();
    let mut mlg = mlg(
        &[1, 2, 3, 4, 5],
        &[(1, 2), (2, 3), (3, 1), (3, 4), (4, 5)],
    );
    mlg.append_contraction_scheme(&ContractionScheme::sccs())
        .unwrap();
    mlg.add_edge(5, 3).unwrap();
    let incremental = mlg.level_signature(1).unwrap();

    mlg.rebuild(1).unwrap();
    assert_eq!(mlg.level_signature(1).unwrap(), incremental);
    assert_level_invariants(&mut mlg, 1);
}

#[test]
fn scheme_names_carry_parameters() {
    let circuits: ContractionScheme<i64> = ContractionScheme::circuits(true);
    assert_eq!(circuits.name(), "circuits(maximal=true)");
    let cliques: ContractionScheme<i64> = ContractionScheme::cliques(false);
    assert_eq!(cliques.name(), "cliques(reciprocal=false)");
    let sccs: ContractionScheme<i64> = ContractionScheme::sccs();
    assert_eq!(sccs.name(), "sccs");
}

#[test]
fn attr_functions_are_applied() {
    init_logs();
    let attrs = AttrFns::default()
        .with_supernode_fn(|dec| {
            Attrs::from([("order".to_string(), AttrValue::Int(dec.node_count() as i64))])
        })
        .with_superedge_fn(|dec| {
            Attrs::from([("weight".to_string(), AttrValue::Int(dec.len() as i64))])
        })
        .with_comp_set_fn(|members| {
            Attrs::from([("size".to_string(), AttrValue::Int(members.len() as i64))])
        });
    let mut mlg = mlg(
        &[1, 2, 3, 4, 5],
        &[(1, 2), (2, 3), (3, 1), (3, 4), (4, 5)],
    );
    mlg.append_contraction_scheme(&ContractionScheme::sccs().with_attr_fns(attrs))
        .unwrap();

    let g1 = mlg.get_graph(1).unwrap();
    let sets = mlg.get_component_sets(1).unwrap();
    let triple = sets.iter().find(|s| s.len() == 3).unwrap();
    assert_eq!(triple.attrs()["size"], AttrValue::Int(3));

    let u = g1.node(NodeKey::Comp(triple.id())).unwrap();
    assert_eq!(u.attrs()["order"], AttrValue::Int(3));
    for se in g1.edges() {
        assert_eq!(se.attrs()["weight"], AttrValue::Int(se.dec().len() as i64));
    }
}
