mod common;

use caldate::dating::{Calibration, CalibrationStore, DatingError};
use caldate::newick::parse_dated_str;
use common::taxa;

const FOUR_TIPS: &str = "((A:1,B:1):2,(C:2,D:2):1);";

#[test]
fn test_resolve_binds_lca_and_tips() {
    let (tree, labels) = parse_dated_str(FOUR_TIPS).unwrap();
    let mut store = CalibrationStore::new(
        vec![
            Calibration::new("AB", taxa(&["B", "A"]), -2.0, -0.5),
            Calibration::new("all", taxa(&["A", "B", "C", "D"]), -10.0, -2.5),
            Calibration::new("C", taxa(&["C"]), -1.0, 0.0),
        ],
        10,
    )
    .unwrap();
    store.resolve(&tree, &labels).unwrap();

    let a = tree.leaf_with_label(labels.get_index("A").unwrap()).unwrap();
    let b = tree.leaf_with_label(labels.get_index("B").unwrap()).unwrap();
    let c = tree.leaf_with_label(labels.get_index("C").unwrap()).unwrap();
    let ab = tree.parent(a).unwrap();

    let cal_ab = store.by_clade_id("AB").unwrap();
    assert_eq!(cal_ab.target_node(), Some(ab));
    let mut tips = cal_ab.target_tips().to_vec();
    tips.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(tips, expected);

    assert_eq!(store.by_clade_id("all").unwrap().target_node(), Some(tree.root_index()));
    assert_eq!(store.by_clade_id("C").unwrap().target_node(), Some(c));
    assert_eq!(store.on_node(ab).count(), 1);
    assert_eq!(store.on_node(tree.root_index()).count(), 1);
}

#[test]
fn test_resolve_is_rerunnable() {
    let (tree, labels) = parse_dated_str(FOUR_TIPS).unwrap();
    let mut store = CalibrationStore::new(vec![Calibration::new("AB", taxa(&["A", "B"]), -2.0, -0.5)], 10).unwrap();
    store.resolve(&tree, &labels).unwrap();
    store.resolve(&tree, &labels).unwrap();

    let ab = store.by_clade_id("AB").unwrap().target_node().unwrap();
    assert_eq!(store.on_node(ab).count(), 1);
}

#[test]
fn test_resolve_follows_topology_change() {
    let (tree, labels) = parse_dated_str(FOUR_TIPS).unwrap();
    let (other, other_labels) = parse_dated_str("((A:1,C:1):2,(B:2,D:2):1);").unwrap();
    let mut store = CalibrationStore::new(vec![Calibration::new("AC", taxa(&["A", "C"]), -5.0, 0.0)], 10).unwrap();

    let err = store.resolve(&tree, &labels).unwrap_err();
    assert!(matches!(err, DatingError::UnresolvedClade { .. }));

    store.resolve(&other, &other_labels).unwrap();
    let a = other.leaf_with_label(other_labels.get_index("A").unwrap()).unwrap();
    assert_eq!(store.by_clade_id("AC").unwrap().target_node(), other.parent(a));
}

#[test]
fn test_unknown_taxon_is_unresolved() {
    let (tree, labels) = parse_dated_str(FOUR_TIPS).unwrap();
    let mut store = CalibrationStore::new(vec![Calibration::new("AX", taxa(&["A", "X"]), -2.0, 0.0)], 10).unwrap();
    match store.resolve(&tree, &labels) {
        Err(DatingError::UnresolvedClade { clade_id, reason }) => {
            assert_eq!(clade_id, "AX");
            assert!(reason.contains("'X'"));
        }
        other => panic!("expected unresolved clade, got {:?}", other),
    }
}

#[test]
fn test_per_node_cap() {
    let (tree, labels) = parse_dated_str(FOUR_TIPS).unwrap();
    let calibrations = |n: usize| {
        (0..n)
            .map(|i| Calibration::new(format!("AB{}", i), taxa(&["A", "B"]), -2.0, -0.5))
            .collect::<Vec<_>>()
    };

    let mut store = CalibrationStore::new(calibrations(3), 3).unwrap();
    store.resolve(&tree, &labels).unwrap();

    let mut store = CalibrationStore::new(calibrations(4), 3).unwrap();
    let err = store.resolve(&tree, &labels).unwrap_err();
    assert!(matches!(err, DatingError::TooManyCalibrations { count: 4, max: 3, .. }));
    assert_eq!(err.kind(), caldate::ErrorKind::Configuration);
}

#[test]
fn test_random_clades_resolve_to_their_vertex() {
    for seed in 0..10 {
        let (tree, labels) = common::random_tree(14, seed);
        let calibrations = common::random_calibrations(&tree, &labels, 5, seed);
        let expected: Vec<_> = calibrations
            .iter()
            .map(|cal| {
                let tips: Vec<_> = cal
                    .taxa()
                    .iter()
                    .map(|t| tree.leaf_with_label(labels.get_index(t).unwrap()).unwrap())
                    .collect();
                tree.lca(&tips).unwrap()
            })
            .collect();

        let mut store = CalibrationStore::new(calibrations, 10).unwrap();
        store.resolve(&tree, &labels).unwrap();
        for (cal, target) in store.calibrations().iter().zip(expected) {
            assert_eq!(cal.target_node(), Some(target));
            assert_eq!(cal.target_tips().len(), cal.taxa().len());
        }
    }
}
