mod common;

use caldate::dating::{regraft_targets, Calibration, CalibrationStore, DatingError};
use caldate::model::{DatedTree, LeafLabelMap, VertexIndex};
use caldate::newick::parse_dated_str;
use common::taxa;

// ABC at -2 with AB at -0.2, DEF at -3 with DE at -0.5, root at -4
const SIX_TIPS: &str = "(((A:0.2,B:0.2):1.8,C:2):2,((D:0.5,E:0.5):2.5,F:3):1);";

struct Fixture {
    tree: DatedTree,
    labels: LeafLabelMap,
}

impl Fixture {
    fn new() -> Self {
        let (tree, labels) = parse_dated_str(SIX_TIPS).unwrap();
        Fixture { tree, labels }
    }

    fn leaf(&self, taxon: &str) -> VertexIndex {
        self.tree.leaf_with_label(self.labels.get_index(taxon).unwrap()).unwrap()
    }

    fn parent_of(&self, taxon: &str) -> VertexIndex {
        self.tree.parent(self.leaf(taxon)).unwrap()
    }

    fn store(&self, calibrations: Vec<Calibration>) -> CalibrationStore {
        let mut store = CalibrationStore::new(calibrations, 10).unwrap();
        store.resolve(&self.tree, &self.labels).unwrap();
        store
    }

    fn targets(&self, store: &CalibrationStore, prune_daughter: VertexIndex) -> Vec<VertexIndex> {
        let prune = self.tree.parent(prune_daughter).unwrap();
        let mut targets = regraft_targets(&self.tree, store, prune, prune_daughter).unwrap();
        targets.sort();
        targets
    }
}

fn sorted(mut vertices: Vec<VertexIndex>) -> Vec<VertexIndex> {
    vertices.sort();
    vertices
}

#[test]
fn test_uncalibrated_tip_may_go_anywhere_else() {
    let f = Fixture::new();
    let c = f.leaf("C");
    let targets = f.targets(&CalibrationStore::empty(), c);

    let expected = sorted(vec![
        f.parent_of("A"),
        f.leaf("A"),
        f.leaf("B"),
        f.tree.parent(f.parent_of("D")).unwrap(),
        f.parent_of("D"),
        f.leaf("D"),
        f.leaf("E"),
        f.leaf("F"),
    ]);
    assert_eq!(targets, expected);
}

#[test]
fn test_calibrated_clade_excludes_upper_bound_region() {
    // prune C next to the calibrated ABC: it must stay inside ABC (lower
    // bound) and may not go below the upper bound -1.5 inside AB
    let f = Fixture::new();
    let store = f.store(vec![Calibration::new("ABC", taxa(&["A", "B", "C"]), -2.5, -1.5)]);
    let targets = f.targets(&store, f.leaf("C"));
    assert_eq!(targets, vec![f.parent_of("A")]);
}

#[test]
fn test_vertices_younger_than_pruned_subtree_are_excluded() {
    // A and B hang below AB at -0.2, which is younger than DE at -0.5
    let f = Fixture::new();
    let de = f.parent_of("D");
    let targets = f.targets(&CalibrationStore::empty(), de);

    let abc = f.tree.parent(f.parent_of("A")).unwrap();
    let expected = sorted(vec![abc, f.parent_of("A"), f.leaf("C"), f.leaf("F")]);
    assert_eq!(targets, expected);
}

#[test]
fn test_prune_outside_lower_bound_is_rejected() {
    let f = Fixture::new();
    // ABC sits at -2, older than the calibration allows
    let store = f.store(vec![Calibration::new("ABC", taxa(&["A", "B", "C"]), -1.5, -1.0)]);
    let c = f.leaf("C");
    let abc = f.parent_of("C");
    let err = regraft_targets(&f.tree, &store, abc, c).unwrap_err();
    assert!(matches!(err, DatingError::TimeConstraintViolation { node, .. } if node == abc));
    assert!(err.is_recoverable());
}

#[test]
fn test_calibration_not_containing_pruned_subtree_is_ignored() {
    // DEF is calibrated but pruning C never touches it
    let f = Fixture::new();
    let store = f.store(vec![Calibration::new("DEF", taxa(&["D", "E", "F"]), -3.5, -2.8)]);
    let with = f.targets(&store, f.leaf("C"));
    let without = f.targets(&CalibrationStore::empty(), f.leaf("C"));
    assert_eq!(with, without);
}

#[test]
fn test_invalid_prune_edge() {
    let f = Fixture::new();
    let err = regraft_targets(&f.tree, &CalibrationStore::empty(), f.parent_of("D"), f.leaf("A")).unwrap_err();
    assert!(matches!(err, DatingError::InvalidPruneEdge { .. }));
}
