mod common;

use caldate::dating::{
    check_calibration_consistency, check_prior_windows, regraft_targets, BirthDeath, Calibration, CalibrationStore, PriorBounds,
    RankedSumProduct, SplitIntervals,
};
use caldate::model::{DatedTree, LeafLabelMap};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Calibrations with arbitrary windows, possibly contradicting each other
/// or the current times.
fn arbitrary_calibrations(tree: &DatedTree, labels: &LeafLabelMap, count: usize, seed: u64) -> Vec<Calibration> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let internal: Vec<_> = tree.rank().to_vec();
    let span = 1.5 * tree.root_time();
    (0..count)
        .map(|i| {
            let v = internal[rng.gen_range(0..internal.len())];
            let a = span * rng.r#gen::<f64>();
            let b = span * rng.r#gen::<f64>();
            let (lower, upper) = if rng.gen_bool(0.9) { (a.min(b), a.max(b)) } else { (a.max(b), a.min(b)) };
            Calibration::new(format!("x{}", i), common::clade_taxa(tree, labels, v), lower, upper)
        })
        .collect()
}

fn resolved(tree: &DatedTree, labels: &LeafLabelMap, calibrations: Vec<Calibration>) -> CalibrationStore {
    let mut store = CalibrationStore::new(calibrations, 10).unwrap();
    store.resolve(tree, labels).unwrap();
    store
}

proptest! {
    #[test]
    fn proptest_propagation_is_idempotent(seed in 0u64..1000, n in 3usize..30, count in 0usize..8) {
        let (tree, labels) = common::random_tree(n, seed);
        let store = resolved(&tree, &labels, arbitrary_calibrations(&tree, &labels, count, seed));
        let first = PriorBounds::propagate(&tree, &store);
        let second = PriorBounds::propagate(&tree, &store);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn proptest_consistency_matches_windows(seed in 0u64..1000, n in 3usize..30, count in 1usize..8) {
        let (tree, labels) = common::random_tree(n, seed);
        let store = resolved(&tree, &labels, arbitrary_calibrations(&tree, &labels, count, seed));
        let bounds = PriorBounds::propagate(&tree, &store);
        let all_non_empty = tree.rank().iter().all(|&v| bounds.t_prior_min(v) <= bounds.t_prior_max(v));

        match check_calibration_consistency(&tree, &store) {
            Ok(()) => match check_prior_windows(&tree, &bounds) {
                Ok(()) => prop_assert!(all_non_empty),
                Err(err) => {
                    prop_assert!(!all_non_empty);
                    prop_assert!(err.is_recoverable());
                }
            },
            Err(err) => {
                prop_assert!(!all_non_empty);
                prop_assert!(!err.is_recoverable());
            }
        }
    }

    #[test]
    fn proptest_splits_are_sorted(seed in 0u64..1000, n in 3usize..30, count in 0usize..8) {
        let (tree, labels) = common::random_tree(n, seed);
        let store = resolved(&tree, &labels, common::random_calibrations(&tree, &labels, count, seed));
        let bounds = PriorBounds::propagate(&tree, &store);
        let splits = SplitIntervals::from_bounds(&tree, &bounds);

        prop_assert!(splits.boundaries().len() <= 2 * (tree.rank().len() - 1));
        for pair in splits.boundaries().windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn proptest_engine_is_positive_and_reproducible(seed in 0u64..500, n in 3usize..10, count in 0usize..4) {
        let (tree, labels) = common::random_tree(n, seed);
        let store = resolved(&tree, &labels, common::random_calibrations(&tree, &labels, count, seed));
        let bounds = PriorBounds::propagate(&tree, &store);
        let splits = SplitIntervals::from_bounds(&tree, &bounds);
        let rates = BirthDeath::new(1.0, 0.5).unwrap();

        let first = RankedSumProduct::new(&tree, &bounds, &splits, rates).total().unwrap();
        let second = RankedSumProduct::new(&tree, &bounds, &splits, rates).total().unwrap();
        prop_assert!(first > 0.0 && first.is_finite());
        prop_assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn proptest_j_is_positive(
        birth in 0.01f64..5.0,
        death_fraction in 0.0f64..1.0,
        t_min in 0.0f64..10.0,
        delta in 1e-6f64..10.0,
    ) {
        let rates = BirthDeath::new(birth, birth * death_fraction).unwrap();
        let j = rates.j(t_min, t_min + delta).unwrap();
        prop_assert!(j > 0.0 && j.is_finite());
    }

    #[test]
    fn proptest_j_has_critical_limit(birth in 0.1f64..5.0, t_min in 0.0f64..5.0, delta in 0.01f64..5.0) {
        let critical = BirthDeath::new(birth, birth).unwrap().j(t_min, t_min + delta).unwrap();
        let near = BirthDeath::new(birth, birth * (1.0 - 1e-9)).unwrap().j(t_min, t_min + delta).unwrap();
        prop_assert!(critical > 0.0 && critical.is_finite());
        prop_assert!((critical - near).abs() <= 1e-6 * critical);
    }

    #[test]
    fn proptest_regraft_exclusions(seed in 0u64..1000, n in 3usize..25, count in 0usize..6) {
        let (tree, labels) = common::random_tree(n, seed);
        let store = resolved(&tree, &labels, common::random_calibrations(&tree, &labels, count, seed));

        for prune_daughter in 0..tree.num_vertices() {
            let Some(prune) = tree.parent(prune_daughter) else { continue };
            let targets = match regraft_targets(&tree, &store, prune, prune_daughter) {
                Ok(targets) => targets,
                Err(err) => {
                    prop_assert!(err.is_recoverable());
                    continue;
                }
            };

            prop_assert!(!targets.contains(&prune));
            prop_assert!(!targets.contains(&tree.root_index()));
            for &t in &targets {
                prop_assert!(!tree.is_ancestor_or_self(prune_daughter, t));
            }
            let mut unique = targets.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), targets.len());
        }
    }
}
