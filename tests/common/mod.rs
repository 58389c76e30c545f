#![allow(dead_code)]

use caldate::dating::Calibration;
use caldate::model::{DatedTree, LeafLabelMap, VertexIndex};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Random ultrametric tree with leaves `t0`, `t1`, ... built by joining
/// random pairs at strictly decreasing times.
pub fn random_tree(num_leaves: usize, seed: u64) -> (DatedTree, LeafLabelMap) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut labels = LeafLabelMap::new(num_leaves);
    let mut tree = DatedTree::new(num_leaves);

    let mut active: Vec<VertexIndex> = (0..num_leaves)
        .map(|i| {
            let label = labels.get_or_insert(&format!("t{}", i));
            tree.add_leaf(label)
        })
        .collect();

    let mut time = 0.0;
    while active.len() > 1 {
        time -= 0.05 + rng.r#gen::<f64>();
        let left = active.swap_remove(rng.gen_range(0..active.len()));
        let right = active.swap_remove(rng.gen_range(0..active.len()));
        let joined = if active.is_empty() {
            tree.add_root((left, right), time)
        } else {
            tree.add_internal((left, right), time)
        };
        active.push(joined);
    }

    (tree, labels)
}

/// Taxa of the clade below `v`.
pub fn clade_taxa(tree: &DatedTree, labels: &LeafLabelMap, v: VertexIndex) -> Vec<String> {
    tree.leaves_below(v)
        .into_iter()
        .filter_map(|leaf| tree[leaf].label())
        .map(|label| labels[label].to_string())
        .collect()
}

/// Up to `count` calibrations on random non-root internal vertices, each
/// containing the vertex's current time.
pub fn random_calibrations(
    tree: &DatedTree,
    labels: &LeafLabelMap,
    count: usize,
    seed: u64,
) -> Vec<Calibration> {
    let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(7919));
    let internal: Vec<VertexIndex> = tree.rank().iter().skip(1).copied().collect();
    if internal.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|i| {
            let v = internal[rng.gen_range(0..internal.len())];
            let time = tree.time(v);
            let lower = time - rng.r#gen::<f64>() * 2.0;
            let upper = (time + rng.r#gen::<f64>() * 2.0).min(0.0);
            Calibration::new(format!("c{}", i), clade_taxa(tree, labels, v), lower, upper)
        })
        .collect()
}

/// Taxa as owned strings.
pub fn taxa(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
