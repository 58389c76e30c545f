//! Regraft targets of a calibration-aware subtree prune and regraft move.
//!
//! The subtree below `prune_daughter` is cut together with its parent
//! `prune` and re-attached on top of one of the returned vertices, i.e. on
//! the edge from a target to its parent.

use crate::dating::calibration::CalibrationStore;
use crate::dating::error::DatingError;
use crate::model::{DatedTree, VertexIndex};
use tracing::debug;

/// Lists the vertices above which the pruned subtree may be regrafted
/// without breaking a calibration, in pre-order.
///
/// 1. Among the calibrations bound on the path from `prune` to the root
///    whose clade contains `prune_daughter`, the largest lower bound
///    `maxmin` must lie before `time(prune)`.
/// 2. Candidates are the subtree of the oldest ancestor of
///    `prune_daughter` (itself included) whose parent is not older than
///    `maxmin`.
/// 3. Excluded are: in the sibling subtree below every calibrated
///    ancestor, vertices younger than the calibration's upper bound whose
///    parent is too; vertices younger than `prune_daughter` whose parent
///    is too; the pruned subtree; `prune` and the root.
///
/// # Errors
/// * [DatingError::InvalidPruneEdge] if `prune` is not the parent of
///   `prune_daughter`
/// * [DatingError::TimeConstraintViolation] if `prune` is not younger than
///   `maxmin`
///
/// # Example
/// ```
/// use caldate::dating::{regraft_targets, CalibrationStore};
/// use caldate::newick::parse_dated_str;
///
/// let (tree, labels) = parse_dated_str("((A:1,B:1):2,(C:2,D:2):1);").unwrap();
/// let a = tree.leaf_with_label(labels.get_index("A").unwrap()).unwrap();
/// let prune = tree.parent(a).unwrap();
///
/// let targets = regraft_targets(&tree, &CalibrationStore::empty(), prune, a).unwrap();
/// assert!(!targets.contains(&prune));
/// assert!(!targets.contains(&a));
/// assert!(!targets.contains(&tree.root_index()));
/// ```
pub fn regraft_targets(
    tree: &DatedTree,
    store: &CalibrationStore,
    prune: VertexIndex,
    prune_daughter: VertexIndex,
) -> Result<Vec<VertexIndex>, DatingError> {
    let num_vertices = tree.num_vertices();
    if prune >= num_vertices || prune_daughter >= num_vertices || tree.parent(prune_daughter) != Some(prune) {
        return Err(DatingError::InvalidPruneEdge { prune, prune_daughter });
    }

    let mut maxmin = f64::NEG_INFINITY;
    for n in tree.path_to_root(prune) {
        for cal in store.on_node(n) {
            let affected = cal
                .target_tips()
                .iter()
                .any(|&tip| tree.is_ancestor_or_self(prune_daughter, tip));
            if affected {
                maxmin = maxmin.max(cal.lower());
            }
        }
    }
    if !(maxmin < tree.time(prune)) {
        return Err(DatingError::TimeConstraintViolation {
            node: prune,
            time: tree.time(prune),
            min: maxmin,
            max: 0.0,
        });
    }

    let mut apical = prune_daughter;
    while let Some(parent) = tree.parent(apical) {
        if tree.time(parent) < maxmin {
            break;
        }
        apical = parent;
    }

    let mut out = vec![false; num_vertices];
    for n in tree.path_to_root(prune_daughter) {
        let (Some(parent), Some(sibling)) = (tree.parent(n), tree.sibling(n)) else {
            continue;
        };
        for cal in store.on_node(parent) {
            exclude_younger_with_parent(tree, sibling, cal.upper(), &mut out);
        }
    }
    if let Some((left, right)) = tree.children(tree.root_index()) {
        let limit = tree.time(prune_daughter);
        exclude_younger_with_parent(tree, left, limit, &mut out);
        exclude_younger_with_parent(tree, right, limit, &mut out);
    }
    for v in tree.pre_order_from(prune_daughter) {
        out[v] = true;
    }
    out[prune] = true;
    out[tree.root_index()] = true;

    let targets: Vec<VertexIndex> = tree.pre_order_from(apical).filter(|&v| !out[v]).collect();
    debug!(prune, prune_daughter, apical, maxmin, num_targets = targets.len(), "regraft targets");
    Ok(targets)
}

/// Marks every vertex of the subtree at `start` that is younger than
/// `limit` and whose parent is younger than `limit` as well.
fn exclude_younger_with_parent(tree: &DatedTree, start: VertexIndex, limit: f64, out: &mut [bool]) {
    for v in tree.pre_order_from(start) {
        let parent_younger = tree.parent(v).is_some_and(|p| tree.time(p) > limit);
        if tree.time(v) > limit && parent_younger {
            out[v] = true;
        }
    }
}
