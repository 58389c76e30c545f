//! Prior time windows of internal vertices.
//!
//! Each internal vertex gets a window `[t_prior_min, t_prior_max]` from the
//! calibrations bound to it, which is then tightened along the rank order:
//! a vertex can be no older than the oldest time allowed to any vertex
//! ranked before it, and no younger than the youngest time allowed to any
//! vertex ranked after it.

use crate::dating::calibration::CalibrationStore;
use crate::dating::error::DatingError;
use crate::model::{DatedTree, VertexIndex};
use tracing::{debug, warn};

/// Per-vertex prior windows, indexed by [VertexIndex].
///
/// Derived only: obtain fresh bounds via [PriorBounds::propagate] whenever
/// bindings, times or ranks change. Leaves hold the neutral window
/// `[-inf, 0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorBounds {
    t_prior_min: Vec<f64>,
    t_prior_max: Vec<f64>,
}

impl PriorBounds {
    /// Neutral windows `[-inf, 0]` for `num_vertices` vertices.
    pub fn neutral(num_vertices: usize) -> Self {
        PriorBounds {
            t_prior_min: vec![f64::NEG_INFINITY; num_vertices],
            t_prior_max: vec![0.0; num_vertices],
        }
    }

    /// Computes the windows from the calibrations bound in `store` and the
    /// current rank order of `tree`.
    ///
    /// Tightening for every rank pair `i < j` sets
    /// `min[rank_j] = max(min[rank_j], min[rank_i])` and
    /// `max[rank_i] = min(max[rank_i], max[rank_j])`, which amounts to a
    /// running maximum of the minima from the root down and a running
    /// minimum of the maxima from the youngest vertex up.
    ///
    /// # Example
    /// ```
    /// use caldate::dating::{Calibration, CalibrationStore, PriorBounds};
    /// use caldate::newick::parse_dated_str;
    ///
    /// let (tree, labels) = parse_dated_str("((A:1,B:1):2,(C:2,D:2):1);").unwrap();
    /// let cal = Calibration::new("AB", vec!["A".into(), "B".into()], -2.0, -1.0);
    /// let mut store = CalibrationStore::new(vec![cal], 10).unwrap();
    /// store.resolve(&tree, &labels).unwrap();
    ///
    /// let bounds = PriorBounds::propagate(&tree, &store);
    /// let root = tree.root_index();
    /// assert_eq!(bounds.t_prior_max(root), -1.0);
    /// ```
    pub fn propagate(tree: &DatedTree, store: &CalibrationStore) -> Self {
        let mut bounds = Self::neutral(tree.num_vertices());

        for &v in tree.rank() {
            for cal in store.on_node(v) {
                bounds.t_prior_max[v] = bounds.t_prior_max[v].min(cal.upper());
                bounds.t_prior_min[v] = bounds.t_prior_min[v].max(cal.lower());
            }
        }

        let rank = tree.rank();
        let mut oldest_min = f64::NEG_INFINITY;
        for &v in rank {
            oldest_min = oldest_min.max(bounds.t_prior_min[v]);
            bounds.t_prior_min[v] = oldest_min;
        }
        let mut youngest_max = 0.0_f64;
        for &v in rank.iter().rev() {
            youngest_max = youngest_max.min(bounds.t_prior_max[v]);
            bounds.t_prior_max[v] = youngest_max;
        }

        debug!(
            num_ranked = rank.len(),
            root_min = bounds.t_prior_min.get(tree.root_index()).copied().unwrap_or(f64::NEG_INFINITY),
            root_max = bounds.t_prior_max.get(tree.root_index()).copied().unwrap_or(0.0),
            "propagated prior bounds"
        );
        bounds
    }

    /// Oldest admissible time of a vertex.
    pub fn t_prior_min(&self, v: VertexIndex) -> f64 {
        self.t_prior_min[v]
    }

    /// Youngest admissible time of a vertex.
    pub fn t_prior_max(&self, v: VertexIndex) -> f64 {
        self.t_prior_max[v]
    }

    /// Returns `(t_prior_min, t_prior_max)` of a vertex.
    pub fn window(&self, v: VertexIndex) -> (f64, f64) {
        (self.t_prior_min[v], self.t_prior_max[v])
    }

    /// Returns the window of a vertex with its lower end clamped to the
    /// root time.
    pub fn clamped_window(&self, v: VertexIndex, root_time: f64) -> (f64, f64) {
        (self.t_prior_min[v].max(root_time), self.t_prior_max[v])
    }

    pub fn num_vertices(&self) -> usize {
        self.t_prior_min.len()
    }
}

/// Checks that the calibrations bound to each vertex share at least one
/// time.
///
/// Only a vertex's own calibrations are compared, so the outcome does not
/// depend on the current times or rank order.
///
/// # Errors
/// [DatingError::ContradictoryCalibrations] if the calibrations bound to
/// one vertex have no time in common (including a single inverted
/// calibration); fatal.
pub fn check_calibration_consistency(tree: &DatedTree, store: &CalibrationStore) -> Result<(), DatingError> {
    for &v in tree.rank() {
        let mut calibrations = store.on_node(v).peekable();
        if calibrations.peek().is_none() {
            continue;
        }
        let (max_lower, min_upper) = calibrations.fold((f64::NEG_INFINITY, f64::INFINITY), |(lo, up), cal| {
            (lo.max(cal.lower()), up.min(cal.upper()))
        });
        if max_lower > min_upper {
            return Err(DatingError::ContradictoryCalibrations {
                node: v,
                max_lower,
                min_upper,
            });
        }
    }
    Ok(())
}

/// Checks that no propagated window is empty.
///
/// With consistent calibrations an empty window comes from the rank order,
/// e.g. a younger-ranked vertex that must be older than an older-ranked
/// one; a sampler rejects the proposed state.
///
/// # Errors
/// [DatingError::InconsistentPriorWindow] for the first empty window in
/// rank order.
pub fn check_prior_windows(tree: &DatedTree, bounds: &PriorBounds) -> Result<(), DatingError> {
    for &v in tree.rank() {
        let (min, max) = bounds.window(v);
        if min > max {
            warn!(node = v, min, max, "empty prior window");
            return Err(DatingError::InconsistentPriorWindow { node: v, min, max });
        }
    }
    Ok(())
}

/// Checks that every non-root internal vertex lies within its window.
///
/// # Errors
/// [DatingError::TimeConstraintViolation] for the first vertex outside its
/// window; a sampler rejects the proposed state.
pub fn check_time_constraints(tree: &DatedTree, bounds: &PriorBounds) -> Result<(), DatingError> {
    for &v in tree.rank().iter().skip(1) {
        let time = tree.time(v);
        let (min, max) = bounds.window(v);
        if time > max || time < min {
            warn!(node = v, time, min, max, "time constraint violated");
            return Err(DatingError::TimeConstraintViolation { node: v, time, min, max });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_windows() {
        let bounds = PriorBounds::neutral(3);
        assert_eq!(bounds.window(1), (f64::NEG_INFINITY, 0.0));
        assert_eq!(bounds.clamped_window(1, -4.0), (-4.0, 0.0));
        assert_eq!(bounds.num_vertices(), 3);
    }
}
