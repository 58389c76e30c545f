//! Calibration-constrained time prior of a ranked, dated tree.
//!
//! The pieces build on each other:
//! * [calibration] - calibrations and their binding to vertices
//! * [bounds] - prior windows propagated along the rank order, plus the
//!   consistency and time-constraint checks
//! * [splits] - split intervals of the time axis
//! * [birth_death] - the birth-death integral `J` of one interval
//! * [sum_product] - exact probability of the ranked topology
//! * [regraft] - calibration-aware regraft targets for SPR moves
//!
//! [DatingContext] owns a tree together with its calibrations, rates and
//! bounds, and is what a sampler talks to.

pub mod birth_death;
pub mod bounds;
pub mod calibration;
pub mod error;
pub mod regraft;
pub mod splits;
pub mod sum_product;
pub mod tolerance;

pub use birth_death::{birth_death_density, BirthDeath};
pub use bounds::{check_calibration_consistency, check_prior_windows, check_time_constraints, PriorBounds};
pub use calibration::{Calibration, CalibrationStore};
pub use error::{DatingError, ErrorKind};
pub use regraft::regraft_targets;
pub use splits::{SplitAccess, SplitIntervals};
pub use sum_product::RankedSumProduct;

use crate::config::DatingConfig;
use crate::model::{DatedTree, LeafLabelMap, VertexIndex};
use crate::newick;
use tracing::{info, warn};

// =#========================================================================#=
// DATING CONTEXT
// =#========================================================================#=
/// A dated tree with calibrations and birth-death rates.
///
/// Bounds are derived state: every mutation goes through the context,
/// which recomputes them instead of patching.
///
/// # Example
/// ```
/// use caldate::config::DatingConfig;
/// use caldate::dating::DatingContext;
///
/// let config = DatingConfig::from_json_str(r#"{
///     "calibrations": [{ "clade_id": "AB", "taxa": ["A", "B"], "lower": -2.0, "upper": -0.5 }]
/// }"#).unwrap();
/// let mut ctx = DatingContext::from_newick("((A:1,B:1):2,(C:2,D:2):1);", &config).unwrap();
///
/// ctx.check_consistency().unwrap();
/// let p = ctx.compute_ranked_prior_probability().unwrap();
/// assert!(p > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct DatingContext {
    tree: DatedTree,
    labels: LeafLabelMap,
    calibrations: CalibrationStore,
    rates: BirthDeath,
    bounds: PriorBounds,
}

impl DatingContext {
    /// Creates a context, binds the calibrations and propagates bounds.
    ///
    /// # Errors
    /// Configuration errors from validation, binding or rates, and
    /// [DatingError::ContradictoryCalibrations] so that contradicting
    /// calibrations abort before sampling starts.
    pub fn new(tree: DatedTree, labels: LeafLabelMap, config: &DatingConfig) -> Result<Self, DatingError> {
        config.validate()?;
        let rates = config.rates()?;
        let calibrations = CalibrationStore::new(config.to_calibrations(), config.max_calibrations_per_node)?;
        let bounds = PriorBounds::neutral(tree.num_vertices());

        let mut ctx = DatingContext {
            tree,
            labels,
            calibrations,
            rates,
            bounds,
        };
        ctx.propagate_bounds()?;
        check_calibration_consistency(&ctx.tree, &ctx.calibrations)?;

        info!(
            num_leaves = ctx.tree.num_leaves(),
            num_calibrations = ctx.calibrations.len(),
            birth = rates.birth(),
            death = rates.death(),
            "dating context ready"
        );
        Ok(ctx)
    }

    /// Reads the tree from a dated Newick string, see [newick::parse_dated_str].
    pub fn from_newick(newick: &str, config: &DatingConfig) -> Result<Self, DatingError> {
        let (tree, labels) = newick::parse_dated_str(newick)?;
        Self::new(tree, labels, config)
    }

    /// Re-binds calibrations, re-ranks the tree and recomputes all prior
    /// windows.
    pub fn propagate_bounds(&mut self) -> Result<&PriorBounds, DatingError> {
        self.calibrations.resolve(&self.tree, &self.labels)?;
        self.tree.update_node_ordering();
        self.bounds = PriorBounds::propagate(&self.tree, &self.calibrations);
        Ok(&self.bounds)
    }

    /// Checks calibration consistency, then that no window is empty and
    /// all times respect their windows.
    ///
    /// # Errors
    /// * [DatingError::ContradictoryCalibrations] (fatal)
    /// * [DatingError::InconsistentPriorWindow],
    ///   [DatingError::TimeConstraintViolation] (recoverable)
    pub fn check_consistency(&self) -> Result<(), DatingError> {
        check_calibration_consistency(&self.tree, &self.calibrations)?;
        check_prior_windows(&self.tree, &self.bounds)?;
        check_time_constraints(&self.tree, &self.bounds)
    }

    /// Probability of the ranked topology under the calibrated birth-death
    /// prior. Bounds are recomputed first.
    ///
    /// # Errors
    /// Contradicting calibrations are reported as the fatal
    /// [DatingError::ContradictoryCalibrations] before any empty window can
    /// surface as the recoverable [DatingError::EmptyPriorWindow].
    pub fn compute_ranked_prior_probability(&mut self) -> Result<f64, DatingError> {
        self.propagate_bounds()?;
        check_calibration_consistency(&self.tree, &self.calibrations)?;
        let splits = SplitIntervals::from_bounds(&self.tree, &self.bounds);
        let total = RankedSumProduct::new(&self.tree, &self.bounds, &splits, self.rates).total()?;
        if total == 0.0 {
            warn!("ranked topology has zero prior probability");
        }
        Ok(total)
    }

    /// Natural log of [compute_ranked_prior_probability](Self::compute_ranked_prior_probability),
    /// `-inf` for zero probability.
    pub fn ranked_log_prior(&mut self) -> Result<f64, DatingError> {
        let total = self.compute_ranked_prior_probability()?;
        Ok(if total > 0.0 { total.ln() } else { f64::NEG_INFINITY })
    }

    /// Vertices above which the subtree at `prune_daughter` may be
    /// regrafted after pruning it with its parent `prune`.
    pub fn enumerate_regraft_targets(
        &self,
        prune: VertexIndex,
        prune_daughter: VertexIndex,
    ) -> Result<Vec<VertexIndex>, DatingError> {
        regraft_targets(&self.tree, &self.calibrations, prune, prune_daughter)
    }

    /// Moves an internal vertex to a new time, then re-ranks and recomputes
    /// the bounds.
    ///
    /// # Errors
    /// [DatingError::InvalidTime] if the vertex is a leaf, the time is not
    /// finite or lies in the future, or the vertex would not be strictly
    /// younger than its parent and older than its children.
    pub fn set_time(&mut self, node: VertexIndex, time: f64) -> Result<(), DatingError> {
        let invalid = |reason: &str| DatingError::InvalidTime {
            node,
            time,
            reason: reason.to_string(),
        };
        if node >= self.tree.num_vertices() {
            return Err(invalid("no such vertex"));
        }
        if self.tree[node].is_leaf() {
            return Err(invalid("leaves stay at the present"));
        }
        if !time.is_finite() || time > 0.0 {
            return Err(invalid("time must be finite and not in the future"));
        }
        if self.tree.parent(node).is_some_and(|p| self.tree.time(p) >= time) {
            return Err(invalid("vertex must be younger than its parent"));
        }
        if let Some((left, right)) = self.tree.children(node) {
            if self.tree.time(left) <= time || self.tree.time(right) <= time {
                return Err(invalid("vertex must be older than its children"));
            }
        }

        self.tree.set_time(node, time);
        self.tree.update_node_ordering();
        self.bounds = PriorBounds::propagate(&self.tree, &self.calibrations);
        Ok(())
    }

    pub fn set_rates(&mut self, rates: BirthDeath) {
        self.rates = rates;
    }

    pub fn tree(&self) -> &DatedTree {
        &self.tree
    }

    pub fn labels(&self) -> &LeafLabelMap {
        &self.labels
    }

    pub fn calibrations(&self) -> &CalibrationStore {
        &self.calibrations
    }

    pub fn bounds(&self) -> &PriorBounds {
        &self.bounds
    }

    pub fn rates(&self) -> BirthDeath {
        self.rates
    }

    /// Leaf with the given taxon label.
    pub fn leaf(&self, taxon: &str) -> Option<VertexIndex> {
        self.labels
            .get_index(taxon)
            .and_then(|label| self.tree.leaf_with_label(label))
    }

    /// Writes the current tree as dated Newick string.
    pub fn to_newick(&self) -> String {
        newick::to_newick(&self.tree, &self.labels)
    }
}
