//! Time calibrations on clades and their binding to tree vertices.
//!
//! * [Calibration] - bounds on the age of the last common ancestor of a
//!   set of taxa
//! * [CalibrationStore] - all calibrations of an analysis together with the
//!   vertex they are currently bound to

use crate::dating::error::DatingError;
use crate::model::{DatedTree, LeafLabelMap, VertexIndex};
use tracing::debug;

// =#========================================================================#=
// CALIBRATION
// =#========================================================================#=
/// A calibration constrains the time of the last common ancestor of a clade
/// to `[lower, upper]`.
///
/// Bounds live on the signed time axis (present `0`, past negative), so
/// `lower` is the oldest and `upper` the youngest admissible time. Use
/// [`between_ages`](Self::between_ages) to give bounds as positive ages.
///
/// The clade definition and bounds are fixed; the bound vertex and tips are
/// recomputed by [CalibrationStore::resolve] after every topology change.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    clade_id: String,
    taxa: Vec<String>,
    lower: f64,
    upper: f64,
    is_primary: bool,
    target_node: Option<VertexIndex>,
    target_tips: Vec<VertexIndex>,
}

impl Calibration {
    /// Creates a primary calibration with bounds on the time axis.
    pub fn new(clade_id: impl Into<String>, taxa: Vec<String>, lower: f64, upper: f64) -> Self {
        Calibration {
            clade_id: clade_id.into(),
            taxa,
            lower,
            upper,
            is_primary: true,
            target_node: None,
            target_tips: Vec::new(),
        }
    }

    /// Creates a primary calibration from ages before present, i.e. the
    /// clade is at least `min_age` and at most `max_age` old.
    ///
    /// # Example
    /// ```
    /// use caldate::dating::Calibration;
    ///
    /// let cal = Calibration::between_ages("Apteryx", vec!["A".into(), "B".into()], 1.0, 2.0);
    /// assert_eq!(cal.lower(), -2.0);
    /// assert_eq!(cal.upper(), -1.0);
    /// ```
    pub fn between_ages(clade_id: impl Into<String>, taxa: Vec<String>, min_age: f64, max_age: f64) -> Self {
        Self::new(clade_id, taxa, -max_age, -min_age)
    }

    /// Marks this calibration as primary or secondary for its clade.
    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    pub fn clade_id(&self) -> &str {
        &self.clade_id
    }

    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }

    /// Oldest admissible time.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Youngest admissible time.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Vertex this calibration is bound to, `None` before resolution.
    pub fn target_node(&self) -> Option<VertexIndex> {
        self.target_node
    }

    /// Leaves of the calibrated clade, empty before resolution.
    pub fn target_tips(&self) -> &[VertexIndex] {
        &self.target_tips
    }

    /// Checks that the clade lists taxa and that no bound is NaN.
    ///
    /// An inverted calibration (`lower > upper`) passes here and is
    /// reported by the consistency check once bound to a vertex.
    pub fn validate(&self) -> Result<(), DatingError> {
        let invalid = |reason: &str| DatingError::InvalidCalibration {
            clade_id: self.clade_id.clone(),
            reason: reason.to_string(),
        };
        if self.taxa.is_empty() {
            return Err(invalid("clade lists no taxa"));
        }
        if self.lower.is_nan() || self.upper.is_nan() {
            return Err(invalid("bounds must not be NaN"));
        }
        if self.lower == f64::INFINITY || self.upper == f64::NEG_INFINITY {
            return Err(invalid("bounds exclude every time"));
        }
        Ok(())
    }
}

// =#========================================================================#=
// CALIBRATION STORE
// =#========================================================================#=
/// All calibrations of an analysis and their vertex bindings.
///
/// # Example
/// ```
/// use caldate::dating::{Calibration, CalibrationStore};
/// use caldate::newick::parse_dated_str;
///
/// let (tree, labels) = parse_dated_str("((A:1,B:1):2,(C:2,D:2):1);").unwrap();
/// let cal = Calibration::new("AB", vec!["A".into(), "B".into()], -2.0, -0.5);
/// let mut store = CalibrationStore::new(vec![cal], 10).unwrap();
/// store.resolve(&tree, &labels).unwrap();
///
/// let ab = store.by_clade_id("AB").unwrap().target_node().unwrap();
/// assert_eq!(tree.time(ab), -1.0);
/// assert_eq!(store.on_node(ab).count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    calibrations: Vec<Calibration>,
    /// Per vertex, positions in `calibrations` bound to it
    node_bindings: Vec<Vec<usize>>,
    max_per_node: usize,
}

impl CalibrationStore {
    /// Default cap on the number of calibrations bound to one vertex.
    pub const DEFAULT_MAX_PER_NODE: usize = 10;

    /// Creates a store after validating every calibration.
    ///
    /// # Errors
    /// * [DatingError::InvalidCalibration] for a malformed calibration or a
    ///   clade with more than one primary calibration
    pub fn new(calibrations: Vec<Calibration>, max_per_node: usize) -> Result<Self, DatingError> {
        for (i, cal) in calibrations.iter().enumerate() {
            cal.validate()?;
            let duplicate_primary = cal.is_primary
                && calibrations[..i]
                    .iter()
                    .any(|other| other.is_primary && other.clade_id == cal.clade_id);
            if duplicate_primary {
                return Err(DatingError::InvalidCalibration {
                    clade_id: cal.clade_id.clone(),
                    reason: "clade has more than one primary calibration".to_string(),
                });
            }
        }
        Ok(CalibrationStore {
            calibrations,
            node_bindings: Vec::new(),
            max_per_node,
        })
    }

    /// Creates a store without calibrations.
    pub fn empty() -> Self {
        CalibrationStore {
            calibrations: Vec::new(),
            node_bindings: Vec::new(),
            max_per_node: Self::DEFAULT_MAX_PER_NODE,
        }
    }

    /// Binds every calibration to the last common ancestor of its taxa.
    ///
    /// Previous bindings are cleared first, so this can be re-run after
    /// every topology change.
    ///
    /// # Errors
    /// * [DatingError::UnresolvedClade] if a taxon is unknown or missing
    ///   from the tree, or the clade is not monophyletic
    /// * [DatingError::TooManyCalibrations] if more than `max_per_node`
    ///   calibrations end up on one vertex
    pub fn resolve(&mut self, tree: &DatedTree, labels: &LeafLabelMap) -> Result<(), DatingError> {
        self.node_bindings.clear();
        self.node_bindings.resize(tree.num_vertices(), Vec::new());
        for cal in &mut self.calibrations {
            cal.target_node = None;
            cal.target_tips.clear();
        }

        let mut leaf_of_label: Vec<Option<VertexIndex>> = vec![None; labels.num_labels()];
        for v in 0..tree.num_vertices() {
            if let Some(label) = tree[v].label() {
                if let Some(slot) = leaf_of_label.get_mut(label) {
                    *slot = Some(v);
                }
            }
        }

        for (position, cal) in self.calibrations.iter_mut().enumerate() {
            let unresolved = |reason: String| DatingError::UnresolvedClade {
                clade_id: cal.clade_id.clone(),
                reason,
            };

            let label_indices = labels
                .indices_of(&cal.taxa)
                .map_err(|taxon| unresolved(format!("unknown taxon '{}'", taxon)))?;
            let mut tips = label_indices
                .iter()
                .zip(&cal.taxa)
                .map(|(&label, taxon)| {
                    leaf_of_label[label].ok_or_else(|| unresolved(format!("taxon '{}' is not in the tree", taxon)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            tips.sort_unstable();
            tips.dedup();

            let target = tree
                .lca(&tips)
                .ok_or_else(|| unresolved("clade lists no taxa".to_string()))?;
            let clade_size = tree.leaves_below(target).len();
            if clade_size != tips.len() {
                return Err(unresolved(format!(
                    "taxa are not monophyletic, their last common ancestor spans {} instead of {} leaves",
                    clade_size,
                    tips.len()
                )));
            }

            let bound = &mut self.node_bindings[target];
            bound.push(position);
            if bound.len() > self.max_per_node {
                return Err(DatingError::TooManyCalibrations {
                    node: target,
                    count: bound.len(),
                    max: self.max_per_node,
                });
            }

            debug!(
                clade = %cal.clade_id,
                node = target,
                lower = cal.lower,
                upper = cal.upper,
                "bound calibration"
            );
            cal.target_node = Some(target);
            cal.target_tips = tips;
        }

        Ok(())
    }

    pub fn calibrations(&self) -> &[Calibration] {
        &self.calibrations
    }

    /// Returns the calibrations bound to a vertex, in input order.
    pub fn on_node(&self, node: VertexIndex) -> impl Iterator<Item = &Calibration> + '_ {
        self.node_bindings
            .get(node)
            .into_iter()
            .flatten()
            .map(|&position| &self.calibrations[position])
    }

    pub fn len(&self) -> usize {
        self.calibrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calibrations.is_empty()
    }

    /// Returns the primary calibration of a clade.
    pub fn by_clade_id(&self, clade_id: &str) -> Option<&Calibration> {
        self.calibrations
            .iter()
            .find(|cal| cal.is_primary && cal.clade_id == clade_id)
    }

    pub fn max_per_node(&self) -> usize {
        self.max_per_node
    }
}

impl Default for CalibrationStore {
    fn default() -> Self {
        Self::empty()
    }
}
