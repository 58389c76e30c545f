//! Taxon label storage shared by a tree and its calibrations.
//!
//! - [LeafLabelMap]: bidirectional mapping between taxon labels and compact
//!   [LabelIndex] values stored in leaves.

use std::collections::HashMap;
use std::fmt;

/// Index of a label in a [LeafLabelMap].
pub type LabelIndex = usize;

// =#========================================================================#=
// LEAF LABEL MAP
// =#========================================================================#=
/// Maps taxon labels (strings) to compact indices.
///
/// Leaves of a [DatedTree](crate::model::DatedTree) only store a
/// [LabelIndex]; calibrations name their clades by taxon label and are
/// resolved through this map. Labels are deduplicated: inserting the same
/// label twice returns the same index.
///
/// # Example
/// ```
/// use caldate::model::LeafLabelMap;
///
/// let mut labels = LeafLabelMap::new(3);
///
/// let idx_kea = labels.get_or_insert("Nestor notabilis");
/// let idx_kaka = labels.get_or_insert("Nestor meridionalis");
/// let idx_kea_again = labels.get_or_insert("Nestor notabilis");
///
/// assert_eq!(idx_kea, idx_kea_again);
/// assert_ne!(idx_kea, idx_kaka);
/// assert_eq!(labels.get_label(idx_kaka), Some("Nestor meridionalis"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LeafLabelMap {
    /// List of unique labels, position is the label index
    labels: Vec<String>,
    /// Map from label to its index
    map: HashMap<String, LabelIndex>,
}

impl LeafLabelMap {
    /// Creates a new [LeafLabelMap] with pre-allocated capacity.
    ///
    /// # Arguments
    /// * `num_leaves` - Expected number of unique leaf labels
    pub fn new(num_leaves: usize) -> Self {
        LeafLabelMap {
            labels: Vec::with_capacity(num_leaves),
            map: HashMap::with_capacity(num_leaves),
        }
    }

    /// Gets the index for a label, inserting it if it doesn't exist.
    pub fn get_or_insert(&mut self, label: &str) -> LabelIndex {
        if let Some(&index) = self.map.get(label) {
            return index;
        }

        let index = self.labels.len();
        self.labels.push(label.to_string());
        self.map.insert(label.to_string(), index);
        index
    }

    /// Retrieves the index for a given label, `None` if unknown.
    pub fn get_index(&self, label: &str) -> Option<LabelIndex> {
        self.map.get(label).copied()
    }

    /// Retrieves the label for a given index, `None` if out of range.
    pub fn get_label(&self, index: LabelIndex) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Checks if a label exists in the map.
    pub fn contains_label(&self, label: &str) -> bool {
        self.map.contains_key(label)
    }

    /// Returns the number of labels currently stored.
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Returns the stored labels in index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Looks up every label of a clade.
    ///
    /// # Returns
    /// * `Ok(indices)` - Label indices in the order of `taxa`
    /// * `Err(label)` - The first label that is not part of this map
    pub fn indices_of<S: AsRef<str>>(&self, taxa: &[S]) -> Result<Vec<LabelIndex>, String> {
        taxa.iter()
            .map(|taxon| {
                self.get_index(taxon.as_ref())
                    .ok_or_else(|| taxon.as_ref().to_string())
            })
            .collect()
    }
}

impl fmt::Display for LeafLabelMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "LeafLabelMap ({} labels):", self.labels.len())?;
        for (idx, label) in self.labels.iter().enumerate() {
            writeln!(f, "  [{}] {}", idx, label)?;
        }
        Ok(())
    }
}

impl std::ops::Index<LabelIndex> for LeafLabelMap {
    type Output = str;

    fn index(&self, index: LabelIndex) -> &Self::Output {
        &self.labels[index]
    }
}
