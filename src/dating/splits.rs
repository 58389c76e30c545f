//! Partition of the time axis into split intervals.
//!
//! The endpoints of all prior windows of non-root internal vertices are
//! sorted and coalesced into boundaries. Consecutive boundaries delimit the
//! split intervals, and every window is a union of consecutive intervals.

use crate::dating::bounds::PriorBounds;
use crate::dating::error::DatingError;
use crate::dating::tolerance::{approx_eq, approx_ge, approx_le};
use crate::model::{DatedTree, VertexIndex};
use tracing::debug;

/// Position of a split interval relative to a prior window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAccess {
    /// Interval lies after (younger than) the window; no later interval
    /// can be inside it either.
    Below,
    /// Interval lies inside the window.
    Within,
    /// Interval lies before (older than) the window.
    Above,
}

/// Sorted, coalesced boundaries; interval `i` is
/// `[boundaries[i], boundaries[i + 1]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIntervals {
    boundaries: Vec<f64>,
}

impl SplitIntervals {
    /// Builds the boundaries from the windows of all non-root internal
    /// vertices, with lower ends clamped to the root time.
    ///
    /// # Example
    /// ```
    /// use caldate::dating::{CalibrationStore, PriorBounds, SplitIntervals};
    /// use caldate::newick::parse_dated_str;
    ///
    /// let (tree, _) = parse_dated_str("((A:1,B:1):2,(C:2,D:2):1);").unwrap();
    /// let bounds = PriorBounds::propagate(&tree, &CalibrationStore::empty());
    /// let splits = SplitIntervals::from_bounds(&tree, &bounds);
    /// assert_eq!(splits.boundaries(), &[-3.0, 0.0]);
    /// assert_eq!(splits.num_intervals(), 1);
    /// ```
    pub fn from_bounds(tree: &DatedTree, bounds: &PriorBounds) -> Self {
        let root_time = tree.root_time();
        let mut values = Vec::with_capacity(2 * tree.rank().len());
        for &v in tree.rank().iter().skip(1) {
            let (lo, hi) = bounds.clamped_window(v, root_time);
            values.push(lo);
            values.push(hi);
        }
        values.sort_by(f64::total_cmp);

        let mut boundaries: Vec<f64> = Vec::with_capacity(values.len());
        for value in values {
            match boundaries.last() {
                Some(&last) if approx_eq(last, value) => {}
                _ => boundaries.push(value),
            }
        }

        debug!(?boundaries, "split intervals");
        SplitIntervals { boundaries }
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn num_intervals(&self) -> usize {
        self.boundaries.len().saturating_sub(1)
    }

    /// Returns `(older end, younger end)` of interval `i`.
    pub fn interval(&self, i: usize) -> Option<(f64, f64)> {
        Some((*self.boundaries.get(i)?, *self.boundaries.get(i + 1)?))
    }

    pub fn last_boundary(&self) -> Option<f64> {
        self.boundaries.last().copied()
    }

    /// Classifies interval `i` against the window `(lo, hi)` of `node`.
    ///
    /// # Errors
    /// * [DatingError::SplitStraddlesWindow] if the interval overlaps the
    ///   window only partially
    /// * [DatingError::SplitListExhausted] if there is no interval `i`
    pub fn classify(&self, node: VertexIndex, window: (f64, f64), i: usize) -> Result<SplitAccess, DatingError> {
        let (lo, hi) = window;
        let (a, b) = self.interval(i).ok_or_else(|| DatingError::SplitListExhausted {
            node,
            min: lo,
            max: hi,
            last_boundary: self.last_boundary().unwrap_or(f64::NAN),
        })?;

        if approx_ge(a, lo) && approx_le(b, hi) {
            Ok(SplitAccess::Within)
        } else if approx_ge(a, hi) {
            Ok(SplitAccess::Below)
        } else if approx_le(b, lo) {
            Ok(SplitAccess::Above)
        } else {
            Err(DatingError::SplitStraddlesWindow {
                node,
                interval: i,
                lower: a,
                upper: b,
                min: lo,
                max: hi,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splits(boundaries: &[f64]) -> SplitIntervals {
        SplitIntervals {
            boundaries: boundaries.to_vec(),
        }
    }

    #[test]
    fn classification() {
        let s = splits(&[-5.0, -3.0, -2.0, 0.0]);
        let window = (-3.0, -2.0);
        assert_eq!(s.classify(1, window, 0).unwrap(), SplitAccess::Above);
        assert_eq!(s.classify(1, window, 1).unwrap(), SplitAccess::Within);
        assert_eq!(s.classify(1, window, 2).unwrap(), SplitAccess::Below);
    }

    #[test]
    fn classification_is_tolerant() {
        let s = splits(&[-5.0, -3.0000001, -2.0, 0.0]);
        assert_eq!(s.classify(1, (-3.0, -2.0), 1).unwrap(), SplitAccess::Within);
        assert_eq!(s.classify(1, (-3.0, -2.0), 0).unwrap(), SplitAccess::Above);
    }

    #[test]
    fn straddling_interval_is_an_invariant_error() {
        let s = splits(&[-5.0, -1.0, 0.0]);
        let err = s.classify(4, (-3.0, -2.0), 0).unwrap_err();
        assert!(matches!(err, DatingError::SplitStraddlesWindow { node: 4, .. }));
    }

    #[test]
    fn out_of_range_interval() {
        let s = splits(&[-5.0, 0.0]);
        assert_eq!(s.interval(1), None);
        assert!(matches!(
            s.classify(2, (-5.0, 0.0), 1),
            Err(DatingError::SplitListExhausted { .. })
        ));
    }
}
