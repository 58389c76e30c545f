//! Exact probability of a ranked topology under calibrations.
//!
//! Every non-root internal vertex is placed, in rank order, into one of the
//! split intervals inside its prior window. Ranks never move to an older
//! interval than their predecessor. Each placement contributes the
//! birth-death integral `J` of its interval. A run of `k` consecutive ranks
//! in the same interval is ordered within it, so the run contributes
//! `J^k / k!`. The probability is the sum over all placements.

use crate::dating::birth_death::BirthDeath;
use crate::dating::bounds::PriorBounds;
use crate::dating::error::DatingError;
use crate::dating::splits::{SplitAccess, SplitIntervals};
use crate::dating::tolerance::approx_eq;
use crate::model::{DatedTree, VertexIndex};
use tracing::debug;

/// Sum-product over placements of ranked vertices into split intervals.
///
/// # Example
/// ```
/// use caldate::dating::{BirthDeath, CalibrationStore, PriorBounds, RankedSumProduct, SplitIntervals};
/// use caldate::newick::parse_dated_str;
///
/// let (tree, _) = parse_dated_str("((A:1,B:1):2,C:3);").unwrap();
/// let bounds = PriorBounds::propagate(&tree, &CalibrationStore::empty());
/// let splits = SplitIntervals::from_bounds(&tree, &bounds);
/// let rates = BirthDeath::default();
///
/// let total = RankedSumProduct::new(&tree, &bounds, &splits, rates).total().unwrap();
/// assert_eq!(total, rates.j(0.0, 3.0).unwrap());
/// ```
#[derive(Debug)]
pub struct RankedSumProduct<'a> {
    tree: &'a DatedTree,
    bounds: &'a PriorBounds,
    splits: &'a SplitIntervals,
    rates: BirthDeath,
}

/// Partial placement carried down the ranks.
#[derive(Debug, Clone, Copy)]
struct Placement {
    /// Interval chosen for the previous rank
    interval: usize,
    /// Product of `J` terms so far, including `1/k!` of the current run
    prod: f64,
    /// Length of the current run of ranks sharing `interval`
    run: u32,
}

impl<'a> RankedSumProduct<'a> {
    pub fn new(tree: &'a DatedTree, bounds: &'a PriorBounds, splits: &'a SplitIntervals, rates: BirthDeath) -> Self {
        RankedSumProduct {
            tree,
            bounds,
            splits,
            rates,
        }
    }

    /// Computes the probability of the ranked topology.
    ///
    /// A tree with two leaves has no vertex to place and probability `1`.
    ///
    /// # Errors
    /// * [DatingError::EmptyPriorWindow] if a vertex cannot be placed at all
    /// * [DatingError::NumericalFailure] for a failing `J` or a non-finite
    ///   total
    /// * [DatingError::SplitStraddlesWindow],
    ///   [DatingError::SplitListExhausted] if the split intervals do not
    ///   fit the prior windows
    pub fn total(&self) -> Result<f64, DatingError> {
        let rank = self.tree.rank();
        if rank.len() < 2 {
            return Ok(1.0);
        }

        let windows = self.windows()?;
        let mut total = 0.0;
        self.place(
            1,
            &windows,
            Placement {
                interval: 0,
                prod: 1.0,
                run: 0,
            },
            &mut total,
        )?;

        if !total.is_finite() {
            return Err(DatingError::NumericalFailure(format!(
                "ranked prior probability is {}",
                total
            )));
        }
        debug!(total, num_ranked = rank.len() - 1, "ranked sum-product");
        Ok(total)
    }

    /// Windows of ranks `1..`, indexed by rank (entry `0` is unused).
    fn windows(&self) -> Result<Vec<(f64, f64)>, DatingError> {
        let root_time = self.tree.root_time();
        self.tree
            .rank()
            .iter()
            .enumerate()
            .map(|(r, &v)| {
                let (lo, hi) = self.bounds.clamped_window(v, root_time);
                if r > 0 && lo > hi {
                    return Err(DatingError::EmptyPriorWindow {
                        node: v,
                        rank: r,
                        min: lo,
                        max: hi,
                    });
                }
                Ok((lo, hi))
            })
            .collect()
    }

    /// Places rank `r` into every admissible interval from `prev.interval`
    /// on and recurses to the next rank. Rank 1 starts with an empty run.
    fn place(&self, r: usize, windows: &[(f64, f64)], prev: Placement, total: &mut f64) -> Result<(), DatingError> {
        let node = self.tree.rank()[r];
        let window = windows[r];
        let youngest = r + 1 == windows.len();

        for i in prev.interval.. {
            let Some((older, younger)) = self.splits.interval(i) else {
                return self.check_exhausted(node, window);
            };

            match self.splits.classify(node, window, i)? {
                SplitAccess::Above => continue,
                SplitAccess::Below => return Ok(()),
                SplitAccess::Within => {}
            }
            let j = self.rates.j(younger.abs(), older.abs())?;

            let placement = if prev.run > 0 && i == prev.interval {
                let run = prev.run + 1;
                Placement {
                    interval: i,
                    prod: prev.prod * j / f64::from(run),
                    run,
                }
            } else {
                Placement {
                    interval: i,
                    prod: prev.prod * j,
                    run: 1,
                }
            };

            if youngest {
                *total += placement.prod;
            } else {
                self.place(r + 1, windows, placement, total)?;
            }
        }

        Ok(())
    }

    /// Running out of intervals is only legal if the window reaches the
    /// last boundary.
    fn check_exhausted(&self, node: VertexIndex, window: (f64, f64)) -> Result<(), DatingError> {
        match self.splits.last_boundary() {
            Some(last) if approx_eq(window.1, last) => Ok(()),
            last => Err(DatingError::SplitListExhausted {
                node,
                min: window.0,
                max: window.1,
                last_boundary: last.unwrap_or(f64::NAN),
            }),
        }
    }
}
