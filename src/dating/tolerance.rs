//! Relative tolerance for comparing node times.
//!
//! Split boundaries are coalesced and split intervals are classified against
//! prior windows with the same tolerance, so that a boundary that was merged
//! during partitioning is also recognised as equal during classification.

/// Relative tolerance for time comparisons.
pub const REL_EPS: f64 = 1e-6;

/// Returns whether `a` and `b` are equal up to [REL_EPS], relative to the
/// larger magnitude (absolute for magnitudes below one).
///
/// Infinite values only equal themselves.
///
/// # Example
/// ```
/// use caldate::dating::tolerance::approx_eq;
///
/// assert!(approx_eq(-10.0, -10.000001));
/// assert!(!approx_eq(-10.0, -10.1));
/// assert!(approx_eq(f64::NEG_INFINITY, f64::NEG_INFINITY));
/// assert!(!approx_eq(f64::NEG_INFINITY, -1e300));
/// ```
pub fn approx_eq(a: f64, b: f64) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return a == b;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= REL_EPS * scale
}

/// `a >= b` up to [approx_eq].
pub fn approx_ge(a: f64, b: f64) -> bool {
    a >= b || approx_eq(a, b)
}

/// `a <= b` up to [approx_eq].
pub fn approx_le(a: f64, b: f64) -> bool {
    a <= b || approx_eq(a, b)
}
