//! Closed-form birth-death integral over a split interval.

use crate::dating::error::DatingError;

/// Birth and death rates of a linear birth-death process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirthDeath {
    birth: f64,
    death: f64,
}

impl BirthDeath {
    /// Creates rates after checking that both are finite, `birth > 0` and
    /// `death >= 0`.
    pub fn new(birth: f64, death: f64) -> Result<Self, DatingError> {
        let invalid = |reason: &str| DatingError::InvalidRates {
            birth,
            death,
            reason: reason.to_string(),
        };
        if !birth.is_finite() || !death.is_finite() {
            return Err(invalid("rates must be finite"));
        }
        if birth <= 0.0 {
            return Err(invalid("birth rate must be positive"));
        }
        if death < 0.0 {
            return Err(invalid("death rate must not be negative"));
        }
        Ok(BirthDeath { birth, death })
    }

    pub fn birth(&self) -> f64 {
        self.birth
    }

    pub fn death(&self) -> f64 {
        self.death
    }

    /// Net diversification rate `birth - death`.
    pub fn net_diversification(&self) -> f64 {
        self.birth - self.death
    }

    /// Integral of the birth-death node density over ages `[t_min, t_pls]`:
    ///
    /// `J = (b-d)(e^{t_min d + t_pls b} - e^{t_min b + t_pls d})
    ///      / ((b e^{t_min b} - d e^{t_min d})(b e^{t_pls b} - d e^{t_pls d}))`
    ///
    /// Evaluated as `h_(Δ) / ((e^{-t_pls r} + b h_(t_pls))(1 + b h(t_min)))`
    /// with `r = b - d`, `Δ = t_pls - t_min`, `h(x) = expm1(r x) / r` and
    /// `h_(x) = -expm1(-r x) / r`, both tending to `x` as `r -> 0`. This
    /// form has no cancellation at `b = d` and no overflow of `e^{t_pls b}`
    /// for old intervals.
    ///
    /// # Errors
    /// [DatingError::NumericalFailure] if `t_pls <= t_min` or the result is
    /// not finite.
    ///
    /// # Example
    /// ```
    /// use caldate::dating::BirthDeath;
    ///
    /// let rates = BirthDeath::new(2.0, 1.0).unwrap();
    /// let j = rates.j(1.0, 2.0).unwrap();
    /// assert!((j - 0.076410395).abs() < 1e-9);
    /// ```
    pub fn j(&self, t_min: f64, t_pls: f64) -> Result<f64, DatingError> {
        if !(t_pls > t_min) {
            return Err(DatingError::NumericalFailure(format!(
                "birth-death integral needs t_pls > t_min, got [{}, {}]",
                t_min, t_pls
            )));
        }

        let b = self.birth;
        let r = self.net_diversification();
        let h = |x: f64| if r == 0.0 { x } else { (r * x).exp_m1() / r };
        let h_minus = |x: f64| if r == 0.0 { x } else { -(-r * x).exp_m1() / r };

        let j = h_minus(t_pls - t_min) / (((-r * t_pls).exp() + b * h_minus(t_pls)) * (1.0 + b * h(t_min)));

        if !j.is_finite() {
            return Err(DatingError::NumericalFailure(format!(
                "birth-death integral over [{}, {}] with rates ({}, {}) is {}",
                t_min, t_pls, self.birth, self.death, j
            )));
        }
        Ok(j)
    }
}

impl Default for BirthDeath {
    /// Pure birth (Yule) process with rate one.
    fn default() -> Self {
        BirthDeath { birth: 1.0, death: 0.0 }
    }
}

/// Integral of the birth-death node density over ages `[t_min, t_pls]`,
/// see [BirthDeath::j].
pub fn birth_death_density(birth: f64, death: f64, t_min: f64, t_pls: f64) -> Result<f64, DatingError> {
    BirthDeath::new(birth, death)?.j(t_min, t_pls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(b: f64, d: f64, t_min: f64, t_pls: f64) -> f64 {
        (b - d) * ((t_min * d + t_pls * b).exp() - (t_min * b + t_pls * d).exp())
            / ((b * (t_min * b).exp() - d * (t_min * d).exp()) * (b * (t_pls * b).exp() - d * (t_pls * d).exp()))
    }

    #[test]
    fn matches_literal_formula() {
        for &(b, d, t_min, t_pls) in &[
            (2.0, 1.0, 1.0, 2.0),
            (1.0, 0.0, 0.0, 3.0),
            (0.7, 0.2, 0.5, 0.6),
            (3.0, 2.9, 2.0, 4.0),
            (1.0, 2.0, 0.0, 1.0),
        ] {
            let expected = literal(b, d, t_min, t_pls);
            let j = BirthDeath::new(b, d).unwrap().j(t_min, t_pls).unwrap();
            assert!(
                ((j - expected) / expected).abs() < 1e-10,
                "J({}, {}, {}, {}) = {} but expected {}",
                b, d, t_min, t_pls, j, expected
            );
        }
    }

    #[test]
    fn critical_process_limit() {
        // b = d: J = Δ / ((1 + b t_min)(1 + b t_pls))
        let j = BirthDeath::new(1.5, 1.5).unwrap().j(1.0, 3.0).unwrap();
        let expected = 2.0 / ((1.0 + 1.5) * (1.0 + 4.5));
        assert!((j - expected).abs() < 1e-14);

        let near = BirthDeath::new(1.5, 1.5 - 1e-9).unwrap().j(1.0, 3.0).unwrap();
        assert!((near - expected).abs() < 1e-8);
    }

    #[test]
    fn old_intervals_do_not_overflow() {
        let j = BirthDeath::new(5.0, 1.0).unwrap().j(300.0, 400.0).unwrap();
        assert!(j.is_finite());
        assert!(j >= 0.0);
    }

    #[test]
    fn degenerate_interval_is_numerical_failure() {
        let rates = BirthDeath::default();
        assert!(matches!(rates.j(2.0, 2.0), Err(DatingError::NumericalFailure(_))));
        assert!(matches!(rates.j(2.0, 1.0), Err(DatingError::NumericalFailure(_))));
        assert!(matches!(rates.j(f64::NAN, 1.0), Err(DatingError::NumericalFailure(_))));
    }

    #[test]
    fn invalid_rates() {
        assert!(BirthDeath::new(0.0, 0.0).is_err());
        assert!(BirthDeath::new(1.0, -0.1).is_err());
        assert!(BirthDeath::new(f64::INFINITY, 0.0).is_err());
        assert!(birth_death_density(1.0, 0.5, 0.0, 1.0).unwrap() > 0.0);
    }
}
