//! Poisson-FOCuS: online detection of a rate increase in a count stream,
//! against a known background.
//!
//! Each step folds one `(count, background)` pair into the curve stack,
//! prunes curves that can no longer yield the maximum likelihood ratio, and
//! scans the survivors for one that crosses threshold. Weak evidence since
//! the most promising curve wipes the stack, which is what keeps memory
//! bounded when `mu_min > 1`.

use crate::change::Change;
use crate::curve::{Curve, CurveStack};
use crate::error::FocusError;
use crate::params::FocusParams;
use crate::Count;

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Testing,
    /// Terminal. Holds the error every further step returns.
    Stopped(FocusError),
}

/// Online Poisson-FOCuS detector.
#[derive(Debug, Clone)]
pub struct PoissonFocus {
    status: Status,
    curves: CurveStack,
    /// Log-likelihood ratio and offset of the latest trigger, zero otherwise.
    llr: f64,
    offset: usize,
    mu_crit: f64,
    threshold_llr: f64,
    threshold_std: f64,
}

impl PoissonFocus {
    pub fn new(params: &FocusParams) -> Result<Self, FocusError> {
        params.validate()?;
        let curves = CurveStack::new()?;
        let mu_min = params.mu_min;
        tracing::debug!(
            threshold_std = params.threshold_std,
            mu_min,
            "poisson-focus initialized"
        );
        Ok(Self {
            status: Status::Testing,
            curves,
            llr: 0.0,
            offset: 0,
            mu_crit: if mu_min == 1.0 {
                1.0
            } else {
                (mu_min - 1.0) / mu_min.ln()
            },
            threshold_llr: params.threshold_std * params.threshold_std / 2.0,
            threshold_std: params.threshold_std,
        })
    }

    /// Feed one count with its expected background.
    ///
    /// Returns whether the step triggered. A negative count or a background
    /// that is not a positive finite number stops the detector for good: this
    /// and every later call return the same `InvalidObservation`.
    pub fn step(&mut self, count: Count, background: f64) -> Result<bool, FocusError> {
        if let Status::Stopped(err) = &self.status {
            return Err(err.clone());
        }
        if count < 0 || !(background > 0.0) || !background.is_finite() {
            let err = FocusError::InvalidObservation { count, background };
            self.llr = 0.0;
            self.offset = 0;
            self.status = Status::Stopped(err.clone());
            return Err(err);
        }
        self.update(count, background);
        Ok(self.triggered())
    }

    fn update(&mut self, count: Count, background: f64) {
        self.llr = 0.0;
        self.offset = 0;

        let mut p = match self.curves.pop() {
            Some(p) => p,
            None => {
                self.curves.reset();
                self.curves.pop().unwrap_or(Curve::NULL)
            }
        };
        let mut acc = Curve {
            x: p.x.saturating_add(count),
            b: p.b + background,
            t: p.t + 1,
            m: p.m,
        };
        while !p.dominates(self.curves.top(), &acc) {
            match self.curves.pop() {
                Some(q) => p = q,
                None => break,
            }
        }

        let (x, b) = ((acc.x - p.x) as f64, acc.b - p.b);
        if x > self.mu_crit * b {
            acc.m = p.m + p.max_llr(&acc).unwrap_or(0.0);
            if let Some((llr, offset)) = maximize(&self.curves, &p, &acc, self.threshold_llr) {
                self.llr = llr;
                self.offset = offset;
            }
            self.curves.push(p);
            self.curves.push(acc);
        } else {
            self.curves.reset();
        }
    }

    fn triggered(&self) -> bool {
        self.llr > 0.0
    }

    /// The change found by the latest step, [`Change::NONE`] without trigger.
    pub fn change(&self) -> Change {
        if !self.triggered() {
            return Change::NONE;
        }
        Change::from_llr(self.llr, self.offset)
    }

    pub fn threshold_std(&self) -> f64 {
        self.threshold_std
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.status, Status::Stopped(_))
    }

    /// Live curves, newest first.
    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.curves.iter()
    }

    /// Curves dropped because the stack was full.
    pub fn evictions(&self) -> u64 {
        self.curves.evictions()
    }

    /// Release the curve buffer.
    pub fn terminate(self) {}
}

/// Scan from `p` towards older curves for the first whose likelihood ratio
/// reaches threshold. Stops as soon as the bound `m + p.m` says no older
/// curve can get there.
fn maximize(curves: &CurveStack, p: &Curve, acc: &Curve, threshold_llr: f64) -> Option<(f64, usize)> {
    let mut m = acc.m - p.m;
    let mut p_m = p.m;
    let mut p_t = p.t;
    let mut older = curves.iter();
    while m + p_m >= threshold_llr {
        if m >= threshold_llr {
            return Some((m, acc.t - p_t));
        }
        let q = older.next()?;
        m = q.max_llr(acc)?;
        p_m = q.m;
        p_t = q.t;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus(threshold_std: f64, mu_min: f64) -> PoissonFocus {
        PoissonFocus::new(&FocusParams::new(threshold_std, mu_min)).unwrap()
    }

    #[test]
    fn test_mu_crit() {
        assert_eq!(focus(3.0, 1.0).mu_crit, 1.0);
        let f = focus(3.0, 1.2);
        assert!((f.mu_crit - 0.2 / 1.2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_init() {
        assert!(PoissonFocus::new(&FocusParams::new(0.0, 1.0)).is_err());
        assert!(PoissonFocus::new(&FocusParams::new(3.0, 0.5)).is_err());
    }

    #[test]
    fn test_flat_stream_never_triggers() {
        let mut f = focus(3.0, 1.2);
        for _ in 0..500 {
            assert!(!f.step(1, 1.0).unwrap());
        }
        assert_eq!(f.change(), Change::NONE);
    }

    #[test]
    fn test_single_huge_count_triggers_with_offset_one() {
        let mut f = focus(5.0, 1.0);
        assert!(f.step(100, 1.0).unwrap());
        let c = f.change();
        assert_eq!(c.offset, 1);
        let expected = (2.0 * (100.0 * 100f64.ln() - 99.0)).sqrt();
        assert!((c.significance - expected).abs() < 1e-9);
    }

    #[test]
    fn test_weak_evidence_resets_stack() {
        let mut f = focus(3.0, 1.5);
        f.step(3, 1.0).unwrap();
        assert!(f.curves().count() > 1);
        f.step(0, 1.0).unwrap();
        f.step(0, 1.0).unwrap();
        assert_eq!(f.curves().collect::<Vec<_>>(), vec![&Curve::NULL]);
    }

    #[test]
    fn test_negative_count_latches() {
        let mut f = focus(3.0, 1.0);
        f.step(2, 1.0).unwrap();
        let err = f.step(-1, 1.0).unwrap_err();
        assert!(matches!(err, FocusError::InvalidObservation { count: -1, .. }));
        assert!(f.is_stopped());
        // Later valid input gets the same latched error.
        assert_eq!(f.step(5, 1.0).unwrap_err(), err);
        assert_eq!(f.change(), Change::NONE);
    }

    #[test]
    fn test_non_positive_background_latches() {
        for b in [0.0, -2.0, f64::NAN] {
            let mut f = focus(3.0, 1.0);
            assert!(f.step(1, b).is_err());
            assert!(f.step(1, 1.0).is_err());
        }
    }
}
