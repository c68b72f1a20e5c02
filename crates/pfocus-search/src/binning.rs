//! Time binning of event lists.
//!
//! A GTI `[start, end]` at bin width `w` becomes `n = floor((end - start) / w + 1)`
//! equal bins over `[start, start + n * w]`, so the last edge never falls short
//! of `end`. Bins are half-open except the last, which also takes events on
//! its upper edge. Events outside the binned range are ignored.

use pfocus_core::{Count, CHANNELS};

use crate::gti::{Gti, PhotonEvent};
use crate::search::SearchError;

/// Counts per bin with their `counts.len() + 1` edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram<C> {
    /// One count per bin.
    pub counts: Vec<C>,
    /// Left edge of every bin, plus the right edge of the last.
    pub bins: Vec<f64>,
}

struct Layout {
    lo: f64,
    hi: f64,
    n: usize,
    bins: Vec<f64>,
}

impl Layout {
    fn new(gti: &Gti, binning: f64) -> Result<Self, SearchError> {
        if !(binning > 0.0) || !binning.is_finite() {
            return Err(SearchError::InvalidInput(format!(
                "binning must be a positive finite number, got {binning}"
            )));
        }
        if !(gti.end >= gti.start) || !gti.start.is_finite() || !gti.end.is_finite() {
            return Err(SearchError::InvalidInput(format!(
                "cannot bin GTI ({}, {})",
                gti.start, gti.end
            )));
        }
        let n = ((gti.end - gti.start) / binning + 1.0).floor() as usize;
        let lo = gti.start;
        let hi = lo + n as f64 * binning;
        let mut bins: Vec<f64> = (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / n as f64)
            .collect();
        bins.push(hi);
        Ok(Self { lo, hi, n, bins })
    }

    fn index(&self, t: f64) -> Option<usize> {
        if !(t >= self.lo && t <= self.hi) {
            return None;
        }
        if t == self.hi {
            return Some(self.n - 1);
        }
        let mut i = (((t - self.lo) / (self.hi - self.lo)) * self.n as f64) as usize;
        i = i.min(self.n - 1);
        // Settle rounding at the edges against the stored edges.
        if t < self.bins[i] && i > 0 {
            i -= 1;
        } else if i + 1 < self.n && t >= self.bins[i + 1] {
            i += 1;
        }
        Some(i)
    }
}

/// Bin event times.
pub fn histogram(times: &[f64], gti: &Gti, binning: f64) -> Result<Histogram<Count>, SearchError> {
    let layout = Layout::new(gti, binning)?;
    let mut counts = vec![0; layout.n];
    for &t in times {
        if let Some(i) = layout.index(t) {
            counts[i] += 1;
        }
    }
    Ok(Histogram {
        counts,
        bins: layout.bins,
    })
}

/// Bin events separately per detector quadrant, sharing one set of edges.
/// Quadrants without events still get a row of zeros.
pub fn histogram_quadrants(
    events: &[PhotonEvent],
    gti: &Gti,
    binning: f64,
) -> Result<Histogram<[Count; CHANNELS]>, SearchError> {
    let layout = Layout::new(gti, binning)?;
    let mut counts = vec![[0; CHANNELS]; layout.n];
    for e in events {
        let q = usize::from(e.quadrant);
        if q >= CHANNELS {
            return Err(SearchError::InvalidInput(format!(
                "event at {} has quadrant {}",
                e.time, e.quadrant
            )));
        }
        if let Some(i) = layout.index(e.time) {
            counts[i][q] += 1;
        }
    }
    Ok(Histogram {
        counts,
        bins: layout.bins,
    })
}
