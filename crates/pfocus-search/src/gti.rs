//! Good time intervals and photon event tables.

use serde::{Deserialize, Serialize};

use crate::search::SearchError;

/// GTIs closer than this many seconds are searched as one.
pub const DEFAULT_GTI_TOLERANCE: f64 = 0.5;

/// A good time interval, in mission elapsed seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gti {
    /// First covered instant.
    pub start: f64,
    /// End of coverage, excluded.
    pub end: f64,
}

impl Gti {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open membership: `start <= time < end`.
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Whether `next` starts before this interval ends, or within
    /// `tolerance` of its end.
    fn touches(&self, next: &Gti, tolerance: f64) -> bool {
        (self.end - next.start).abs() <= tolerance || next.start < self.end
    }

    fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end
    }
}

/// Fuse adjacent and overlapping intervals.
///
/// Input must be sorted by start time. Fewer restarts mean fewer background
/// warm-ups, so touching intervals are joined before searching.
pub fn merge_overlapping(gtis: &[Gti], tolerance: f64) -> Vec<Gti> {
    let mut merged: Vec<Gti> = Vec::with_capacity(gtis.len());
    for gti in gtis {
        match merged.last_mut() {
            Some(last) if last.touches(gti, tolerance) => {
                last.end = last.end.max(gti.end);
            }
            _ => merged.push(*gti),
        }
    }
    merged
}

/// Keep events that fall inside one of `gtis`, sorted by start time.
///
/// Gaps that [`merge_overlapping`] bridges are still gaps here: their photons
/// were recorded outside good time and are dropped.
pub fn filter_gtis(events: &[PhotonEvent], gtis: &[Gti]) -> Vec<PhotonEvent> {
    let covered = merge_overlapping(gtis, 0.0);
    events
        .iter()
        .filter(|e| {
            let i = covered.partition_point(|g| g.start <= e.time);
            i > 0 && covered[i - 1].contains(e.time)
        })
        .copied()
        .collect()
}

/// One photon as recorded by the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhotonEvent {
    /// Arrival time in mission elapsed seconds.
    pub time: f64,
    /// Energy in keV.
    pub energy: f64,
    /// Detector quadrant, `0..4`.
    pub quadrant: u8,
}

/// Keep events with `low <= energy < high`.
pub fn filter_energy(events: &[PhotonEvent], (low, high): (f64, f64)) -> Vec<PhotonEvent> {
    events
        .iter()
        .filter(|e| low <= e.energy && e.energy < high)
        .copied()
        .collect()
}

/// Events and the intervals over which they were collected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Sorted by start time.
    pub gtis: Vec<Gti>,
    /// Photons, in any order.
    pub events: Vec<PhotonEvent>,
}

impl Dataset {
    pub fn new(gtis: Vec<Gti>, events: Vec<PhotonEvent>) -> Self {
        Self { gtis, events }
    }

    /// Reject empty, unsorted or inverted intervals.
    pub fn check_gtis(&self) -> Result<(), SearchError> {
        if let Some(bad) = self.gtis.iter().find(|g| !g.is_valid()) {
            return Err(SearchError::InvalidInput(format!(
                "invalid GTI ({}, {})",
                bad.start, bad.end
            )));
        }
        if self.gtis.windows(2).any(|w| w[1].start < w[0].start) {
            return Err(SearchError::InvalidInput(
                "GTIs are not sorted by start time".to_string(),
            ));
        }
        Ok(())
    }
}
