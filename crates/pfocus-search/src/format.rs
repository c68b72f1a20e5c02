//! Turning triggers into transient events with background intervals.
//!
//! ```text
//!   bkg pre                                                 bkg post
//! |<-pre_delta->|<--pre_t-->|                      |<--post_t-->|<-post_delta->|
//!                       changepoint           trigger
//!                           |<--------- event --------------->|
//! ```
//!
//! The pre-trigger background ends `pre_t` before the trigger, the
//! post-trigger background starts `post_t` after it, and the event spans
//! from the changepoint to the start of the post-trigger background. Every
//! interval is squashed to fit inside its GTI.

use serde::{Deserialize, Serialize};

use crate::gti::Gti;

/// A trigger with its times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerTime {
    /// Significance in standard deviations.
    pub significance: f64,
    /// Estimated onset time.
    pub changepoint: f64,
    /// Time at which the trigger fired.
    pub trigger_time: f64,
}

/// A transient event with the background intervals around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransientEvent {
    /// Start of the background interval before the transient.
    pub bkg_pre_start: f64,
    /// End of the background interval before the transient.
    pub bkg_pre_end: f64,
    /// Transient onset.
    pub start: f64,
    /// Transient end.
    pub end: f64,
    /// Start of the background interval after the transient.
    pub bkg_post_start: f64,
    /// End of the background interval after the transient.
    pub bkg_post_end: f64,
}

/// Interval durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intervals {
    /// Length of the pre-trigger background.
    pub pre_delta: f64,
    /// Gap between the pre-trigger background and the trigger.
    pub pre_t: f64,
    /// Length of the post-trigger background.
    pub post_delta: f64,
    /// Gap between the trigger and the post-trigger background.
    pub post_t: f64,
}

impl Intervals {
    /// Background intervals last one smoothing time-scale, `binning / alpha`.
    /// The pre-trigger one ends `m` bins before the trigger, the post-trigger
    /// one starts `skip` bins after it.
    pub fn new(binning: f64, alpha: f64, m: usize, skip: usize) -> Self {
        let delta = binning / alpha;
        Self {
            pre_delta: delta,
            pre_t: binning * m as f64,
            post_delta: delta,
            post_t: binning * skip as f64,
        }
    }
}

/// Pre-trigger background interval `(start, end)`.
pub fn compute_bkg_pre(trigger_time: f64, gti: &Gti, t: f64, delta: f64) -> (f64, f64) {
    if trigger_time - t - delta < gti.start {
        (gti.start, (trigger_time - t).max(gti.start))
    } else {
        let end = trigger_time - t;
        (end - delta, end)
    }
}

/// Post-trigger background interval `(start, end)`.
pub fn compute_bkg_post(trigger_time: f64, gti: &Gti, t: f64, delta: f64) -> (f64, f64) {
    if trigger_time + t + delta > gti.end {
        let end = gti.end;
        ((end - delta).max(trigger_time), end)
    } else {
        let start = trigger_time + t;
        (start, start + delta)
    }
}

/// Format one trigger found within `gti`.
///
/// An infinite interval duration (zero smoothing factor) is replaced by the
/// duration of the GTI.
pub fn format_trigger(trigger: &TriggerTime, gti: &Gti, intervals: &Intervals) -> TransientEvent {
    let finite = |d: f64| if d.is_finite() { d } else { gti.duration() };
    let (bkg_pre_start, bkg_pre_end) = compute_bkg_pre(
        trigger.trigger_time,
        gti,
        intervals.pre_t,
        finite(intervals.pre_delta),
    );
    let (bkg_post_start, bkg_post_end) = compute_bkg_post(
        trigger.trigger_time,
        gti,
        intervals.post_t,
        finite(intervals.post_delta),
    );
    TransientEvent {
        bkg_pre_start,
        bkg_pre_end,
        start: trigger.changepoint,
        end: bkg_post_start,
        bkg_post_start,
        bkg_post_end,
    }
}
