//! Trigger reports in online (relative) and offline (absolute) form.

use serde::{Deserialize, Serialize};

/// What a detector reports after a step.
///
/// `offset` counts steps back from the current one to the hypothesised
/// changepoint, so a change that started on the current step has offset 1.
/// A step without a trigger reports [`Change::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Change {
    /// Significance in standard deviations.
    pub significance: f64,
    /// Steps back to the changepoint, counting the current one.
    pub offset: usize,
}

impl Change {
    pub const NONE: Change = Change {
        significance: 0.0,
        offset: 0,
    };

    /// Build from a log-likelihood ratio.
    pub fn from_llr(llr: f64, offset: usize) -> Self {
        Self {
            significance: (2.0 * llr).sqrt(),
            offset,
        }
    }

    pub fn is_trigger(&self) -> bool {
        self.significance > 0.0
    }

    /// Anchor this change at absolute step `trigger_time`.
    ///
    /// A change without a trigger is anchored at `trigger_time` itself, so the
    /// result always satisfies `changepoint_index <= trigger_time`.
    pub fn to_changepoint(&self, trigger_time: usize) -> Changepoint {
        let changepoint_index = if self.is_trigger() && self.offset > 0 {
            (trigger_time + 1).saturating_sub(self.offset)
        } else {
            trigger_time
        };
        Changepoint {
            significance: self.significance,
            changepoint_index,
            trigger_time,
        }
    }
}

/// A trigger in absolute step coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Changepoint {
    /// Significance in standard deviations.
    pub significance: f64,
    /// Step at which the rate is thought to have risen.
    pub changepoint_index: usize,
    /// Step at which the trigger fired.
    pub trigger_time: usize,
}

impl Changepoint {
    pub fn is_trigger(&self) -> bool {
        self.significance > 0.0
    }

    /// The online offset this changepoint was derived from. Zero when the
    /// changepoint lies after the trigger time.
    pub fn offset(&self) -> usize {
        if self.is_trigger() {
            self.trigger_time
                .checked_sub(self.changepoint_index)
                .map_or(0, |d| d + 1)
        } else {
            0
        }
    }

    /// Shift both indices forward by `origin` steps.
    pub fn shifted(&self, origin: usize) -> Self {
        Self {
            significance: self.significance,
            changepoint_index: self.changepoint_index + origin,
            trigger_time: self.trigger_time + origin,
        }
    }
}

/// Reduce per-channel changepoints to a single one.
///
/// Keeps the largest significance, the earliest changepoint among triggering
/// channels and the latest trigger time. Without any triggering channel the
/// result is a zero-significance changepoint anchored at the latest trigger
/// time.
pub fn fold_changepoints(changepoints: &[Changepoint]) -> Changepoint {
    let trigger_time = changepoints
        .iter()
        .map(|c| c.trigger_time)
        .max()
        .unwrap_or(0);
    let significance = changepoints
        .iter()
        .map(|c| c.significance)
        .fold(0.0, f64::max);
    let changepoint_index = changepoints
        .iter()
        .filter(|c| c.is_trigger())
        .map(|c| c.changepoint_index)
        .min()
        .unwrap_or(trigger_time);
    Changepoint {
        significance,
        changepoint_index,
        trigger_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_llr_converts_to_std() {
        let c = Change::from_llr(12.5, 3);
        assert!((c.significance - 5.0).abs() < 1e-12);
        assert_eq!(c.offset, 3);
    }

    #[test]
    fn test_to_changepoint_roundtrip_offset() {
        let c = Change {
            significance: 5.2,
            offset: 4,
        };
        let cp = c.to_changepoint(20);
        assert_eq!(cp.changepoint_index, 17);
        assert_eq!(cp.trigger_time, 20);
        assert_eq!(cp.offset(), 4);
    }

    #[test]
    fn test_no_trigger_anchored_at_trigger_time() {
        let cp = Change::NONE.to_changepoint(99);
        assert!(!cp.is_trigger());
        assert_eq!(cp.changepoint_index, 99);
        assert_eq!(cp.trigger_time, 99);
        assert_eq!(cp.offset(), 0);
    }

    #[test]
    fn test_fold_takes_extremes_of_triggering_channels() {
        let cps = [
            Changepoint {
                significance: 5.5,
                changepoint_index: 10,
                trigger_time: 14,
            },
            Changepoint {
                significance: 6.1,
                changepoint_index: 12,
                trigger_time: 14,
            },
            Change::NONE.to_changepoint(14),
            Changepoint {
                significance: 5.1,
                changepoint_index: 9,
                trigger_time: 14,
            },
        ];
        let folded = fold_changepoints(&cps);
        assert_eq!(folded.significance, 6.1);
        assert_eq!(folded.changepoint_index, 9);
        assert_eq!(folded.trigger_time, 14);
    }

    #[test]
    fn test_fold_without_triggers() {
        let cps = [Change::NONE.to_changepoint(7); 4];
        let folded = fold_changepoints(&cps);
        assert!(!folded.is_trigger());
        assert_eq!(folded.changepoint_index, 7);
    }

    #[test]
    fn test_offset_of_inverted_changepoint() {
        let cp: Changepoint = serde_json::from_str(
            r#"{"significance": 5.0, "changepoint_index": 12, "trigger_time": 10}"#,
        )
        .unwrap();
        assert_eq!(cp.offset(), 0);
    }

    #[test]
    fn test_shifted() {
        let cp = Changepoint {
            significance: 5.0,
            changepoint_index: 3,
            trigger_time: 5,
        };
        let s = cp.shifted(100);
        assert_eq!((s.changepoint_index, s.trigger_time), (103, 105));
        assert_eq!(s.offset(), cp.offset());
    }
}
