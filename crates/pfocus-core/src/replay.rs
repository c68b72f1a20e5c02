//! Offline drivers: run a fresh detector over a whole series and report the
//! first trigger as an absolute changepoint.
//!
//! Each driver stops at the first trigger or step error. Without a trigger
//! the result has zero significance and is anchored at the last step.

use crate::bft::BigTrigger;
use crate::change::{Change, Changepoint};
use crate::delayed::{PoissonFocusDes, PoissonFocusSes};
use crate::error::FocusError;
use crate::focus::PoissonFocus;
use crate::params::{BftDesParams, BftParams, DesParams, FocusParams, SesParams};
use crate::{Count, Detector, CHANNELS};

fn check_len(len: usize) -> Result<(), FocusError> {
    if len == 0 {
        return Err(FocusError::invalid("counts", "series is empty"));
    }
    Ok(())
}

/// Bare Poisson-FOCuS against a given background per step.
pub fn replay_focus(
    counts: &[Count],
    backgrounds: &[f64],
    params: &FocusParams,
) -> Result<Changepoint, FocusError> {
    check_len(counts.len())?;
    if counts.len() != backgrounds.len() {
        return Err(FocusError::invalid(
            "backgrounds",
            format!(
                "length {} does not match {} counts",
                backgrounds.len(),
                counts.len()
            ),
        ));
    }
    let mut focus = PoissonFocus::new(params)?;
    for (t, (&x, &b)) in counts.iter().zip(backgrounds).enumerate() {
        if focus.step(x, b)? {
            return Ok(focus.change().to_changepoint(t));
        }
    }
    Ok(Change::NONE.to_changepoint(counts.len() - 1))
}

/// Any single-stream detector.
pub fn replay<D: Detector>(detector: &mut D, counts: &[Count]) -> Result<Changepoint, FocusError> {
    check_len(counts.len())?;
    for (t, &x) in counts.iter().enumerate() {
        if detector.step(x)? {
            return Ok(detector.change().to_changepoint(t));
        }
    }
    Ok(Change::NONE.to_changepoint(counts.len() - 1))
}

pub fn replay_ses(counts: &[Count], params: &SesParams) -> Result<Changepoint, FocusError> {
    replay(&mut PoissonFocusSes::new(params)?, counts)
}

pub fn replay_des(counts: &[Count], params: &DesParams) -> Result<Changepoint, FocusError> {
    replay(&mut PoissonFocusDes::new(params)?, counts)
}

/// A [`BigTrigger`] over rows of per-channel counts. Returns one changepoint
/// per channel, all sharing the trigger time.
pub fn replay_channels<D: Detector>(
    bft: &mut BigTrigger<D>,
    counts: &[[Count; CHANNELS]],
) -> Result<[Changepoint; CHANNELS], FocusError> {
    check_len(counts.len())?;
    for (t, &row) in counts.iter().enumerate() {
        if bft.step(row)? {
            return Ok(bft.changes().map(|c| c.to_changepoint(t)));
        }
    }
    Ok([Change::NONE.to_changepoint(counts.len() - 1); CHANNELS])
}

pub fn replay_bft(
    counts: &[[Count; CHANNELS]],
    params: &BftParams,
) -> Result<[Changepoint; CHANNELS], FocusError> {
    replay_channels(&mut BigTrigger::new(params)?, counts)
}

pub fn replay_bft_des(
    counts: &[[Count; CHANNELS]],
    params: &BftDesParams,
) -> Result<[Changepoint; CHANNELS], FocusError> {
    replay_channels(&mut BigTrigger::with_des(params)?, counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series_rejected() {
        let p = FocusParams::new(3.0, 1.0);
        assert!(matches!(
            replay_focus(&[], &[], &p),
            Err(FocusError::InvalidInput { name: "counts", .. })
        ));
    }

    #[test]
    fn test_mismatched_backgrounds_rejected() {
        let p = FocusParams::new(3.0, 1.0);
        assert!(matches!(
            replay_focus(&[1, 2], &[1.0], &p),
            Err(FocusError::InvalidInput { name: "backgrounds", .. })
        ));
    }

    #[test]
    fn test_no_trigger_anchored_at_last_step() {
        let p = FocusParams::new(5.0, 1.0);
        let cp = replay_focus(&[1; 30], &[1.0; 30], &p).unwrap();
        assert!(!cp.is_trigger());
        assert_eq!(cp.trigger_time, 29);
        assert_eq!(cp.changepoint_index, 29);
    }

    #[test]
    fn test_trigger_reports_absolute_indices() {
        let mut xs = vec![1; 20];
        xs.extend([40, 40]);
        let bs = vec![1.0; xs.len()];
        let cp = replay_focus(&xs, &bs, &FocusParams::new(5.0, 1.0)).unwrap();
        assert!(cp.is_trigger());
        assert_eq!(cp.trigger_time, 20);
        assert_eq!(cp.changepoint_index, 20);
    }

    #[test]
    fn test_step_error_surfaces() {
        let p = FocusParams::new(5.0, 1.0);
        assert!(matches!(
            replay_focus(&[1, -3, 1], &[1.0; 3], &p),
            Err(FocusError::InvalidObservation { count: -3, .. })
        ));
    }
}
