//! Re-triggering search over a binned series.
//!
//! A fresh detector replays the series; when it triggers, the search jumps
//! `skip` bins past the trigger and starts over with another fresh detector.
//! This repeats until a pass ends without trigger or the data runs out.

use pfocus_core::{
    fold_changepoints, replay_bft, replay_bft_des, replay_des, replay_ses, Changepoint, Count,
    FocusError, CHANNELS,
};

use crate::config::AlgorithmParams;
use crate::search::SearchError;

/// Outcome of a segmented search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentRun {
    /// Triggers in absolute bin coordinates, in time order.
    pub triggers: Vec<Changepoint>,
    /// The error that cut the search short, if any.
    pub error: Option<FocusError>,
}

/// Run `replay_from(start)` over successive tails of a series of `len`
/// bins. `replay_from` must return a changepoint relative to `start`.
///
/// A step error ends the search; triggers found before it are kept. A
/// detector that cannot be built fails the whole search.
pub fn run_segmented<F>(len: usize, skip: usize, mut replay_from: F) -> Result<SegmentRun, SearchError>
where
    F: FnMut(usize) -> Result<Changepoint, FocusError>,
{
    if skip < 1 {
        return Err(SearchError::InvalidInput("skip must be at least 1".to_string()));
    }
    let mut run = SegmentRun::default();
    let mut start = 0;
    while start < len {
        let cp = match replay_from(start) {
            Ok(cp) => cp,
            Err(err) if !err.is_runtime() => return Err(SearchError::Detector(err)),
            Err(err) => {
                tracing::warn!(start, error = %err, "segment aborted");
                run.error = Some(err);
                break;
            }
        };
        if !cp.is_trigger() {
            break;
        }
        let cp = cp.shifted(start);
        tracing::debug!(
            significance = cp.significance,
            changepoint = cp.changepoint_index,
            trigger_time = cp.trigger_time,
            "segment triggered"
        );
        run.triggers.push(cp);
        start = cp.trigger_time + skip;
    }
    Ok(run)
}

/// Binned counts, one series or one per quadrant.
#[derive(Debug, Clone, PartialEq)]
pub enum Binned {
    Single(Vec<Count>),
    Quadrants(Vec<[Count; CHANNELS]>),
}

impl Binned {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(xs) => xs.len(),
            Self::Quadrants(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Segmented search with the configured algorithm.
///
/// Quadrant algorithms need quadrant counts; single-stream ones accept
/// either, summing quadrants into one series.
pub fn search_binned(
    params: &AlgorithmParams,
    binned: &Binned,
    skip: usize,
) -> Result<SegmentRun, SearchError> {
    match (params, binned) {
        (AlgorithmParams::Ses(p), Binned::Single(xs)) => {
            run_segmented(xs.len(), skip, |s| replay_ses(&xs[s..], p))
        }
        (AlgorithmParams::Des(p), Binned::Single(xs)) => {
            run_segmented(xs.len(), skip, |s| replay_des(&xs[s..], p))
        }
        (AlgorithmParams::Bft(p), Binned::Quadrants(rows)) => run_segmented(rows.len(), skip, |s| {
            replay_bft(&rows[s..], p).map(|cps| fold_changepoints(&cps))
        }),
        (AlgorithmParams::BftDes(p), Binned::Quadrants(rows)) => {
            run_segmented(rows.len(), skip, |s| {
                replay_bft_des(&rows[s..], p).map(|cps| fold_changepoints(&cps))
            })
        }
        (AlgorithmParams::Ses(_) | AlgorithmParams::Des(_), Binned::Quadrants(rows)) => {
            let xs: Vec<Count> = rows.iter().map(|r| r.iter().sum()).collect();
            search_binned(params, &Binned::Single(xs), skip)
        }
        (AlgorithmParams::Bft(_) | AlgorithmParams::BftDes(_), Binned::Single(_)) => {
            Err(SearchError::InvalidInput(format!(
                "{} needs counts per quadrant",
                params.name()
            )))
        }
    }
}
