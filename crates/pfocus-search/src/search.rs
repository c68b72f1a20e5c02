//! End-to-end search over a dataset.
//!
//! 1. Merge touching GTIs
//! 2. Keep events in the energy band and inside the original GTIs
//! 3. Bin each merged GTI (per quadrant for quadrant algorithms)
//! 4. Run the segmented search on every GTI in parallel (rayon)
//! 5. Map bins back to times and format the transient events

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use pfocus_core::FocusError;

use crate::binning::{histogram, histogram_quadrants};
use crate::config::{ConfigError, SearchConfig};
use crate::format::{format_trigger, Intervals, TransientEvent, TriggerTime};
use crate::gti::{filter_energy, filter_gtis, merge_overlapping, Dataset, Gti, PhotonEvent};
use crate::segment::{search_binned, Binned};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Detector error: {0}")]
    Detector(#[from] FocusError),

    #[error("Report serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Search results for one merged GTI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GtiReport {
    /// The merged interval searched.
    pub gti: Gti,
    /// Number of bins searched.
    pub bins: usize,
    /// Triggers in time units, in time order.
    pub triggers: Vec<TriggerTime>,
    /// One transient per trigger.
    pub events: Vec<TransientEvent>,
    /// Why the search of this GTI stopped early, if it did.
    pub aborted: Option<String>,
}

/// Results of a whole search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Name of the trigger algorithm used.
    pub algorithm: String,
    /// One report per merged GTI, in time order.
    pub gtis: Vec<GtiReport>,
}

impl SearchReport {
    /// All transient events, in GTI order.
    pub fn events(&self) -> impl Iterator<Item = &TransientEvent> {
        self.gtis.iter().flat_map(|g| g.events.iter())
    }

    pub fn trigger_count(&self) -> usize {
        self.gtis.iter().map(|g| g.triggers.len()).sum()
    }

    pub fn to_json(&self) -> Result<String, SearchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Search `dataset` for transients.
pub fn search(dataset: &Dataset, config: &SearchConfig) -> Result<SearchReport, SearchError> {
    config.validate()?;
    dataset.check_gtis()?;

    let gtis = merge_overlapping(&dataset.gtis, config.gti_tolerance);
    let mut events = filter_gtis(
        &filter_energy(&dataset.events, config.energy_lims),
        &dataset.gtis,
    );
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    tracing::debug!(
        gtis = dataset.gtis.len(),
        merged = gtis.len(),
        events = events.len(),
        algorithm = config.algorithm_params.name(),
        "search started"
    );

    let reports = gtis
        .par_iter()
        .map(|gti| search_gti(&events, gti, config))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchReport {
        algorithm: config.algorithm_params.name().to_string(),
        gtis: reports,
    })
}

/// Events with `gti.start <= time < gti.end`. `events` must be sorted.
fn events_within<'a>(events: &'a [PhotonEvent], gti: &Gti) -> &'a [PhotonEvent] {
    let lo = events.partition_point(|e| e.time < gti.start);
    let hi = events.partition_point(|e| e.time < gti.end);
    &events[lo..hi.max(lo)]
}

fn search_gti(events: &[PhotonEvent], gti: &Gti, config: &SearchConfig) -> Result<GtiReport, SearchError> {
    let events = events_within(events, gti);
    let (binned, bins) = if config.algorithm_params.is_multichannel() {
        let h = histogram_quadrants(events, gti, config.binning)?;
        (Binned::Quadrants(h.counts), h.bins)
    } else {
        let times: Vec<f64> = events.iter().map(|e| e.time).collect();
        let h = histogram(&times, gti, config.binning)?;
        (Binned::Single(h.counts), h.bins)
    };

    let run = search_binned(&config.algorithm_params, &binned, config.skip)?;
    let intervals = Intervals::new(
        config.binning,
        config.algorithm_params.alpha(),
        config.algorithm_params.m(),
        config.skip,
    );

    let triggers: Vec<TriggerTime> = run
        .triggers
        .iter()
        .map(|cp| TriggerTime {
            significance: cp.significance,
            changepoint: bins[cp.changepoint_index],
            trigger_time: bins[cp.trigger_time],
        })
        .collect();
    for t in &triggers {
        tracing::info!(
            significance = t.significance,
            changepoint = t.changepoint,
            trigger_time = t.trigger_time,
            offset_s = t.trigger_time - gti.start,
            "transient found"
        );
    }
    let formatted = triggers
        .iter()
        .map(|t| format_trigger(t, gti, &intervals))
        .collect();

    Ok(GtiReport {
        gti: *gti,
        bins: binned.len(),
        triggers,
        events: formatted,
        aborted: run.error.map(|e| e.to_string()),
    })
}
