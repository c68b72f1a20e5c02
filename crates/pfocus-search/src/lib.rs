//! Transient search over photon event lists, driven by the Poisson-FOCuS
//! engine in `pfocus-core`.

pub mod binning;
pub mod config;
pub mod format;
pub mod gti;
pub mod search;
pub mod segment;

pub use binning::{histogram, histogram_quadrants, Histogram};
pub use config::{AlgorithmParams, ConfigError, SearchConfig};
pub use format::{compute_bkg_post, compute_bkg_pre, format_trigger, Intervals, TransientEvent, TriggerTime};
pub use gti::{filter_energy, filter_gtis, merge_overlapping, Dataset, Gti, PhotonEvent, DEFAULT_GTI_TOLERANCE};
pub use search::{search, GtiReport, SearchError, SearchReport};
pub use segment::{run_segmented, search_binned, Binned, SegmentRun};
