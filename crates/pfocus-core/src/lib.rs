//! Poisson-FOCuS trigger engine.
//!
//! Bounded-memory online detection of rate increases in event-count streams:
//! the bare detector ([`PoissonFocus`]), detectors that estimate their own
//! background from delayed counts ([`PoissonFocusSes`], [`PoissonFocusDes`]),
//! and a four-channel majority trigger ([`BigTrigger`]) that keeps running
//! when individual channels fault.

pub mod bft;
pub mod change;
pub mod curve;
pub mod delayed;
pub mod error;
pub mod focus;
pub mod params;
pub mod queue;
pub mod replay;
pub mod smoothing;

pub use bft::BigTrigger;
pub use change::{fold_changepoints, Change, Changepoint};
pub use curve::{Curve, CurveStack, MAX_CURVES};
pub use delayed::{DelayedFocus, Phase, PoissonFocusDes, PoissonFocusSes};
pub use error::FocusError;
pub use focus::PoissonFocus;
pub use params::{BftDesParams, BftParams, DesParams, FocusParams, SesParams};
pub use queue::DelayQueue;
pub use replay::{
    replay, replay_bft, replay_bft_des, replay_channels, replay_des, replay_focus, replay_ses,
};
pub use smoothing::{DoubleExponential, SingleExponential, Smoother};

/// An event count for one time bin.
pub type Count = i64;

/// Number of detector channels voting in a [`BigTrigger`].
pub const CHANNELS: usize = 4;

/// A single-stream detector that estimates its own background.
pub trait Detector {
    /// Feed one count. Returns whether the step triggered.
    fn step(&mut self, count: Count) -> Result<bool, FocusError>;

    /// The change behind the latest trigger, [`Change::NONE`] otherwise.
    fn change(&self) -> Change;

    /// Whether an error has latched the detector.
    fn is_stopped(&self) -> bool;
}
