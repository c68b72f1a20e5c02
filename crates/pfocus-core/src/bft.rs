//! Big Trigger: majority vote over four independent detectors.
//!
//! Each channel watches one detector quadrant. A channel that sees an invalid
//! observation is marked faulted and never stepped again; the others carry
//! on. The trigger only becomes unavailable once fewer live channels remain
//! than the majority requires.

use crate::change::Change;
use crate::delayed::{PoissonFocusDes, PoissonFocusSes};
use crate::error::FocusError;
use crate::params::{BftDesParams, BftParams};
use crate::{Count, Detector, CHANNELS};

/// Four-channel majority trigger.
#[derive(Debug, Clone)]
pub struct BigTrigger<D = PoissonFocusSes> {
    channels: [D; CHANNELS],
    /// Bit `i` set once channel `i` has faulted.
    faulted: u8,
    majority: usize,
}

fn build_channels<D>(
    mut make: impl FnMut() -> Result<D, FocusError>,
) -> Result<[D; CHANNELS], FocusError> {
    let mut channels = Vec::new();
    channels
        .try_reserve_exact(CHANNELS)
        .map_err(|_| FocusError::AllocationFailure { what: "channel" })?;
    for _ in 0..CHANNELS {
        channels.push(make()?);
    }
    channels
        .try_into()
        .map_err(|_| FocusError::AllocationFailure { what: "channel" })
}

impl BigTrigger<PoissonFocusSes> {
    pub fn new(params: &BftParams) -> Result<Self, FocusError> {
        params.validate()?;
        let channel = params.channel();
        let channels = build_channels(|| PoissonFocusSes::new(&channel))?;
        Self::from_channels(channels, params.majority)
    }
}

impl BigTrigger<PoissonFocusDes> {
    pub fn with_des(params: &BftDesParams) -> Result<Self, FocusError> {
        params.validate()?;
        let channel = params.channel();
        let channels = build_channels(|| PoissonFocusDes::new(&channel))?;
        Self::from_channels(channels, params.majority)
    }
}

impl<D: Detector> BigTrigger<D> {
    /// Vote over caller-built channels.
    pub fn from_channels(channels: [D; CHANNELS], majority: usize) -> Result<Self, FocusError> {
        if !(1..=CHANNELS).contains(&majority) {
            return Err(FocusError::invalid(
                "majority",
                format!("must lie in [1, {CHANNELS}], got {majority}"),
            ));
        }
        tracing::debug!(majority, "big trigger initialized");
        Ok(Self {
            channels,
            faulted: 0,
            majority,
        })
    }

    /// Feed one count per channel. Returns whether at least `majority`
    /// channels triggered on this step.
    ///
    /// Channel errors are absorbed into the fault mask. Fails with
    /// `QuorumLost` once the live channels cannot reach the majority.
    pub fn step(&mut self, counts: [Count; CHANNELS]) -> Result<bool, FocusError> {
        self.check_quorum()?;
        let mut triggered = 0;
        for (i, (channel, count)) in self.channels.iter_mut().zip(counts).enumerate() {
            if self.faulted & (1 << i) != 0 {
                continue;
            }
            match channel.step(count) {
                Ok(true) => triggered += 1,
                Ok(false) => {}
                Err(err) => {
                    self.faulted |= 1 << i;
                    tracing::warn!(channel = i, error = %err, "big trigger channel faulted");
                }
            }
        }
        self.check_quorum()?;
        Ok(triggered >= self.majority)
    }

    fn check_quorum(&self) -> Result<(), FocusError> {
        let live = self.live_channels();
        if live < self.majority {
            return Err(FocusError::QuorumLost {
                live,
                majority: self.majority,
            });
        }
        Ok(())
    }

    /// The latest change of every channel. Faulted channels report
    /// [`Change::NONE`].
    pub fn changes(&self) -> [Change; CHANNELS] {
        std::array::from_fn(|i| {
            if self.is_faulted(i) {
                Change::NONE
            } else {
                self.channels[i].change()
            }
        })
    }

    pub fn majority(&self) -> usize {
        self.majority
    }

    pub fn live_channels(&self) -> usize {
        CHANNELS - self.faulted.count_ones() as usize
    }

    pub fn faulted_mask(&self) -> u8 {
        self.faulted
    }

    pub fn is_faulted(&self, channel: usize) -> bool {
        channel < CHANNELS && self.faulted & (1 << channel) != 0
    }

    pub fn channels(&self) -> &[D; CHANNELS] {
        &self.channels
    }

    /// Release all channels.
    pub fn terminate(self) {}
}
