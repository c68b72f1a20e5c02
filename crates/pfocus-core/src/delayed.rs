//! Poisson-FOCuS with an automatic, delayed background estimate.
//!
//! Startup runs through three phases:
//!
//! - `Collect`: the first `m` counts fill the delay queue, then the smoother
//!   is seeded from them.
//! - `Update`: for `sleep` more steps the background tracks the delayed
//!   counts but nothing is tested.
//! - `Test`: steady state. The background absorbs the count leaving the
//!   queue and the current count is tested against it.
//!
//! A trigger whose changepoint lies `window` or more steps back is stale and
//! gets suppressed, both from the step flag and from [`DelayedFocus::change`].

use crate::change::Change;
use crate::error::FocusError;
use crate::focus::PoissonFocus;
use crate::params::{DesParams, FocusParams, SesParams};
use crate::queue::DelayQueue;
use crate::smoothing::{DoubleExponential, SingleExponential, Smoother};
use crate::{Count, Detector};

/// Externally visible phase of a [`DelayedFocus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collect,
    Update,
    Test,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
enum Schedule {
    Collect,
    Update,
    Test,
    Stopped(FocusError),
}

/// A [`PoissonFocus`] fed by its own background estimator `S`.
#[derive(Debug, Clone)]
pub struct DelayedFocus<S> {
    focus: PoissonFocus,
    queue: DelayQueue,
    smoother: S,
    schedule: Schedule,
    /// Counts down from `sleep + m` through the startup phases.
    countdown: usize,
    sleep: usize,
    /// Changes at this offset or older are stale. `None` keeps them all.
    window: Option<usize>,
}

/// Poisson-FOCuS over single exponential smoothing.
pub type PoissonFocusSes = DelayedFocus<SingleExponential>;

/// Poisson-FOCuS over double exponential smoothing.
pub type PoissonFocusDes = DelayedFocus<DoubleExponential>;

impl DelayedFocus<SingleExponential> {
    pub fn new(params: &SesParams) -> Result<Self, FocusError> {
        params.validate()?;
        Self::build(
            &params.focus(),
            SingleExponential::new(params.alpha),
            params.m,
            params.sleep,
            Some(params.m),
        )
    }
}

impl DelayedFocus<DoubleExponential> {
    pub fn new(params: &DesParams) -> Result<Self, FocusError> {
        params.validate()?;
        let smoother =
            DoubleExponential::new(params.alpha, params.beta, params.m, params.s_0, params.b_0);
        Self::build(
            &params.focus(),
            smoother,
            params.m,
            params.sleep,
            params.t_max,
        )
    }
}

impl<S: Smoother> DelayedFocus<S> {
    /// Assemble a detector from a custom estimator. `m` is the delay, `sleep`
    /// the number of update-only steps.
    pub fn build(
        focus: &FocusParams,
        smoother: S,
        m: usize,
        sleep: usize,
        window: Option<usize>,
    ) -> Result<Self, FocusError> {
        let focus = PoissonFocus::new(focus)?;
        let queue = DelayQueue::new(m)?;
        let countdown = sleep
            .checked_add(m)
            .ok_or_else(|| FocusError::invalid("sleep", "sleep + m overflows"))?;
        tracing::debug!(
            smoother = smoother.name(),
            m,
            sleep,
            window,
            "delayed focus initialized"
        );
        Ok(Self {
            focus,
            queue,
            smoother,
            schedule: Schedule::Collect,
            countdown,
            sleep,
            window,
        })
    }

    /// Feed one count. Returns whether a fresh trigger fired on this step.
    ///
    /// Errors latch: once a step fails, every later step returns the same
    /// error.
    pub fn step(&mut self, count: Count) -> Result<bool, FocusError> {
        if let Schedule::Stopped(err) = &self.schedule {
            return Err(err.clone());
        }
        if count < 0 {
            return Err(self.stop(FocusError::InvalidObservation {
                count,
                background: self.smoother.forecast(),
            }));
        }
        match self.phase() {
            Phase::Collect => {
                self.queue.enqueue(count);
                self.countdown -= 1;
                if self.countdown == self.sleep {
                    self.smoother.initialize(&self.queue);
                    let next = if self.sleep > 0 {
                        Schedule::Update
                    } else {
                        Schedule::Test
                    };
                    self.transition(next);
                }
                Ok(false)
            }
            Phase::Update => {
                self.roll(count);
                self.countdown -= 1;
                if self.countdown == 0 {
                    self.transition(Schedule::Test);
                }
                Ok(false)
            }
            Phase::Test => {
                let background = self.roll(count);
                match self.focus.step(count, background) {
                    Ok(triggered) => Ok(triggered && self.is_fresh(&self.focus.change())),
                    Err(err) => Err(self.stop(err)),
                }
            }
            Phase::Stopped => Ok(false),
        }
    }

    /// Move the oldest queued count into the estimator and queue `count`.
    fn roll(&mut self, count: Count) -> f64 {
        if let Some(old) = self.queue.dequeue() {
            self.smoother.update(old);
        }
        self.queue.enqueue(count);
        self.smoother.forecast()
    }

    fn transition(&mut self, next: Schedule) {
        tracing::debug!(from = ?self.phase(), to = ?next, "delayed focus phase change");
        self.schedule = next;
    }

    fn stop(&mut self, err: FocusError) -> FocusError {
        tracing::debug!(error = %err, "delayed focus stopped");
        self.schedule = Schedule::Stopped(err.clone());
        err
    }

    fn is_fresh(&self, change: &Change) -> bool {
        self.window.map_or(true, |w| change.offset < w)
    }

    /// The latest change, [`Change::NONE`] when there was no trigger or it
    /// was stale.
    pub fn change(&self) -> Change {
        let change = self.focus.change();
        if self.is_fresh(&change) {
            change
        } else {
            Change::NONE
        }
    }

    pub fn phase(&self) -> Phase {
        match self.schedule {
            Schedule::Collect => Phase::Collect,
            Schedule::Update => Phase::Update,
            Schedule::Test => Phase::Test,
            Schedule::Stopped(_) => Phase::Stopped,
        }
    }

    /// Current background forecast. Zero until the queue has filled.
    pub fn lambda(&self) -> f64 {
        self.smoother.forecast()
    }

    pub fn smoother(&self) -> &S {
        &self.smoother
    }

    pub fn focus(&self) -> &PoissonFocus {
        &self.focus
    }

    pub fn m(&self) -> usize {
        self.queue.capacity()
    }

    pub fn is_stopped(&self) -> bool {
        self.phase() == Phase::Stopped
    }

    /// Release the detector and its buffers.
    pub fn terminate(self) {}
}

impl<S: Smoother> Detector for DelayedFocus<S> {
    fn step(&mut self, count: Count) -> Result<bool, FocusError> {
        DelayedFocus::step(self, count)
    }

    fn change(&self) -> Change {
        DelayedFocus::change(self)
    }

    fn is_stopped(&self) -> bool {
        DelayedFocus::is_stopped(self)
    }
}
