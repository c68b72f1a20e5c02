//! Background estimators driven by delayed counts.

use crate::queue::DelayQueue;
use crate::Count;

/// A recursive background estimator.
///
/// The detector seeds it once from a full [`DelayQueue`], then feeds it one
/// count per step, always the count that left the queue.
pub trait Smoother {
    /// Seed from the counts collected during startup.
    fn initialize(&mut self, queue: &DelayQueue);

    /// Fold in a delayed count and return the new background forecast.
    fn update(&mut self, x: Count) -> f64;

    /// The current forecast.
    fn forecast(&self) -> f64;

    /// Name of this estimator (for tracing).
    fn name(&self) -> &str;
}

/// Single exponential smoothing.
#[derive(Debug, Clone)]
pub struct SingleExponential {
    alpha: f64,
    lambda: f64,
}

impl SingleExponential {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, lambda: 0.0 }
    }
}

impl Smoother for SingleExponential {
    fn initialize(&mut self, queue: &DelayQueue) {
        self.lambda = queue.mean().unwrap_or(0.0);
    }

    fn update(&mut self, x: Count) -> f64 {
        self.lambda = self.alpha * x as f64 + (1.0 - self.alpha) * self.lambda;
        self.lambda
    }

    fn forecast(&self) -> f64 {
        self.lambda
    }

    fn name(&self) -> &str {
        "ses"
    }
}

/// Double exponential (Holt) smoothing with a level and a trend, forecasting
/// `horizon` steps ahead to make up for the delay.
#[derive(Debug, Clone)]
pub struct DoubleExponential {
    alpha: f64,
    beta: f64,
    horizon: usize,
    s_0: Option<f64>,
    b_0: Option<f64>,
    level: f64,
    trend: f64,
}

impl DoubleExponential {
    pub fn new(alpha: f64, beta: f64, horizon: usize, s_0: Option<f64>, b_0: Option<f64>) -> Self {
        Self {
            alpha,
            beta,
            horizon,
            s_0,
            b_0,
            level: 0.0,
            trend: 0.0,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }
}

impl Smoother for DoubleExponential {
    fn initialize(&mut self, queue: &DelayQueue) {
        self.level = self.s_0.unwrap_or_else(|| queue.mean().unwrap_or(0.0));
        self.trend = self.b_0.unwrap_or(0.0);
    }

    fn update(&mut self, x: Count) -> f64 {
        let level = self.level;
        let trend = self.trend;
        self.level = self.alpha * x as f64 + (1.0 - self.alpha) * (level + trend);
        self.trend = self.beta * (self.level - level) + (1.0 - self.beta) * trend;
        self.forecast()
    }

    fn forecast(&self) -> f64 {
        self.level + self.horizon as f64 * self.trend
    }

    fn name(&self) -> &str {
        "des"
    }
}
