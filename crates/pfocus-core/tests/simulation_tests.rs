//! Statistical behaviour on simulated Poisson streams.

use pfocus_core::{Count, FocusParams, PoissonFocus, PoissonFocusSes, SesParams};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};

const STEPS: usize = 50_000;

fn stream(seed: u64, rate: f64) -> Vec<Count> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let dist = Poisson::new(rate).unwrap();
    (0..STEPS).map(|_| dist.sample(&mut rng) as Count).collect()
}

/// Triggers over the whole stream, restarting the detector after each.
fn false_alarms(xs: &[Count], background: f64, threshold_std: f64) -> usize {
    let params = FocusParams::new(threshold_std, 1.0);
    let mut f = PoissonFocus::new(&params).unwrap();
    let mut alarms = 0;
    for &x in xs {
        if f.step(x, background).unwrap() {
            alarms += 1;
            f = PoissonFocus::new(&params).unwrap();
        }
    }
    alarms
}

#[test]
fn test_false_alarm_rate_falls_with_threshold() {
    let xs = stream(42, 5.0);
    let at_3 = false_alarms(&xs, 5.0, 3.0);
    let at_5 = false_alarms(&xs, 5.0, 5.0);
    assert!(at_3 > 10, "expected frequent 3-sigma alarms, got {at_3}");
    assert!(at_5 <= 3, "too many 5-sigma alarms: {at_5}");
    assert!(at_5 < at_3);
}

#[test]
fn test_automatic_background_quiet_at_high_threshold() {
    let xs = stream(7, 30.0);
    let params = SesParams {
        threshold_std: 5.5,
        mu_min: 1.1,
        alpha: 0.005,
        m: 16,
        sleep: 256,
    };
    let mut f = PoissonFocusSes::new(&params).unwrap();
    let mut alarms = 0;
    let mut previous = false;
    for &x in &xs {
        let triggered = f.step(x).unwrap();
        if triggered && !previous {
            alarms += 1;
        }
        previous = triggered;
    }
    assert!(alarms <= 2, "{alarms} alarms on a flat stream");
}
