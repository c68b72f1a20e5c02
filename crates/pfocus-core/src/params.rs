//! Parameter sets for every detector layer, with domain validation.
//!
//! Each struct deserializes from the flat key/value layout used by search
//! configuration files. `validate` is called by every constructor before any
//! buffer is allocated.

use serde::{Deserialize, Serialize};

use crate::error::FocusError;
use crate::CHANNELS;

fn default_mu_min() -> f64 {
    1.0
}

fn check_threshold(threshold_std: f64) -> Result<(), FocusError> {
    if !(threshold_std > 0.0) || !threshold_std.is_finite() {
        return Err(FocusError::invalid(
            "threshold_std",
            format!("must be a positive finite number, got {threshold_std}"),
        ));
    }
    Ok(())
}

fn check_mu_min(mu_min: f64) -> Result<(), FocusError> {
    if !(mu_min >= 1.0) || !mu_min.is_finite() {
        return Err(FocusError::invalid(
            "mu_min",
            format!("must be finite and >= 1, got {mu_min}"),
        ));
    }
    Ok(())
}

fn check_unit(name: &'static str, value: f64) -> Result<(), FocusError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(FocusError::invalid(
            name,
            format!("must lie in [0, 1], got {value}"),
        ));
    }
    Ok(())
}

fn check_delay(m: usize) -> Result<(), FocusError> {
    if m < 1 {
        return Err(FocusError::invalid("m", "must be at least 1"));
    }
    Ok(())
}

fn check_majority(majority: usize) -> Result<(), FocusError> {
    if !(1..=CHANNELS).contains(&majority) {
        return Err(FocusError::invalid(
            "majority",
            format!("must lie in [1, {CHANNELS}], got {majority}"),
        ));
    }
    Ok(())
}

/// Parameters of a bare [`crate::PoissonFocus`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FocusParams {
    /// Trigger threshold in standard deviations.
    pub threshold_std: f64,
    /// Minimum detectable rate ratio. Larger values keep fewer curves.
    #[serde(default = "default_mu_min")]
    pub mu_min: f64,
}

impl FocusParams {
    pub fn new(threshold_std: f64, mu_min: f64) -> Self {
        Self {
            threshold_std,
            mu_min,
        }
    }

    pub fn validate(&self) -> Result<(), FocusError> {
        check_threshold(self.threshold_std)?;
        check_mu_min(self.mu_min)
    }
}

/// Parameters of a [`crate::PoissonFocusSes`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SesParams {
    /// Trigger threshold in standard deviations.
    pub threshold_std: f64,
    /// Minimum rate ratio worth tracking. `1` keeps every curve.
    #[serde(default = "default_mu_min")]
    pub mu_min: f64,
    /// Smoothing factor.
    pub alpha: f64,
    /// Background delay: counts are used for the estimate `m` steps late.
    pub m: usize,
    /// Steps spent updating the background before testing starts.
    pub sleep: usize,
}

impl SesParams {
    pub fn focus(&self) -> FocusParams {
        FocusParams::new(self.threshold_std, self.mu_min)
    }

    pub fn validate(&self) -> Result<(), FocusError> {
        self.focus().validate()?;
        check_unit("alpha", self.alpha)?;
        check_delay(self.m)
    }
}

/// Parameters of a [`crate::PoissonFocusDes`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesParams {
    /// Trigger threshold in standard deviations.
    pub threshold_std: f64,
    /// Minimum rate ratio worth tracking. `1` keeps every curve.
    #[serde(default = "default_mu_min")]
    pub mu_min: f64,
    /// Level smoothing factor.
    pub alpha: f64,
    /// Trend smoothing factor.
    pub beta: f64,
    /// Background delay and forecast horizon.
    pub m: usize,
    /// Steps spent updating the background before testing starts.
    pub sleep: usize,
    /// Triggers whose changepoint is `t_max` or more steps old are discarded.
    #[serde(default)]
    pub t_max: Option<usize>,
    /// Initial level. Defaults to the mean of the first `m` counts.
    #[serde(default)]
    pub s_0: Option<f64>,
    /// Initial trend. Defaults to zero.
    #[serde(default)]
    pub b_0: Option<f64>,
}

impl DesParams {
    pub fn focus(&self) -> FocusParams {
        FocusParams::new(self.threshold_std, self.mu_min)
    }

    pub fn validate(&self) -> Result<(), FocusError> {
        self.focus().validate()?;
        check_unit("alpha", self.alpha)?;
        check_unit("beta", self.beta)?;
        check_delay(self.m)?;
        if self.t_max == Some(0) {
            return Err(FocusError::invalid("t_max", "must be at least 1"));
        }
        if let Some(s_0) = self.s_0 {
            if !(s_0 >= 0.0) || !s_0.is_finite() {
                return Err(FocusError::invalid(
                    "s_0",
                    format!("must be a non-negative finite number, got {s_0}"),
                ));
            }
        }
        if let Some(b_0) = self.b_0 {
            if !(b_0 >= 0.0) || !b_0.is_finite() {
                return Err(FocusError::invalid(
                    "b_0",
                    format!("must be a non-negative finite number, got {b_0}"),
                ));
            }
        }
        Ok(())
    }
}

/// Parameters of a [`crate::BigTrigger`] over single exponential smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BftParams {
    /// Trigger threshold in standard deviations.
    pub threshold_std: f64,
    /// Minimum rate ratio worth tracking. `1` keeps every curve.
    #[serde(default = "default_mu_min")]
    pub mu_min: f64,
    /// Level smoothing factor.
    pub alpha: f64,
    /// Background delay in steps.
    pub m: usize,
    /// Steps spent updating the background before testing starts.
    pub sleep: usize,
    /// Channels that must trigger on the same step.
    pub majority: usize,
}

impl BftParams {
    pub fn channel(&self) -> SesParams {
        SesParams {
            threshold_std: self.threshold_std,
            mu_min: self.mu_min,
            alpha: self.alpha,
            m: self.m,
            sleep: self.sleep,
        }
    }

    pub fn validate(&self) -> Result<(), FocusError> {
        self.channel().validate()?;
        check_majority(self.majority)
    }
}

/// Parameters of a [`crate::BigTrigger`] over double exponential smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BftDesParams {
    /// Trigger threshold in standard deviations.
    pub threshold_std: f64,
    /// Minimum rate ratio worth tracking. `1` keeps every curve.
    #[serde(default = "default_mu_min")]
    pub mu_min: f64,
    /// Level smoothing factor.
    pub alpha: f64,
    /// Trend smoothing factor.
    pub beta: f64,
    /// Background delay in steps.
    pub m: usize,
    /// Steps spent updating the background before testing starts.
    pub sleep: usize,
    /// Triggers at this offset or older are stale. `None` keeps them all.
    #[serde(default)]
    pub t_max: Option<usize>,
    /// Initial level. Defaults to the mean of the first `m` counts.
    #[serde(default)]
    pub s_0: Option<f64>,
    /// Initial trend. Defaults to zero.
    #[serde(default)]
    pub b_0: Option<f64>,
    /// Channels that must trigger on the same step.
    pub majority: usize,
}

impl BftDesParams {
    pub fn channel(&self) -> DesParams {
        DesParams {
            threshold_std: self.threshold_std,
            mu_min: self.mu_min,
            alpha: self.alpha,
            beta: self.beta,
            m: self.m,
            sleep: self.sleep,
            t_max: self.t_max,
            s_0: self.s_0,
            b_0: self.b_0,
        }
    }

    pub fn validate(&self) -> Result<(), FocusError> {
        self.channel().validate()?;
        check_majority(self.majority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ses() -> SesParams {
        SesParams {
            threshold_std: 5.0,
            mu_min: 1.1,
            alpha: 0.005,
            m: 40,
            sleep: 120,
        }
    }

    #[test]
    fn test_valid_ses_params() {
        assert!(ses().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        for t in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let p = FocusParams::new(t, 1.0);
            assert!(
                matches!(p.validate(), Err(FocusError::InvalidInput { name: "threshold_std", .. })),
                "threshold {t} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_mu_min_below_one() {
        let p = FocusParams::new(3.0, 0.99);
        assert!(matches!(
            p.validate(),
            Err(FocusError::InvalidInput { name: "mu_min", .. })
        ));
    }

    #[test]
    fn test_rejects_alpha_outside_unit_interval() {
        let p = SesParams {
            alpha: 1.5,
            ..ses()
        };
        assert!(matches!(
            p.validate(),
            Err(FocusError::InvalidInput { name: "alpha", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_delay() {
        let p = SesParams { m: 0, ..ses() };
        assert!(matches!(
            p.validate(),
            Err(FocusError::InvalidInput { name: "m", .. })
        ));
    }

    #[test]
    fn test_majority_bounds() {
        let base = BftParams {
            threshold_std: 4.5,
            mu_min: 1.1,
            alpha: 0.005,
            m: 40,
            sleep: 120,
            majority: 3,
        };
        assert!(base.validate().is_ok());
        assert!(BftParams { majority: 0, ..base }.validate().is_err());
        assert!(BftParams { majority: 5, ..base }.validate().is_err());
        assert!(BftParams { majority: 4, ..base }.validate().is_ok());
    }

    #[test]
    fn test_mu_min_defaults_to_one() {
        let p: FocusParams = serde_json::from_str(r#"{ "threshold_std": 3.0 }"#).unwrap();
        assert_eq!(p.mu_min, 1.0);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let r: Result<SesParams, _> = serde_json::from_str(
            r#"{ "threshold_std": 3.0, "alpha": 0.1, "m": 4, "sleep": 0, "beta": 0.1 }"#,
        );
        assert!(r.is_err());
    }

    #[test]
    fn test_des_rejects_negative_initial_level() {
        let p = DesParams {
            threshold_std: 5.0,
            mu_min: 1.0,
            alpha: 0.1,
            beta: 0.0,
            m: 4,
            sleep: 0,
            t_max: None,
            s_0: Some(-1.0),
            b_0: None,
        };
        assert!(matches!(
            p.validate(),
            Err(FocusError::InvalidInput { name: "s_0", .. })
        ));
    }
}
