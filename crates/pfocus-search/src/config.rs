//! Search configuration.
//!
//! The algorithm is picked from the keys of `algorithm_params`: a `beta`
//! selects double exponential smoothing, a `majority` selects the
//! four-quadrant trigger. Unknown keys are rejected.

use serde::{Deserialize, Serialize};

use pfocus_core::{BftDesParams, BftParams, DesParams, FocusError, SesParams};

use crate::gti::DEFAULT_GTI_TOLERANCE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Invalid algorithm parameters: {0}")]
    Algorithm(#[from] FocusError),
}

/// Parameters of the trigger algorithm. Variants are tried in order, most
/// specific first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlgorithmParams {
    BftDes(BftDesParams),
    Des(DesParams),
    Bft(BftParams),
    Ses(SesParams),
}

impl AlgorithmParams {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BftDes(_) => "bft-des",
            Self::Des(_) => "pf-des",
            Self::Bft(_) => "bft",
            Self::Ses(_) => "pf-ses",
        }
    }

    /// Whether the algorithm votes over detector quadrants.
    pub fn is_multichannel(&self) -> bool {
        matches!(self, Self::BftDes(_) | Self::Bft(_))
    }

    /// Level smoothing factor.
    pub fn alpha(&self) -> f64 {
        match self {
            Self::BftDes(p) => p.alpha,
            Self::Des(p) => p.alpha,
            Self::Bft(p) => p.alpha,
            Self::Ses(p) => p.alpha,
        }
    }

    /// Background delay in bins.
    pub fn m(&self) -> usize {
        match self {
            Self::BftDes(p) => p.m,
            Self::Des(p) => p.m,
            Self::Bft(p) => p.m,
            Self::Ses(p) => p.m,
        }
    }

    pub fn validate(&self) -> Result<(), FocusError> {
        match self {
            Self::BftDes(p) => p.validate(),
            Self::Des(p) => p.validate(),
            Self::Bft(p) => p.validate(),
            Self::Ses(p) => p.validate(),
        }
    }
}

fn default_gti_tolerance() -> f64 {
    DEFAULT_GTI_TOLERANCE
}

/// Everything a search needs besides the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Bin width in seconds.
    pub binning: f64,
    /// Bins to skip after a trigger before searching again.
    pub skip: usize,
    /// Energy band `[low, high)` in keV.
    pub energy_lims: (f64, f64),
    /// Trigger algorithm and its parameters.
    pub algorithm_params: AlgorithmParams,
    /// GTIs closer than this many seconds are searched as one.
    #[serde(default = "default_gti_tolerance")]
    pub gti_tolerance: f64,
}

impl SearchConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.binning > 0.0) || !self.binning.is_finite() {
            return Err(ConfigError::Invalid {
                name: "binning",
                reason: format!("must be a positive finite number, got {}", self.binning),
            });
        }
        if self.skip < 1 {
            return Err(ConfigError::Invalid {
                name: "skip",
                reason: "must be at least 1".to_string(),
            });
        }
        let (low, high) = self.energy_lims;
        if !(low < high) {
            return Err(ConfigError::Invalid {
                name: "energy_lims",
                reason: format!("empty band [{low}, {high})"),
            });
        }
        if !(self.gti_tolerance >= 0.0) {
            return Err(ConfigError::Invalid {
                name: "gti_tolerance",
                reason: format!("must be non-negative, got {}", self.gti_tolerance),
            });
        }
        self.algorithm_params.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(params: &str) -> String {
        format!(
            r#"{{ "binning": 0.1, "skip": 50, "energy_lims": [20.0, 300.0], "algorithm_params": {params} }}"#
        )
    }

    #[test]
    fn test_selects_ses() {
        let c = SearchConfig::from_json(&config(
            r#"{ "threshold_std": 4.5, "mu_min": 1.1, "alpha": 0.005, "m": 40, "sleep": 120 }"#,
        ))
        .unwrap();
        assert!(matches!(c.algorithm_params, AlgorithmParams::Ses(_)));
        assert_eq!(c.gti_tolerance, DEFAULT_GTI_TOLERANCE);
    }

    #[test]
    fn test_selects_bft() {
        let c = SearchConfig::from_json(&config(
            r#"{ "threshold_std": 4.5, "mu_min": 1.1, "alpha": 0.005, "m": 40, "sleep": 120, "majority": 3 }"#,
        ))
        .unwrap();
        assert!(matches!(c.algorithm_params, AlgorithmParams::Bft(_)));
        assert!(c.algorithm_params.is_multichannel());
    }

    #[test]
    fn test_selects_des_and_bft_des() {
        let des = SearchConfig::from_json(&config(
            r#"{ "threshold_std": 4.5, "mu_min": 1.1, "alpha": 0.005, "beta": 0.001, "m": 40, "sleep": 120, "t_max": 40 }"#,
        ))
        .unwrap();
        assert!(matches!(des.algorithm_params, AlgorithmParams::Des(_)));

        let bft_des = SearchConfig::from_json(&config(
            r#"{ "threshold_std": 4.5, "mu_min": 1.1, "alpha": 0.005, "beta": 0.001, "m": 40, "sleep": 120, "t_max": 40, "majority": 3 }"#,
        ))
        .unwrap();
        assert!(matches!(bft_des.algorithm_params, AlgorithmParams::BftDes(_)));
        assert_eq!(bft_des.algorithm_params.name(), "bft-des");
    }

    #[test]
    fn test_unmatched_algorithm_rejected() {
        let r = SearchConfig::from_json(&config(r#"{ "threshold_std": 4.5, "alpha": 0.1 }"#));
        assert!(matches!(r, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_skip = r#"{ "binning": 0.1, "skip": 0, "energy_lims": [20.0, 300.0],
            "algorithm_params": { "threshold_std": 4.5, "alpha": 0.005, "m": 40, "sleep": 120 } }"#;
        assert!(matches!(
            SearchConfig::from_json(bad_skip),
            Err(ConfigError::Invalid { name: "skip", .. })
        ));

        let bad_alpha = config(r#"{ "threshold_std": 4.5, "alpha": 2.0, "m": 40, "sleep": 120 }"#);
        assert!(matches!(
            SearchConfig::from_json(&bad_alpha),
            Err(ConfigError::Algorithm(FocusError::InvalidInput { name: "alpha", .. }))
        ));

        let bad_band = r#"{ "binning": 0.1, "skip": 5, "energy_lims": [300.0, 20.0],
            "algorithm_params": { "threshold_std": 4.5, "alpha": 0.005, "m": 40, "sleep": 120 } }"#;
        assert!(SearchConfig::from_json(bad_band).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let c = SearchConfig::from_json(&config(
            r#"{ "threshold_std": 4.5, "mu_min": 1.1, "alpha": 0.005, "m": 40, "sleep": 120, "majority": 3 }"#,
        ))
        .unwrap();
        let again = SearchConfig::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(c, again);
    }
}
