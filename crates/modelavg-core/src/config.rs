//! Aggregation configuration.
//!
//! The confidence multiplier, duplicate handling and display precision are
//! passed into each call rather than read from module-level constants, so the
//! same ensemble can be summarized at several confidence levels.

use std::path::Path;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{AggregationError, Result};

/// Normal-approximation multiplier for a two-sided 95% interval.
pub const DEFAULT_CI_MULTIPLIER: f64 = 1.96;

/// Decimal places used when rendering tables.
pub const DEFAULT_DECIMAL_PLACES: usize = 2;

/// What to do when the same `solID` arrives more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first record seen for each id; later ones are discarded.
    #[default]
    KeepFirst,
    /// Fail with `DuplicateSolution`.
    Reject,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepFirst => write!(f, "keep_first"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Tunable parameters for one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Multiplier applied to the standard error for the interval half-width.
    pub ci_multiplier: f64,
    /// Survivor selection for repeated solution ids.
    pub duplicate_policy: DuplicatePolicy,
    /// Rounding precision for rendered tables. Computation is never rounded.
    pub decimal_places: usize,
    /// Keep base variables (intercept, trend, season, ...) in contribution shares.
    pub include_base: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            ci_multiplier: DEFAULT_CI_MULTIPLIER,
            duplicate_policy: DuplicatePolicy::KeepFirst,
            decimal_places: DEFAULT_DECIMAL_PLACES,
            include_base: true,
        }
    }
}

impl AggregationConfig {
    /// Default config with the multiplier derived from a two-sided
    /// confidence level, e.g. `0.90` gives ~1.645.
    pub fn with_confidence_level(level: f64) -> Result<Self> {
        Ok(Self {
            ci_multiplier: z_for_confidence(level)?,
            ..Self::default()
        })
    }

    /// Reject multipliers that would produce inverted or undefined intervals.
    pub fn validate(&self) -> Result<()> {
        if !self.ci_multiplier.is_finite() || self.ci_multiplier < 0.0 {
            return Err(AggregationError::InvalidConfig(format!(
                "ci_multiplier must be finite and non-negative, got {}",
                self.ci_multiplier
            )));
        }
        Ok(())
    }
}

/// Two-sided standard normal quantile for `level` in (0, 1).
pub fn z_for_confidence(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(AggregationError::InvalidConfig(format!(
            "confidence level must be in (0, 1), got {level}"
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AggregationError::InvalidConfig(format!("standard normal: {e}")))?;
    Ok(normal.inverse_cdf(1.0 - (1.0 - level) / 2.0))
}

/// Load an [`AggregationConfig`] from a JSON file. Missing keys take defaults.
pub fn load_config_from_path(path: &Path) -> Result<AggregationConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AggregationError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
    })?;
    let config = serde_json::from_str::<AggregationConfig>(&raw).map_err(|e| {
        AggregationError::InvalidConfig(format!("failed to parse config JSON: {e}"))
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_matches_fixed_95_multiplier() {
        let cfg = AggregationConfig::default();
        assert_eq!(cfg.ci_multiplier, 1.96);
        assert_eq!(cfg.duplicate_policy, DuplicatePolicy::KeepFirst);
        assert_eq!(cfg.decimal_places, 2);
        assert!(cfg.include_base);
    }

    #[test]
    fn z_for_common_levels() {
        assert!((z_for_confidence(0.95).unwrap() - 1.959964).abs() < 1e-5);
        assert!((z_for_confidence(0.90).unwrap() - 1.644854).abs() < 1e-5);
        assert!((z_for_confidence(0.99).unwrap() - 2.575829).abs() < 1e-5);
    }

    #[test]
    fn z_rejects_out_of_range() {
        assert!(z_for_confidence(0.0).is_err());
        assert!(z_for_confidence(1.0).is_err());
        assert!(z_for_confidence(f64::NAN).is_err());
    }

    #[test]
    fn validate_rejects_bad_multiplier() {
        let cfg = AggregationConfig {
            ci_multiplier: f64::INFINITY,
            ..AggregationConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(AggregationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_partial_json_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ci_multiplier": 2.576, "duplicate_policy": "reject"}}"#).unwrap();
        let cfg = load_config_from_path(file.path()).unwrap();
        assert_eq!(cfg.ci_multiplier, 2.576);
        assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(cfg.decimal_places, DEFAULT_DECIMAL_PLACES);
    }

    #[test]
    fn load_garbage_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            load_config_from_path(file.path()),
            Err(AggregationError::InvalidConfig(_))
        ));
    }
}
