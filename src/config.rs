// Engine configuration.
//
// Everything the flagging rules compare against lives here as a named
// field; nothing in `flags` uses an inline cutoff. The whole config is
// handed to `Engine::new`, there is no process-wide instance.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cutoffs for the category flagging rules.
///
/// Defaults are policy, not derived values; deployments are expected to
/// tune them through a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    /// Percentile (0-100) of category spend shares a category must reach
    /// to count as high-spend.
    pub spend_share_percentile: f64,
    /// Transparency below this percentage counts as low.
    pub transparency_floor_pct: f64,
    /// Lift at or beyond this multiple (or its reciprocal) is an outlier.
    pub lift_multiple: f64,
    /// Top-3 vendor share at which concentration becomes a warning.
    pub concentration_warning_pct: f64,
    /// Top-3 vendor share at which concentration becomes high severity.
    pub concentration_high_pct: f64,
    /// Minimum category spend, in paise, for lift outliers to be reported.
    pub materiality_floor_paise: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            spend_share_percentile: 75.0,
            transparency_floor_pct: 25.0,
            lift_multiple: 2.0,
            concentration_warning_pct: 60.0,
            concentration_high_pct: 85.0,
            // Rs 10 lakh
            materiality_floor_paise: 100_000_000,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.spend_share_percentile) {
            return Err(ConfigError::Invalid(format!(
                "spend_share_percentile must be within 0..=100, got {}",
                self.spend_share_percentile
            )));
        }
        if !(0.0..=100.0).contains(&self.transparency_floor_pct) {
            return Err(ConfigError::Invalid(format!(
                "transparency_floor_pct must be within 0..=100, got {}",
                self.transparency_floor_pct
            )));
        }
        if !(self.lift_multiple.is_finite() && self.lift_multiple > 1.0) {
            return Err(ConfigError::Invalid(format!(
                "lift_multiple must be greater than 1, got {}",
                self.lift_multiple
            )));
        }
        if self.concentration_warning_pct > self.concentration_high_pct {
            return Err(ConfigError::Invalid(format!(
                "concentration_warning_pct ({}) exceeds concentration_high_pct ({})",
                self.concentration_warning_pct, self.concentration_high_pct
            )));
        }
        if !(0.0..=100.0).contains(&self.concentration_warning_pct)
            || !(0.0..=100.0).contains(&self.concentration_high_pct)
        {
            return Err(ConfigError::Invalid(
                "concentration thresholds must be within 0..=100".to_string(),
            ));
        }
        if self.materiality_floor_paise < 0 {
            return Err(ConfigError::Invalid(format!(
                "materiality_floor_paise must not be negative, got {}",
                self.materiality_floor_paise
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
}

impl EngineConfig {
    /// Read a JSON config file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|e| match e {
            ConfigError::Json { source, .. } => ConfigError::Json {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: Default::default(),
            source,
        })?;
        config.thresholds.validate()?;
        Ok(config)
    }
}
