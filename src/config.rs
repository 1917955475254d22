//! Run settings for the optimizer.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::oc::DEFAULT_MAX_BISECTION_ITERATIONS;

/// Settings that stay constant for a whole optimization run.
///
/// Missing fields in a JSON document take their default values, unknown fields are
/// rejected.
///
/// # Examples
/// ```
/// use simpx::OptimizationConfig;
///
/// let config = OptimizationConfig::from_json_str(r#"{ "volume_fraction": 0.4 }"#)
///     .expect("valid document");
/// assert_eq!(config.volume_fraction, 0.4);
/// assert_eq!(config.penalty, 3.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizationConfig {
    /// Target proportion of the domain that remains solid.
    pub volume_fraction: f64,
    /// SIMP penalization exponent `p`.
    pub penalty: f64,
    /// Elastic modulus of fully dense material.
    pub base_modulus: f64,
    /// Largest change of any density in a single iteration.
    pub move_limit: f64,
    /// Convergence tolerance on the density change, also used for the bisection bracket.
    pub tolerance: f64,
    /// Maximum number of outer iterations.
    pub max_iterations: usize,
    /// Maximum number of bisection steps inside one update.
    pub max_bisection_iterations: usize,
    /// Optional wall-clock budget for the whole run in seconds.
    pub time_budget_secs: Option<f64>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            volume_fraction: 0.5,
            penalty: 3.0,
            base_modulus: 210_000.0,
            move_limit: 0.2,
            tolerance: 1.0e-4,
            max_iterations: 100,
            max_bisection_iterations: DEFAULT_MAX_BISECTION_ITERATIONS,
            time_budget_secs: None,
        }
    }
}

impl OptimizationConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents and the matching
    /// validation variant for out-of-range values.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the errors of
    /// [`OptimizationConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_json_str(&document)
    }

    /// Check every field against its admissible range.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] variant naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.volume_fraction > 0.0 && self.volume_fraction <= 1.0) {
            return Err(ConfigError::VolumeFraction(self.volume_fraction));
        }
        if !(self.penalty >= 1.0 && self.penalty.is_finite()) {
            return Err(ConfigError::Penalty(self.penalty));
        }
        if !(self.base_modulus > 0.0 && self.base_modulus.is_finite()) {
            return Err(ConfigError::BaseModulus(self.base_modulus));
        }
        if !(self.move_limit > 0.0 && self.move_limit <= 1.0) {
            return Err(ConfigError::MoveLimit(self.move_limit));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(ConfigError::Tolerance(self.tolerance));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::MaxIterations);
        }
        if self.max_bisection_iterations == 0 {
            return Err(ConfigError::MaxBisectionIterations);
        }
        if let Some(seconds) = self.time_budget_secs {
            if !(seconds >= 0.0 && seconds.is_finite()) {
                return Err(ConfigError::TimeBudget(seconds));
            }
        }
        Ok(())
    }

    /// Wall-clock budget as a [`Duration`], if one is configured.
    #[must_use]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
    }
}
