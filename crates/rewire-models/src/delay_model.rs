// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Distance-dependent synaptic delay model.

`LinDelayModel` maps a soma-to-synapse distance to the parameters of a
truncated normal delay distribution: a linear mean, a constant standard
deviation and a constant lower bound. The rewiring core queries these
three statistics per synapse and draws the actual delay itself.
*/

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Statistic of the delay distribution queried at a given distance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStat {
    Mean,
    Std,
    Min,
}

/// Linear distance-dependent delay model.
///
/// `delay_mean_coefs` is `[intercept, slope]`: mean(d) = intercept + slope * d.
/// Std and min are distance-independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinDelayModel {
    pub delay_mean_coefs: [f64; 2],
    pub delay_std: f64,
    pub delay_min: f64,
}

impl LinDelayModel {
    pub fn new(delay_mean_coefs: [f64; 2], delay_std: f64, delay_min: f64) -> ModelResult<Self> {
        let model = Self {
            delay_mean_coefs,
            delay_std,
            delay_min,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load a model from a JSON file, validating parameter ranges
    pub fn from_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::InvalidModelFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let model: LinDelayModel =
            serde_json::from_str(&content).map_err(|e| ModelError::InvalidModelFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> ModelResult<()> {
        if !self.delay_mean_coefs.iter().all(|c| c.is_finite()) {
            return Err(ModelError::InvalidParameters(
                "delay_mean_coefs must be finite".to_string(),
            ));
        }
        if !(self.delay_std.is_finite() && self.delay_std > 0.0) {
            return Err(ModelError::InvalidParameters(format!(
                "delay_std must be finite and > 0, got {}",
                self.delay_std
            )));
        }
        if !(self.delay_min.is_finite() && self.delay_min >= 0.0) {
            return Err(ModelError::InvalidParameters(format!(
                "delay_min must be finite and >= 0, got {}",
                self.delay_min
            )));
        }
        Ok(())
    }

    /// Mean delay at the given distance
    pub fn mean(&self, distance: f64) -> f64 {
        self.delay_mean_coefs[0] + self.delay_mean_coefs[1] * distance
    }

    /// Delay standard deviation (distance-independent)
    pub fn std(&self, _distance: f64) -> f64 {
        self.delay_std
    }

    /// Minimum delay (distance-independent)
    pub fn min(&self, _distance: f64) -> f64 {
        self.delay_min
    }

    /// Query one statistic at the given distance
    pub fn evaluate(&self, distance: f64, stat: DelayStat) -> f64 {
        match stat {
            DelayStat::Mean => self.mean(distance),
            DelayStat::Std => self.std(distance),
            DelayStat::Min => self.min(distance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_mean_constant_std_min() {
        let model = LinDelayModel::new([0.5, 0.003], 0.2, 0.1).unwrap();
        assert_eq!(model.mean(0.0), 0.5);
        assert_eq!(model.mean(100.0), 0.8);
        assert_eq!(model.std(0.0), model.std(500.0));
        assert_eq!(model.evaluate(100.0, DelayStat::Min), 0.1);
    }

    #[test]
    fn zero_std_rejected() {
        assert!(LinDelayModel::new([0.5, 0.003], 0.0, 0.1).is_err());
    }
}
