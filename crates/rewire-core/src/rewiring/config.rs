// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Rewiring configuration.

Deserialized from the JSON manipulation config; `validate()` enforces the
input contract before any table mutation happens.
*/

use serde::Deserialize;

use rewire_models::{NodeSelector, SynapseClass};

use crate::types::{RewireError, RewireResult};

/// How synapses for newly created connections are manufactured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    /// Duplicate existing synapse positions and resample non-morphology
    /// property values from statistically similar existing synapses
    #[default]
    DuplicateSample,
}

/// Configuration of one rewiring step
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewiringConfig {
    /// Synapse class of the source candidate set
    pub syn_class: SynapseClass,

    /// Optional subset predicate on the source population
    #[serde(default)]
    pub sel_src: Option<NodeSelector>,

    /// Optional subset predicate on the target population
    #[serde(default)]
    pub sel_dest: Option<NodeSelector>,

    /// Preserve each target's current in-degree (and thus the existing
    /// per-connection synapse counts)
    #[serde(default)]
    pub keep_indegree: bool,

    /// Generation method for newly created connections
    #[serde(default)]
    pub gen_method: GenerationMethod,

    /// Percentage of eligible target neurons actually rewired
    #[serde(default = "default_amount_pct")]
    pub amount_pct: f64,
}

fn default_amount_pct() -> f64 {
    100.0
}

impl RewiringConfig {
    /// Minimal config: rewire every target of the given class, free
    /// resampling, duplicate-and-sample generation
    pub fn new(syn_class: SynapseClass) -> Self {
        Self {
            syn_class,
            sel_src: None,
            sel_dest: None,
            keep_indegree: false,
            gen_method: GenerationMethod::DuplicateSample,
            amount_pct: 100.0,
        }
    }

    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> RewireResult<Self> {
        let config: RewiringConfig = serde_json::from_str(json)
            .map_err(|e| RewireError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RewireResult<()> {
        if !(0.0..=100.0).contains(&self.amount_pct) {
            return Err(RewireError::AmountOutOfRange(self.amount_pct));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_json() {
        let cfg = RewiringConfig::from_json(r#"{ "syn_class": "EXC" }"#).unwrap();
        assert_eq!(cfg.syn_class, SynapseClass::Exc);
        assert!(!cfg.keep_indegree);
        assert_eq!(cfg.gen_method, GenerationMethod::DuplicateSample);
        assert_eq!(cfg.amount_pct, 100.0);
    }

    #[test]
    fn rejects_out_of_range_amount() {
        let res = RewiringConfig::from_json(r#"{ "syn_class": "INH", "amount_pct": 120.0 }"#);
        assert!(matches!(res, Err(RewireError::AmountOutOfRange(_))));
    }

    #[test]
    fn rejects_unknown_generation_method() {
        let res =
            RewiringConfig::from_json(r#"{ "syn_class": "EXC", "gen_method": "grow_axons" }"#);
        assert!(matches!(res, Err(RewireError::InvalidConfig(_))));
    }
}
