// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Source-set resampling policies.

Two policies decide which source candidates connect to a target:

- fixed in-degree: draw exactly the current number of distinct sources,
  without replacement, weighted by the per-candidate probabilities;
- free resampling: one independent Bernoulli trial per candidate.

Draw order matters downstream (it decides which new source relabels
which retained connection, and which sources seed newly generated
connections), so both policies return sources in draw order: selection
order for the weighted draw, ascending candidate order for Bernoulli.
*/

use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::Rng;

use rewire_models::NodeId;

use crate::types::{RewireError, RewireResult};

/// Weighted draw of exactly `amount` distinct sources for `target`.
///
/// Weights are normalized internally; fails when the candidate pool is
/// smaller than the draw or when no candidate has positive weight.
pub fn draw_fixed_indegree<R: Rng>(
    src_ids: &[NodeId],
    p_src: &Array1<f64>,
    amount: usize,
    target: NodeId,
    rng: &mut R,
) -> RewireResult<Vec<NodeId>> {
    debug_assert_eq!(src_ids.len(), p_src.len());
    if amount == 0 {
        return Ok(Vec::new());
    }
    if src_ids.len() < amount {
        return Err(RewireError::InsufficientSources {
            target,
            needed: amount,
            available: src_ids.len(),
        });
    }
    let indices: Vec<usize> = (0..src_ids.len()).collect();
    let chosen = indices
        .choose_multiple_weighted(rng, amount, |&i| p_src[i])
        .map_err(|e| RewireError::InvalidProbabilities {
            target,
            reason: e.to_string(),
        })?;
    Ok(chosen.map(|&i| src_ids[i]).collect())
}

/// Independent Bernoulli trial per candidate; in-degree is free to change
pub fn draw_bernoulli<R: Rng>(
    src_ids: &[NodeId],
    p_src: &Array1<f64>,
    rng: &mut R,
) -> Vec<NodeId> {
    debug_assert_eq!(src_ids.len(), p_src.len());
    let mut selected = Vec::new();
    for (i, &id) in src_ids.iter().enumerate() {
        if rng.gen::<f64>() < p_src[i] {
            selected.push(id);
        }
    }
    selected
}
