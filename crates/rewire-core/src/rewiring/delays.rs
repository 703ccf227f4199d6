// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Distance-dependent delay assignment.

Delays of rewired and newly synthesized synapses are drawn from a normal
distribution whose mean and std the delay model yields at the
soma-to-synapse distance, left-truncated at the model's minimum: draws
below the minimum are rejected and redrawn. Delay assignment is skipped
system-wide when no delay model is configured; pre-existing delay values
are then left untouched.
*/

use rand::Rng;
use rand_distr::{Distribution, Normal};

use rewire_models::{resolved_position, LinDelayModel, NodeId, NodePopulation, PositionMap};

use crate::edge_table::EdgeTable;
use crate::types::{RewireError, RewireResult};

// Rejection cap; with sane fitted models the minimum sits well below the
// mean and a handful of draws suffices
const MAX_REJECTIONS: usize = 1000;

/// One truncated-normal delay draw. The returned value is always >= `min`.
pub fn draw_truncated_delay<R: Rng>(
    mean: f64,
    std: f64,
    min: f64,
    rng: &mut R,
) -> RewireResult<f64> {
    let normal = Normal::new(mean, std)
        .map_err(|e| RewireError::InvalidDelayDistribution(e.to_string()))?;
    for _ in 0..MAX_REJECTIONS {
        let value = normal.sample(rng);
        if value >= min {
            return Ok(value);
        }
    }
    // Essentially no mass above the bound; the bound itself is the limit
    // of the truncated distribution
    Ok(min)
}

/// Assign new distance-dependent delays in place.
///
/// `rows[i]` is a row of `table` whose (possibly just-reassigned) source
/// is `new_sources[syn_conn_idx[i]]`. Source soma positions go through
/// the position mapping when one is given. No-op when there are no
/// sources, no synapse-to-connection mappings, or no selected rows.
#[allow(clippy::too_many_arguments)]
pub fn assign_delays_from_model<R: Rng>(
    delay_model: &LinDelayModel,
    src_nodes: &NodePopulation,
    pos_map: Option<&PositionMap>,
    table: &mut EdgeTable,
    rows: &[usize],
    new_sources: &[NodeId],
    syn_conn_idx: &[usize],
    rng: &mut R,
) -> RewireResult<()> {
    if new_sources.is_empty() || syn_conn_idx.is_empty() || rows.is_empty() {
        return Ok(());
    }
    debug_assert_eq!(rows.len(), syn_conn_idx.len());

    for (i, &row) in rows.iter().enumerate() {
        let source = new_sources[syn_conn_idx[i]];
        let src_pos = resolved_position(src_nodes, pos_map, source)?;
        let syn_pos = table.position(row);
        let dx = syn_pos[0] - src_pos[0];
        let dy = syn_pos[1] - src_pos[1];
        let dz = syn_pos[2] - src_pos[2];
        let distance = (dx * dx + dy * dy + dz * dz).sqrt();

        let delay = draw_truncated_delay(
            delay_model.mean(distance),
            delay_model.std(distance),
            delay_model.min(distance),
            rng,
        )?;
        table.set_delay(row, delay);
    }
    Ok(())
}
