// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Per-target connection probability computation.

Builds exactly the feature set the loaded probability model declares
(single match over the model family tag), evaluates it, then applies the
unconditional post-processing: non-finite values become 0 ("no
connection"), values are clamped into [0, 1], and autapse candidates are
forced to probability 0.
*/

use ndarray::Array1;

use rewire_models::{
    axis_offsets, axis_positions, bipolar_offsets, distances, resolved_position, ConnProbModel,
    ModelInputs, NodeId, NodePopulation, PositionMap,
};

use crate::types::RewireResult;

/// Connection probability of every source candidate onto one target.
///
/// `src_pos` are the candidates' (position-mapped) soma positions, one
/// per entry of `src_ids`. The target position is only resolved for
/// model families that consume geometry. Autapse exclusion compares raw
/// node ids; it is meaningful when source and target populations
/// coincide and harmless otherwise.
pub fn source_probabilities(
    model: &ConnProbModel,
    src_ids: &[NodeId],
    src_pos: &[[f64; 3]],
    tgt: NodeId,
    tgt_nodes: &NodePopulation,
    pos_map: Option<&PositionMap>,
) -> RewireResult<Array1<f64>> {
    debug_assert_eq!(src_ids.len(), src_pos.len());

    let inputs = match model {
        ConnProbModel::Constant { .. } => ModelInputs::Constant {
            count: src_ids.len(),
        },
        ConnProbModel::Distance { .. } => {
            let tgt_pos = resolved_position(tgt_nodes, pos_map, tgt)?;
            ModelInputs::Distance {
                dist: distances(src_pos, tgt_pos),
            }
        }
        ConnProbModel::BipolarDistance { .. } => {
            let tgt_pos = resolved_position(tgt_nodes, pos_map, tgt)?;
            ModelInputs::DistanceBipolar {
                dist: distances(src_pos, tgt_pos),
                bipolar: bipolar_offsets(src_pos, tgt_pos),
            }
        }
        ConnProbModel::Offset { .. } => {
            let tgt_pos = resolved_position(tgt_nodes, pos_map, tgt)?;
            let [dx, dy, dz] = axis_offsets(src_pos, tgt_pos);
            ModelInputs::Offsets { dx, dy, dz }
        }
        ConnProbModel::Position { .. } => {
            let tgt_pos = resolved_position(tgt_nodes, pos_map, tgt)?;
            let [x, y, z] = axis_positions(src_pos);
            let [dx, dy, dz] = axis_offsets(src_pos, tgt_pos);
            ModelInputs::PositionsAndOffsets {
                x,
                y,
                z,
                dx,
                dy,
                dz,
            }
        }
    };

    let mut p = model.evaluate(&inputs)?;
    for (i, v) in p.iter_mut().enumerate() {
        if !v.is_finite() {
            // Invalid model output means "no connection"
            *v = 0.0;
        } else {
            *v = v.clamp(0.0, 1.0);
        }
        if src_ids[i] == tgt {
            // Exclude autapses
            *v = 0.0;
        }
    }
    Ok(p)
}
