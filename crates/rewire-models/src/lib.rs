// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# rewire-models

Model interfaces consumed by the connectome rewiring core:

- Connection probability models (`ConnProbModel`): a tagged union over the
  supported model families (constant, distance-dependent, bipolar,
  offset-dependent, position-dependent), each with its own declared input
  arity and feature set.
- Distance-dependent delay models (`LinDelayModel`): linear delay mean,
  constant std and minimum, queried per synapse distance.
- Node population tables (`NodePopulation`): per-neuron positions,
  morphological types, cortical layers and synapse classes, plus subset
  selectors and the optional coordinate remapping (`PositionMap`).
- Pairwise geometry builders (`geometry`): distance, bipolar offset,
  per-axis offset and absolute position feature vectors for one target
  neuron against a set of source candidates.

Model parameters are plain serde-deserializable structs; fitting and
plotting live outside this crate. The rewiring core only ever calls the
prediction surface defined here.
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod delay_model;
pub mod error;
pub mod geometry;
pub mod nodes;
pub mod prob_model;

pub use delay_model::{DelayStat, LinDelayModel};
pub use error::{ModelError, ModelResult};
pub use geometry::{axis_offsets, axis_positions, bipolar_offsets, distances};
pub use nodes::{
    resolved_position, NodeId, NodeInfo, NodePopulation, NodeSelector, PositionMap, SynapseClass,
};
pub use prob_model::{ConnProbModel, ModelInputs};
