// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# rewire-core

Connectome rewiring core: given an in-memory edge (synapse) table, a
batch of target neurons and a fitted connection-probability model, this
crate regenerates the set of afferent connections per target neuron while
preserving morphological plausibility - synapse positions, per-connection
synapse counts and distance-dependent delays.

## Architecture

- `edge_table` - columnar synapse arena with statically-typed extra
  property columns; deletions and additions are staged and applied in
  one reconciliation pass.
- `rewiring` - the per-target resampling loop: probability computation,
  source-set resampling (fixed in-degree or free Bernoulli), synapse
  synthesis for new connections, truncated-normal delay assignment and
  final reconciliation with exact statistics.
- `rng` - process-wide seeded generator for multi-batch drivers; every
  core routine also accepts a caller-supplied `&mut impl Rng`.

## Concurrency

Single-threaded and sequential within a batch. Batches (disjoint target
splits) are independent units of work: each one only ever mutates
synapses whose target lies in it, so separate processes may handle
separate batches with no shared state and merge outputs afterwards.

All failures are fatal contract violations; partial batch state is
discarded on error, never resumed mid-batch.
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod edge_table;
pub mod rewiring;
pub mod rng;
pub mod types;

pub use edge_table::{EdgeTable, PropColumn, PropKind, PropValue, MORPHOLOGY_NAME_FRAGMENTS};
pub use rewiring::{
    rewire_batch, wire_batch, GenerationMethod, RewiringConfig, RewiringContext, RewiringStats,
};
pub use rng::{global_rng, seed_global};
pub use types::{RewireError, RewireResult};

// Re-export the model-side types the public API surfaces
pub use rewire_models::{
    ConnProbModel, DelayStat, LinDelayModel, ModelError, NodeId, NodeInfo, NodePopulation,
    NodeSelector, PositionMap, SynapseClass,
};
