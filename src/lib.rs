// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # connectome-rewire
//!
//! Statistical rewiring of synaptic connectomes: model-driven connection
//! resampling, synapse synthesis and distance-dependent delay assignment
//! over in-memory edge tables.
//!
//! This umbrella crate re-exports the two workspace members:
//!
//! - [`models`] (`rewire-models`): connection-probability and delay model
//!   interfaces, node population tables and pairwise geometry.
//! - [`core`] (`rewire-core`): the edge table arena and the per-batch
//!   rewiring algorithms.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use connectome_rewire::core::{
//!     rewire_batch, seed_global, EdgeTable, RewiringConfig, RewiringContext,
//! };
//! use connectome_rewire::models::{ConnProbModel, SynapseClass};
//!
//! # fn run(mut table: EdgeTable,
//! #        src_nodes: connectome_rewire::models::NodePopulation,
//! #        tgt_nodes: connectome_rewire::models::NodePopulation) {
//! // Seed once per run, before the first batch
//! seed_global(123_456);
//!
//! let prob_model = ConnProbModel::Constant { p: 0.1 };
//! let ctx = RewiringContext {
//!     src_nodes: &src_nodes,
//!     tgt_nodes: &tgt_nodes,
//!     prob_model: &prob_model,
//!     delay_model: None,
//!     position_map: None,
//! };
//! let cfg = RewiringConfig::new(SynapseClass::Exc);
//! let batch = tgt_nodes.ids();
//! let stats = rewire_batch(
//!     &mut table,
//!     &ctx,
//!     &batch,
//!     &cfg,
//!     &mut *connectome_rewire::core::global_rng(),
//! )
//! .expect("rewiring failed");
//! println!("added {} synapses", stats.total_syn_added());
//! # }
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use rewire_core as core;
pub use rewire_models as models;

// Flat re-exports of the primary API surface
pub use rewire_core::{
    rewire_batch, wire_batch, EdgeTable, GenerationMethod, PropKind, PropValue, RewireError,
    RewireResult, RewiringConfig, RewiringContext, RewiringStats,
};
pub use rewire_models::{
    ConnProbModel, DelayStat, LinDelayModel, NodeId, NodeInfo, NodePopulation, NodeSelector,
    PositionMap, SynapseClass,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_exported() {
        // Smoke test to ensure the re-export surface compiles
        assert!(!VERSION.is_empty());
        let model = ConnProbModel::Constant { p: 0.5 };
        assert_eq!(model.order(), 1);
    }
}
