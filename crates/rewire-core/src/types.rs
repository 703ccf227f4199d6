// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Core types for rewiring operations.

All failures are fatal contract violations: the caller aborts the batch
rather than retrying, because silently producing an invalid connectome is
worse than stopping.
*/

use rewire_models::{ModelError, NodeId, SynapseClass};

/// Result type for rewiring operations
pub type RewireResult<T> = Result<T, RewireError>;

/// Errors that can occur during connectome rewiring
#[derive(Debug, thiserror::Error)]
pub enum RewireError {
    #[error("Initial connectome must be empty, found {0} synapses")]
    NonEmptyTable(usize),

    #[error("amount_pct out of range: {0} (must be within [0, 100])")]
    AmountOutOfRange(f64),

    #[error("No {0} source nodes found")]
    NoSourceNodes(SynapseClass),

    #[error(
        "Synapse class error: row {row} (source {source_node}) has syn_type_id {syn_type_id}, \
         inconsistent with class {class}"
    )]
    SynapseClassMismatch {
        row: usize,
        source_node: NodeId,
        syn_type_id: i64,
        class: SynapseClass,
    },

    #[error("Not enough source neurons for target neuron {target} available for rewiring \
             (need {needed}, have {available})")]
    InsufficientSources {
        target: NodeId,
        needed: usize,
        available: usize,
    },

    #[error("Invalid connection probabilities for target neuron {target}: {reason}")]
    InvalidProbabilities { target: NodeId, reason: String },

    #[error("No synapses to sample connection property values for target neuron {0} from")]
    NoPropertyDonors(NodeId),

    #[error("No synapses to duplicate positions for target neuron {0} from")]
    NoPositionDonors(NodeId),

    #[error("Edge table schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid delay distribution: {0}")]
    InvalidDelayDistribution(String),

    #[error("Target nodes not monotonically increasing after reconciliation")]
    UnsortedOutput,

    #[error("Invalid rewiring config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}
