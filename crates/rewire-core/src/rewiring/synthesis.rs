// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Synapse synthesis for newly created connections.

New connections have no existing synapses to relabel, so their rows are
manufactured from existing data:

- The synapse count of each new connection is drawn from the empirical
  counts-per-connection distribution among existing connections whose
  target shares the current target's morphological type (falling back to
  the same cortical layer when the m-type yields nothing).
- Synapse positions and every morphology-linked column are duplicated
  verbatim from randomly chosen existing synapses onto the same target,
  preferring donors of the configured synapse class. When no donor of
  that class exists, any synapse targeting the neuron is eligible -
  a documented modeling caveat: such donors may be biologically
  inconsistent with the new source's class.
- Non-morphology columns (delay included) are resampled once per
  connection from the m-type donor pool and broadcast to the
  connection's synapses, which keeps property values homogeneous within
  a connection.

Donor lookups per morphological type are memoized in an `MtypeCache`
scoped to the batch; the cache is passed through explicitly and never
outlives the batch.
*/

use ahash::{AHashMap, AHashSet};
use rand::Rng;
use std::collections::hash_map::Entry;

use rewire_models::NodeId;

use crate::edge_table::EdgeTable;
use crate::types::{RewireError, RewireResult};

/// Donor data for one morphological type
#[derive(Debug, Clone)]
pub struct CachedDonors {
    /// Rows eligible as property donors (class-restricted sources,
    /// targets of the matching m-type or layer)
    pub donor_rows: Vec<usize>,
    /// Empirical synapse counts per (source, target) connection among
    /// the donor rows
    pub syn_per_conn: Vec<usize>,
}

/// Per-batch memoization of donor lookups, keyed by morphological type.
/// Lives exactly as long as one batch; a layer-fallback result is cached
/// under the m-type that triggered it.
#[derive(Debug, Default)]
pub struct MtypeCache {
    entries: AHashMap<String, CachedDonors>,
}

impl MtypeCache {
    /// Donor data for the target at `tidx`, computed on first use.
    #[allow(clippy::too_many_arguments)]
    pub fn donors_for_target<'c>(
        &'c mut self,
        table: &EdgeTable,
        class_rows: &[usize],
        tgt_ids: &[NodeId],
        tgt_mtypes: &[String],
        tgt_layers: &[u32],
        tidx: usize,
        tgt: NodeId,
    ) -> RewireResult<&'c CachedDonors> {
        match self.entries.entry(tgt_mtypes[tidx].clone()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(v) => {
                let donors =
                    compute_donors(table, class_rows, tgt_ids, tgt_mtypes, tgt_layers, tidx, tgt)?;
                Ok(v.insert(donors))
            }
        }
    }
}

fn compute_donors(
    table: &EdgeTable,
    class_rows: &[usize],
    tgt_ids: &[NodeId],
    tgt_mtypes: &[String],
    tgt_layers: &[u32],
    tidx: usize,
    tgt: NodeId,
) -> RewireResult<CachedDonors> {
    let same_mtype: AHashSet<NodeId> = tgt_ids
        .iter()
        .zip(tgt_mtypes.iter())
        .filter(|(_, m)| **m == tgt_mtypes[tidx])
        .map(|(&id, _)| id)
        .collect();
    let mut donor_rows: Vec<usize> = class_rows
        .iter()
        .copied()
        .filter(|&r| same_mtype.contains(&table.target(r)))
        .collect();

    if donor_rows.is_empty() {
        // Ignore m-type, consider matching layer
        let same_layer: AHashSet<NodeId> = tgt_ids
            .iter()
            .zip(tgt_layers.iter())
            .filter(|(_, l)| **l == tgt_layers[tidx])
            .map(|(&id, _)| id)
            .collect();
        donor_rows = class_rows
            .iter()
            .copied()
            .filter(|&r| same_layer.contains(&table.target(r)))
            .collect();
    }
    if donor_rows.is_empty() {
        return Err(RewireError::NoPropertyDonors(tgt));
    }

    // Synapse counts per (source, target) pair, in ascending pair order
    // for run-to-run determinism
    let mut counts: AHashMap<(NodeId, NodeId), usize> = AHashMap::new();
    for &r in &donor_rows {
        *counts.entry((table.source(r), table.target(r))).or_insert(0) += 1;
    }
    let mut pairs: Vec<((NodeId, NodeId), usize)> = counts.into_iter().collect();
    pairs.sort_unstable_by_key(|&(pair, _)| pair);
    let syn_per_conn = pairs.into_iter().map(|(_, n)| n).collect();

    Ok(CachedDonors {
        donor_rows,
        syn_per_conn,
    })
}

/// Rows synthesized for a set of new connections onto one target
#[derive(Debug)]
pub struct SynthesizedBatch {
    /// New synapse rows, delay pre-filled from donors (overwritten by the
    /// delay assigner when a delay model is configured)
    pub edges: EdgeTable,
    /// Connection ordinal of each new synapse, indexing `src_gen`
    pub syn_conn_idx: Vec<usize>,
}

/// Manufacture synapse rows for `src_gen.len()` new connections onto `tgt`.
///
/// `class_rows_for_target` are the target's existing rows with a source
/// of the configured synapse class; `all_rows_for_target` are all of the
/// target's existing rows, used as the duplication pool fallback.
pub fn synthesize_connections<R: Rng>(
    table: &EdgeTable,
    donors: &CachedDonors,
    class_rows_for_target: &[usize],
    all_rows_for_target: &[usize],
    src_gen: &[NodeId],
    tgt: NodeId,
    rng: &mut R,
) -> RewireResult<SynthesizedBatch> {
    let num_conn = src_gen.len();
    debug_assert!(num_conn > 0);
    debug_assert!(!donors.donor_rows.is_empty());

    // Sample #synapses/connection from the empirical distribution
    let counts: Vec<usize> = (0..num_conn)
        .map(|_| donors.syn_per_conn[rng.gen_range(0..donors.syn_per_conn.len())])
        .collect();
    let syn_conn_idx: Vec<usize> = counts
        .iter()
        .enumerate()
        .flat_map(|(conn, &n)| std::iter::repeat(conn).take(n))
        .collect();
    let num_syn = syn_conn_idx.len();

    // Duplicate positions (and all morphology-linked columns) from
    // existing synapses onto this target, with replacement
    let pool: &[usize] = if !class_rows_for_target.is_empty() {
        class_rows_for_target
    } else if !all_rows_for_target.is_empty() {
        all_rows_for_target
    } else {
        return Err(RewireError::NoPositionDonors(tgt));
    };
    let duplicated: Vec<usize> = (0..num_syn)
        .map(|_| pool[rng.gen_range(0..pool.len())])
        .collect();
    let mut edges = table.gather(&duplicated);

    // Resample non-morphology columns once per connection and broadcast
    // to the connection's synapses; each column draws its donors
    // independently
    for name in table.non_morph_prop_names() {
        let conn_donors: Vec<usize> = (0..num_conn)
            .map(|_| donors.donor_rows[rng.gen_range(0..donors.donor_rows.len())])
            .collect();
        for (row, &conn) in syn_conn_idx.iter().enumerate() {
            let value = table.prop_value(&name, conn_donors[conn])?;
            edges.set_prop_value(&name, row, value)?;
        }
    }

    // Delay is a per-connection property too; donor delays hold until the
    // delay assigner overwrites them
    let delay_donors: Vec<usize> = (0..num_conn)
        .map(|_| donors.donor_rows[rng.gen_range(0..donors.donor_rows.len())])
        .collect();
    for (row, &conn) in syn_conn_idx.iter().enumerate() {
        edges.set_delay(row, table.delay(delay_donors[conn]));
    }

    // Source id per synapse follows its connection membership
    for (row, &conn) in syn_conn_idx.iter().enumerate() {
        edges.set_source(row, src_gen[conn]);
    }

    Ok(SynthesizedBatch {
        edges,
        syn_conn_idx,
    })
}
