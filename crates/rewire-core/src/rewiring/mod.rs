// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connectome rewiring driver.

For each target neuron of a batch, in ascending id order:

1. compute per-candidate connection probabilities from the loaded model
   (`probability`),
2. resample the set of connected sources under the configured policy
   (`resample`),
3. reconcile against the currently wired sources: equal counts relabel in
   place, a shortfall marks the excess connections for deletion, a surplus
   synthesizes new synapse rows (`synthesis`),
4. draw new distance-dependent delays for rewired and synthesized rows
   (`delays`, skipped system-wide without a delay model),

then apply the staged deletions and additions once per batch, re-sort and
re-index (`reconcile`), and log exact statistics (`stats`).

Only synapses whose target lies in the batch may be mutated; deletion
masks and pending additions are staged table-wide and applied in a single
pass. The per-m-type donor cache lives exactly as long as one batch.

Randomness: every entry point takes `&mut impl Rng`. Drivers processing
several batches in one run must seed a single generator once per run (see
`crate::rng`) and reuse it across batches; batches must not be reseeded
individually.
*/

use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use rewire_models::{
    ConnProbModel, LinDelayModel, ModelResult, NodeId, NodePopulation, PositionMap, SynapseClass,
    resolved_position,
};

pub mod config;
pub mod delays;
pub mod probability;
pub mod reconcile;
pub mod resample;
pub mod stats;
pub mod synthesis;

pub use config::{GenerationMethod, RewiringConfig};
pub use stats::RewiringStats;

use crate::edge_table::{EdgeTable, PropKind, PropValue};
use crate::types::{RewireError, RewireResult};
use delays::assign_delays_from_model;
use probability::source_probabilities;
use reconcile::reconcile;
use resample::{draw_bernoulli, draw_fixed_indegree};
use synthesis::{synthesize_connections, MtypeCache};

/// External collaborators consumed by the rewiring core
#[derive(Clone, Copy)]
pub struct RewiringContext<'a> {
    pub src_nodes: &'a NodePopulation,
    pub tgt_nodes: &'a NodePopulation,
    pub prob_model: &'a ConnProbModel,
    /// Without a delay model, delay assignment is skipped entirely and
    /// pre-existing delay values are left untouched
    pub delay_model: Option<&'a LinDelayModel>,
    pub position_map: Option<&'a PositionMap>,
}

/// Source candidates and selected targets for one batch
struct Participants {
    src_ids: Vec<NodeId>,
    src_pos: Vec<[f64; 3]>,
    tgt_ids: Vec<NodeId>,
    tgt_mtypes: Vec<String>,
    tgt_layers: Vec<u32>,
}

/// Rewire the connections of one batch of target neurons in place.
///
/// The table is mutated, extended, re-sorted and re-indexed; the returned
/// statistics are exact. Selecting zero target neurons (empty batch,
/// empty selector intersection, or `amount_pct` rounding to zero) is a
/// legitimate no-op that leaves the table untouched.
pub fn rewire_batch<R: Rng>(
    table: &mut EdgeTable,
    ctx: &RewiringContext<'_>,
    batch_ids: &[NodeId],
    cfg: &RewiringConfig,
    rng: &mut R,
) -> RewireResult<RewiringStats> {
    cfg.validate()?;
    table.check_consistent()?;
    let Some(parts) = select_participants(table, ctx, batch_ids, cfg, rng)? else {
        return Ok(RewiringStats::default());
    };
    info!(
        target: "rewire-core",
        "Rewiring afferent {} connections of {} target neurons ({}% of eligible, {} source candidates)",
        cfg.syn_class,
        parts.tgt_ids.len(),
        cfg.amount_pct,
        parts.src_ids.len()
    );
    rewire_selected(table, ctx, cfg, &parts, rng)
}

/// Wire an empty connectome from scratch.
///
/// Special case of rewiring: the initial edge table must be empty, and
/// only specific properties are generated. Each selected source becomes
/// one connection carrying a single synapse placed at the target's soma
/// position; extra property columns receive their zero defaults
/// (`syn_type_id`, when present, is set to the class-consistent code:
/// 100 for EXC, 0 for INH). Delays are drawn from the delay model, or
/// left at 0.0 when none is configured. Source selection is one
/// Bernoulli trial per candidate; `keep_indegree` has no meaning on an
/// empty table and is ignored.
pub fn wire_batch<R: Rng>(
    table: &mut EdgeTable,
    ctx: &RewiringContext<'_>,
    batch_ids: &[NodeId],
    cfg: &RewiringConfig,
    rng: &mut R,
) -> RewireResult<RewiringStats> {
    cfg.validate()?;
    if !table.is_empty() {
        return Err(RewireError::NonEmptyTable(table.len()));
    }
    let Some(parts) = select_participants(table, ctx, batch_ids, cfg, rng)? else {
        return Ok(RewiringStats::default());
    };
    info!(
        target: "rewire-core",
        "Generating afferent {} connections to {} target neurons ({} source candidates)",
        cfg.syn_class,
        parts.tgt_ids.len(),
        parts.src_ids.len()
    );

    let syn_type_code: i64 = match cfg.syn_class {
        SynapseClass::Exc => 100,
        SynapseClass::Inh => 0,
    };
    let defaults: Vec<PropValue> = table
        .schema()
        .iter()
        .map(|(name, kind)| match kind {
            PropKind::Float => PropValue::Float(0.0),
            PropKind::Int => PropValue::Int(if name == "syn_type_id" {
                syn_type_code
            } else {
                0
            }),
        })
        .collect();

    let mut stats = RewiringStats::default();
    let mut additions = table.empty_like();
    let mut sources: Vec<NodeId> = Vec::new();

    for &tgt in &parts.tgt_ids {
        let p_src = source_probabilities(
            ctx.prob_model,
            &parts.src_ids,
            &parts.src_pos,
            tgt,
            ctx.tgt_nodes,
            ctx.position_map,
        )?;
        let src_new = draw_bernoulli(&parts.src_ids, &p_src, rng);
        if src_new.is_empty() {
            continue;
        }
        let tgt_pos = ctx.tgt_nodes.position(tgt)?;
        for &src in &src_new {
            additions.push_row(src, tgt, tgt_pos, 0.0, &defaults)?;
            sources.push(src);
        }
        stats.record_added(src_new.len(), src_new.len());
    }

    if let Some(dm) = ctx.delay_model {
        // One synapse per connection: row index doubles as connection index
        let rows: Vec<usize> = (0..additions.len()).collect();
        assign_delays_from_model(
            dm,
            ctx.src_nodes,
            ctx.position_map,
            &mut additions,
            &rows,
            &sources,
            &rows,
            rng,
        )?;
    }

    reconcile(table, &[], &additions)?;
    stats.log_summary();
    Ok(stats)
}

/// Resolve source candidates and the rewired target subset.
/// Returns `None` when no target neurons are selected.
fn select_participants<R: Rng>(
    table: &EdgeTable,
    ctx: &RewiringContext<'_>,
    batch_ids: &[NodeId],
    cfg: &RewiringConfig,
    rng: &mut R,
) -> RewireResult<Option<Participants>> {
    // Source candidates, restricted to the configured synapse class
    let mut src_sel = cfg.sel_src.clone().unwrap_or_default();
    src_sel.synapse_class = Some(cfg.syn_class);
    let src_ids = ctx.src_nodes.select(Some(&src_sel));
    if src_ids.is_empty() {
        return Err(RewireError::NoSourceNodes(cfg.syn_class));
    }
    verify_synapse_class(table, &src_ids, cfg.syn_class)?;
    let src_pos = src_ids
        .iter()
        .map(|&id| resolved_position(ctx.src_nodes, ctx.position_map, id))
        .collect::<ModelResult<Vec<_>>>()?;

    // Target neurons: selector intersected with the batch split, then
    // subset by amount_pct (random subset, order preserved)
    let batch: AHashSet<NodeId> = batch_ids.iter().copied().collect();
    let eligible: Vec<NodeId> = ctx
        .tgt_nodes
        .select(cfg.sel_dest.as_ref())
        .into_iter()
        .filter(|id| batch.contains(id))
        .collect();
    let num_tgt = (cfg.amount_pct * eligible.len() as f64 / 100.0).round() as usize;
    let mut mask: Vec<bool> = (0..eligible.len()).map(|i| i < num_tgt).collect();
    mask.shuffle(rng);
    let tgt_ids: Vec<NodeId> = eligible
        .into_iter()
        .zip(mask)
        .filter(|(_, selected)| *selected)
        .map(|(id, _)| id)
        .collect();
    if tgt_ids.is_empty() {
        info!(target: "rewire-core", "No target nodes selected, nothing to rewire");
        return Ok(None);
    }

    let tgt_mtypes = tgt_ids
        .iter()
        .map(|&id| ctx.tgt_nodes.mtype(id).map(str::to_string))
        .collect::<ModelResult<Vec<_>>>()?;
    let tgt_layers = tgt_ids
        .iter()
        .map(|&id| ctx.tgt_nodes.layer(id))
        .collect::<ModelResult<Vec<_>>>()?;

    Ok(Some(Participants {
        src_ids,
        src_pos,
        tgt_ids,
        tgt_mtypes,
        tgt_layers,
    }))
}

/// Synapses sourced from the candidate set must carry a class-consistent
/// `syn_type_id` (EXC >= 100, INH < 100), when that column is present
fn verify_synapse_class(
    table: &EdgeTable,
    src_ids: &[NodeId],
    class: SynapseClass,
) -> RewireResult<()> {
    let Some(type_ids) = table.int_prop("syn_type_id") else {
        return Ok(());
    };
    let candidates: AHashSet<NodeId> = src_ids.iter().copied().collect();
    for (row, &syn_type_id) in type_ids.iter().enumerate() {
        let source = table.source(row);
        if !candidates.contains(&source) {
            continue;
        }
        let consistent = match class {
            SynapseClass::Exc => syn_type_id >= 100,
            SynapseClass::Inh => syn_type_id < 100,
        };
        if !consistent {
            return Err(RewireError::SynapseClassMismatch {
                row,
                source_node: source,
                syn_type_id,
                class,
            });
        }
    }
    Ok(())
}

/// Existing connections of one target: distinct sources (ascending) and
/// the connection ordinal of each row
fn connections_of(table: &EdgeTable, rows: &[usize]) -> (Vec<NodeId>, Vec<usize>) {
    let mut distinct: Vec<NodeId> = rows.iter().map(|&r| table.source(r)).collect();
    distinct.sort_unstable();
    distinct.dedup();
    let ordinal: ahash::AHashMap<NodeId, usize> = distinct
        .iter()
        .enumerate()
        .map(|(i, &s)| (s, i))
        .collect();
    let conn_of_row = rows.iter().map(|&r| ordinal[&table.source(r)]).collect();
    (distinct, conn_of_row)
}

fn rewire_selected<R: Rng>(
    table: &mut EdgeTable,
    ctx: &RewiringContext<'_>,
    cfg: &RewiringConfig,
    parts: &Participants,
    rng: &mut R,
) -> RewireResult<RewiringStats> {
    let mut stats = RewiringStats::default();
    let src_set: AHashSet<NodeId> = parts.src_ids.iter().copied().collect();
    let rows_by_target = table.rows_by_target();
    // Donor pool basis: every row sourced from the candidate class,
    // regardless of pending deletions (rows leave the table only at
    // reconciliation)
    let class_rows: Vec<usize> = (0..table.len())
        .filter(|&r| src_set.contains(&table.source(r)))
        .collect();

    let mut delete_mask = vec![false; table.len()];
    let mut additions = table.empty_like();
    let mut cache = MtypeCache::default();
    let no_rows: Vec<usize> = Vec::new();

    // Targets are processed strictly in ascending id order; the donor
    // cache and the staged deletion/addition sets assume it
    for (tidx, &tgt) in parts.tgt_ids.iter().enumerate() {
        let p_src = source_probabilities(
            ctx.prob_model,
            &parts.src_ids,
            &parts.src_pos,
            tgt,
            ctx.tgt_nodes,
            ctx.position_map,
        )?;

        let all_rows = rows_by_target.get(&tgt).unwrap_or(&no_rows);
        let sel_rows: Vec<usize> = all_rows
            .iter()
            .copied()
            .filter(|&r| src_set.contains(&table.source(r)))
            .collect();
        let (src_existing, mut conn_of_row) = connections_of(table, &sel_rows);
        let num_src = src_existing.len();

        let mut kept_rows = sel_rows.clone();
        let src_new: Vec<NodeId>;

        if cfg.keep_indegree {
            // Same number of ingoing connections (and #synapses/connection)
            src_new = draw_fixed_indegree(&parts.src_ids, &p_src, num_src, tgt, rng)?;
        } else {
            let mut drawn = draw_bernoulli(&parts.src_ids, &p_src, rng);
            let num_new = drawn.len();

            if num_new < num_src {
                // Delete the unused connections: ordinals beyond the new
                // source count, i.e. the highest existing source ids
                let mut removed_syn = 0usize;
                let mut remaining_rows = Vec::with_capacity(kept_rows.len());
                let mut remaining_conn = Vec::with_capacity(conn_of_row.len());
                for (i, &row) in kept_rows.iter().enumerate() {
                    if conn_of_row[i] >= num_new {
                        delete_mask[row] = true;
                        removed_syn += 1;
                    } else {
                        remaining_rows.push(row);
                        remaining_conn.push(conn_of_row[i]);
                    }
                }
                stats.record_removed(removed_syn, num_src - num_new);
                kept_rows = remaining_rows;
                conn_of_row = remaining_conn;
                src_new = drawn;
            } else if num_new > num_src {
                // Surplus: the tail of the draw seeds newly generated
                // connections, the head relabels the existing ones
                let src_gen = drawn.split_off(num_src);
                src_new = drawn;
                debug!(
                    target: "rewire-core",
                    "Target {tgt}: generating {} new connection(s)",
                    src_gen.len()
                );

                let mut synth = match cfg.gen_method {
                    GenerationMethod::DuplicateSample => {
                        let donors = cache.donors_for_target(
                            table,
                            &class_rows,
                            &parts.tgt_ids,
                            &parts.tgt_mtypes,
                            &parts.tgt_layers,
                            tidx,
                            tgt,
                        )?;
                        synthesize_connections(
                            table, donors, &sel_rows, all_rows, &src_gen, tgt, rng,
                        )?
                    }
                };
                stats.record_added(synth.edges.len(), src_gen.len());
                if let Some(dm) = ctx.delay_model {
                    let rows: Vec<usize> = (0..synth.edges.len()).collect();
                    assign_delays_from_model(
                        dm,
                        ctx.src_nodes,
                        ctx.position_map,
                        &mut synth.edges,
                        &rows,
                        &src_gen,
                        &synth.syn_conn_idx,
                        rng,
                    )?;
                }
                additions.append(&synth.edges)?;
            } else {
                // Exact match: nothing to add, nothing to delete
                src_new = drawn;
            }
        }

        // Rewire the retained connections: the i-th retained connection
        // (ascending existing source order) takes the i-th drawn source
        for (i, &row) in kept_rows.iter().enumerate() {
            table.set_source(row, src_new[conn_of_row[i]]);
        }
        stats.record_rewired(kept_rows.len(), src_new.len());

        if let Some(dm) = ctx.delay_model {
            assign_delays_from_model(
                dm,
                ctx.src_nodes,
                ctx.position_map,
                table,
                &kept_rows,
                &src_new,
                &conn_of_row,
                rng,
            )?;
        }
    }

    reconcile(table, &delete_mask, &additions)?;
    stats.log_summary();
    Ok(stats)
}
