// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Rewiring Integration Tests

Exercises the full per-batch rewiring path through `rewire_batch` and
`wire_batch`, covering:
- Row-count conservation and in-degree preservation under keep_indegree
- Pure relabeling (equal counts), shrinking (deletions) and growing
  (synapse synthesis) reconciliation paths
- Per-connection homogeneity of synthesized property values
- Sort/reindex postconditions, autapse exclusion, delay bounds
- Contract violations (non-empty table for wiring, synapse class errors)
*/

use rand::rngs::StdRng;
use rand::SeedableRng;

use rewire_core::{
    rewire_batch, wire_batch, ConnProbModel, EdgeTable, LinDelayModel, NodeId, NodeInfo,
    NodePopulation, PropKind, PropValue, RewireError, RewiringConfig, RewiringContext,
    SynapseClass,
};

const SCHEMA: &[(&str, PropKind)] = &[
    ("u_syn", PropKind::Float),
    ("afferent_section_id", PropKind::Int),
    ("syn_type_id", PropKind::Int),
];

/// Helper to build a population of EXC neurons with the given ids,
/// spread along x, all sharing one m-type and layer
fn population(ids: std::ops::Range<u64>) -> NodePopulation {
    NodePopulation::from_nodes(
        ids.map(|id| NodeInfo {
            id: NodeId(id),
            position: [id as f64 * 10.0, 0.0, (id % 3) as f64],
            mtype: "L5_TPC".to_string(),
            layer: 5,
            synapse_class: SynapseClass::Exc,
        })
        .collect(),
    )
    .expect("population")
}

/// Helper to build a table with `conns_per_target` connections onto each
/// target (drawn from the start of the source range) and
/// `syns_per_conn` synapses per connection
fn build_table(
    src_start: u64,
    tgt_ids: &[NodeId],
    conns_per_target: u64,
    syns_per_conn: u64,
) -> EdgeTable {
    let mut table = EdgeTable::with_schema(SCHEMA);
    for &tgt in tgt_ids {
        for c in 0..conns_per_target {
            let src = NodeId(src_start + c);
            for s in 0..syns_per_conn {
                table
                    .push_row(
                        src,
                        tgt,
                        [tgt.0 as f64, c as f64, s as f64],
                        1.0 + s as f64 * 0.01 + (tgt.0 % 10) as f64 * 0.1,
                        &[
                            PropValue::Float(src.0 as f64),
                            PropValue::Int(s as i64),
                            PropValue::Int(100),
                        ],
                    )
                    .expect("push row");
            }
        }
    }
    table
}

fn context<'a>(
    src: &'a NodePopulation,
    tgt: &'a NodePopulation,
    prob_model: &'a ConnProbModel,
    delay_model: Option<&'a LinDelayModel>,
) -> RewiringContext<'a> {
    RewiringContext {
        src_nodes: src,
        tgt_nodes: tgt,
        prob_model,
        delay_model,
        position_map: None,
    }
}

#[test]
fn amount_pct_zero_leaves_table_identical() {
    let src = population(0..10);
    let tgt = population(100..105);
    let tgt_ids = tgt.ids();
    let mut table = build_table(0, &tgt_ids, 3, 2);
    let original = table.clone();

    let model = ConnProbModel::Constant { p: 1.0 };
    let ctx = context(&src, &tgt, &model, None);
    let mut cfg = RewiringConfig::new(SynapseClass::Exc);
    cfg.amount_pct = 0.0;

    let mut rng = StdRng::seed_from_u64(1);
    let stats = rewire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

    assert_eq!(table, original);
    assert_eq!(stats.total_syn_added(), 0);
    assert_eq!(stats.total_syn_removed(), 0);
    assert_eq!(stats.total_syn_rewired(), 0);
}

#[test]
fn wiring_an_empty_table_adds_bernoulli_bounded_synapses() {
    let src = population(0..10);
    let tgt = population(100..105);
    let tgt_ids = tgt.ids();
    let mut table = EdgeTable::with_schema(SCHEMA);

    let model = ConnProbModel::Constant { p: 0.3 };
    let ctx = context(&src, &tgt, &model, None);
    let cfg = RewiringConfig::new(SynapseClass::Exc);

    let mut rng = StdRng::seed_from_u64(42);
    let stats = wire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

    assert_eq!(stats.total_syn_removed(), 0);
    assert!(stats.total_syn_added() <= 50);
    assert_eq!(table.len(), stats.total_syn_added());
    assert!(table.is_sorted_by_target_source());
    // Class code is generated consistently
    let types = table.int_prop("syn_type_id").unwrap();
    assert!(types.iter().all(|&t| t == 100));
}

#[test]
fn wiring_rejects_a_non_empty_table() {
    let src = population(0..10);
    let tgt = population(100..105);
    let tgt_ids = tgt.ids();
    let mut table = build_table(0, &tgt_ids, 1, 1);

    let model = ConnProbModel::Constant { p: 0.3 };
    let ctx = context(&src, &tgt, &model, None);
    let cfg = RewiringConfig::new(SynapseClass::Exc);

    let mut rng = StdRng::seed_from_u64(42);
    let err = wire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap_err();
    assert!(matches!(err, RewireError::NonEmptyTable(5)));
}

#[test]
fn keep_indegree_is_a_pure_rewiring() {
    let src = population(0..10);
    let tgt = population(100..110);
    let tgt_ids = tgt.ids();
    // One connection with one synapse per target
    let mut table = build_table(0, &tgt_ids, 1, 1);
    let original = table.clone();

    let model = ConnProbModel::Distance {
        scale: 0.9,
        exponent: 0.001,
    };
    let ctx = context(&src, &tgt, &model, None);
    let mut cfg = RewiringConfig::new(SynapseClass::Exc);
    cfg.keep_indegree = true;

    let mut rng = StdRng::seed_from_u64(7);
    let stats = rewire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

    // Exactly 10 connections and 10 synapses remain
    assert_eq!(table.len(), 10);
    assert_eq!(stats.total_syn_added(), 0);
    assert_eq!(stats.total_syn_removed(), 0);
    assert_eq!(stats.total_conn_rewired(), 10);

    // Only the source may have changed: positions and delays are retained
    for tgt_id in &tgt_ids {
        let row_new = (0..table.len()).find(|&r| table.target(r) == *tgt_id).unwrap();
        let row_old = (0..original.len())
            .find(|&r| original.target(r) == *tgt_id)
            .unwrap();
        assert_eq!(table.position(row_new), original.position(row_old));
        assert_eq!(table.delay(row_new), original.delay(row_old));
        assert!(src.contains(table.source(row_new)));
    }
}

#[test]
fn zero_probability_shrinks_every_connection_away() {
    let src = population(0..10);
    let tgt = population(100..104);
    let tgt_ids = tgt.ids();
    let mut table = build_table(0, &tgt_ids, 5, 2);
    assert_eq!(table.len(), 4 * 5 * 2);

    let model = ConnProbModel::Constant { p: 0.0 };
    let ctx = context(&src, &tgt, &model, None);
    let cfg = RewiringConfig::new(SynapseClass::Exc);

    let mut rng = StdRng::seed_from_u64(9);
    let stats = rewire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

    assert!(table.is_empty());
    assert_eq!(stats.total_conn_removed(), 4 * 5);
    assert_eq!(stats.total_syn_removed(), 4 * 5 * 2);
    assert_eq!(stats.total_syn_added(), 0);
    assert_eq!(stats.total_syn_rewired(), 0);
}

#[test]
fn growth_synthesizes_homogeneous_connections() {
    let src = population(0..10);
    let tgt = population(100..105);
    let tgt_ids = tgt.ids();
    // Two existing connections per target; p = 1 forces growth to ten
    let mut table = build_table(0, &tgt_ids, 2, 3);

    let model = ConnProbModel::Constant { p: 1.0 };
    let ctx = context(&src, &tgt, &model, None);
    let cfg = RewiringConfig::new(SynapseClass::Exc);

    let mut rng = StdRng::seed_from_u64(13);
    let stats = rewire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

    // Every target now has the full candidate set as sources
    for tgt_id in &tgt_ids {
        let mut sources: Vec<NodeId> = (0..table.len())
            .filter(|&r| table.target(r) == *tgt_id)
            .map(|r| table.source(r))
            .collect();
        sources.sort_unstable();
        sources.dedup();
        assert_eq!(sources.len(), 10);
    }
    assert_eq!(stats.total_conn_added(), 5 * 8);
    assert!(stats.total_syn_added() >= stats.total_conn_added());

    // Synapses of one connection share every non-morphology value
    for tgt_id in &tgt_ids {
        for src_id in src.ids() {
            let rows: Vec<usize> = (0..table.len())
                .filter(|&r| table.target(r) == *tgt_id && table.source(r) == src_id)
                .collect();
            if rows.len() < 2 {
                continue;
            }
            let u = table.prop_value("u_syn", rows[0]).unwrap();
            let t = table.prop_value("syn_type_id", rows[0]).unwrap();
            for &r in &rows[1..] {
                assert_eq!(table.prop_value("u_syn", r).unwrap(), u);
                assert_eq!(table.prop_value("syn_type_id", r).unwrap(), t);
            }
        }
    }

    assert!(table.is_sorted_by_target_source());
    assert_eq!(
        table.len(),
        5 * 2 * 3 + stats.total_syn_added() - stats.total_syn_removed()
    );
}

#[test]
fn autapses_are_never_wired() {
    // Source and target populations coincide
    let pop = population(0..10);
    let ids = pop.ids();
    let mut table = EdgeTable::with_schema(SCHEMA);

    let model = ConnProbModel::Constant { p: 1.0 };
    let ctx = context(&pop, &pop, &model, None);
    let cfg = RewiringConfig::new(SynapseClass::Exc);

    let mut rng = StdRng::seed_from_u64(5);
    wire_batch(&mut table, &ctx, &ids, &cfg, &mut rng).unwrap();

    // p = 1 everywhere except the autapse entry
    assert_eq!(table.len(), 10 * 9);
    for r in 0..table.len() {
        assert_ne!(table.source(r), table.target(r));
    }
}

#[test]
fn assigned_delays_respect_the_model_minimum() {
    let src = population(0..10);
    let tgt = population(100..110);
    let tgt_ids = tgt.ids();
    let mut table = build_table(0, &tgt_ids, 2, 2);

    let model = ConnProbModel::Constant { p: 1.0 };
    let delay_model = LinDelayModel::new([0.5, 0.003], 0.2, 0.75).unwrap();
    let ctx = context(&src, &tgt, &model, Some(&delay_model));
    let cfg = RewiringConfig::new(SynapseClass::Exc);

    let mut rng = StdRng::seed_from_u64(21);
    rewire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

    for r in 0..table.len() {
        assert!(
            table.delay(r) >= 0.75,
            "delay {} below model minimum",
            table.delay(r)
        );
    }
}

#[test]
fn without_a_delay_model_delays_are_untouched() {
    let src = population(0..10);
    let tgt = population(100..110);
    let tgt_ids = tgt.ids();
    let mut table = build_table(0, &tgt_ids, 1, 1);
    let before: Vec<(NodeId, f64)> = (0..table.len())
        .map(|r| (table.target(r), table.delay(r)))
        .collect();

    let model = ConnProbModel::Constant { p: 0.5 };
    let ctx = context(&src, &tgt, &model, None);
    let mut cfg = RewiringConfig::new(SynapseClass::Exc);
    cfg.keep_indegree = true;

    let mut rng = StdRng::seed_from_u64(17);
    rewire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

    let mut after: Vec<(NodeId, f64)> = (0..table.len())
        .map(|r| (table.target(r), table.delay(r)))
        .collect();
    let mut expected = before;
    expected.sort_by_key(|&(t, _)| t);
    after.sort_by_key(|&(t, _)| t);
    assert_eq!(after, expected);
}

#[test]
fn class_inconsistent_syn_type_ids_are_rejected() {
    let src = population(0..10);
    let tgt = population(100..102);
    let tgt_ids = tgt.ids();
    let mut table = EdgeTable::with_schema(SCHEMA);
    // syn_type_id below 100 on a row sourced from an EXC candidate
    table
        .push_row(
            NodeId(0),
            NodeId(100),
            [0.0; 3],
            1.0,
            &[
                PropValue::Float(0.0),
                PropValue::Int(0),
                PropValue::Int(50),
            ],
        )
        .unwrap();

    let model = ConnProbModel::Constant { p: 0.5 };
    let ctx = context(&src, &tgt, &model, None);
    let cfg = RewiringConfig::new(SynapseClass::Exc);

    let mut rng = StdRng::seed_from_u64(3);
    let err = rewire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap_err();
    assert!(matches!(
        err,
        RewireError::SynapseClassMismatch {
            syn_type_id: 50,
            ..
        }
    ));
}

#[test]
fn same_seed_reproduces_the_same_connectome() {
    let src = population(0..10);
    let tgt = population(100..106);
    let tgt_ids = tgt.ids();
    let model = ConnProbModel::Distance {
        scale: 0.8,
        exponent: 0.0005,
    };
    let delay_model = LinDelayModel::new([0.5, 0.003], 0.2, 0.1).unwrap();
    let ctx = context(&src, &tgt, &model, Some(&delay_model));
    let cfg = RewiringConfig::new(SynapseClass::Exc);

    let mut table_a = build_table(0, &tgt_ids, 2, 2);
    let mut table_b = table_a.clone();

    let mut rng = StdRng::seed_from_u64(1234);
    rewire_batch(&mut table_a, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();
    let mut rng = StdRng::seed_from_u64(1234);
    rewire_batch(&mut table_b, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

    assert_eq!(table_a, table_b);
}

mod seed_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// In-degree preservation under keep_indegree, for all seeds
        #[test]
        fn indegree_is_preserved_for_all_seeds(seed in 0u64..32) {
            let src = population(0..12);
            let tgt = population(100..106);
            let tgt_ids = tgt.ids();
            let mut table = build_table(0, &tgt_ids, 3, 2);

            let model = ConnProbModel::Constant { p: 0.6 };
            let ctx = context(&src, &tgt, &model, None);
            let mut cfg = RewiringConfig::new(SynapseClass::Exc);
            cfg.keep_indegree = true;

            let mut rng = StdRng::seed_from_u64(seed);
            rewire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

            for tgt_id in &tgt_ids {
                let mut sources: Vec<NodeId> = (0..table.len())
                    .filter(|&r| table.target(r) == *tgt_id)
                    .map(|r| table.source(r))
                    .collect();
                sources.sort_unstable();
                sources.dedup();
                prop_assert_eq!(sources.len(), 3);
            }
            // Pure rewiring never changes the row count
            prop_assert_eq!(table.len(), 6 * 3 * 2);
        }

        /// Sort and dense-index postconditions hold after free resampling
        #[test]
        fn output_is_sorted_for_all_seeds(seed in 0u64..32) {
            let src = population(0..12);
            let tgt = population(100..106);
            let tgt_ids = tgt.ids();
            let mut table = build_table(0, &tgt_ids, 2, 2);

            let model = ConnProbModel::Constant { p: 0.5 };
            let ctx = context(&src, &tgt, &model, None);
            let cfg = RewiringConfig::new(SynapseClass::Exc);

            let mut rng = StdRng::seed_from_u64(seed);
            rewire_batch(&mut table, &ctx, &tgt_ids, &cfg, &mut rng).unwrap();

            prop_assert!(table.is_sorted_by_target_source());
            prop_assert!(table.check_consistent().is_ok());
        }
    }
}
