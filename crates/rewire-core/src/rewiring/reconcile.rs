// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Edge table reconciliation.

Applies the batch's staged mutations in one pass: pending deletions are
removed first (so appended rows never collide with stale indices), new
rows are appended, then the table is re-sorted by (target, source) and
the dense zero-based row index is re-established by row order. The
downstream file writer relies on the sort order, and per-batch outputs
are concatenated without index offsets, so both are hard postconditions.
*/

use tracing::info;

use crate::edge_table::EdgeTable;
use crate::types::{RewireError, RewireResult};

/// Apply staged deletions and additions, re-sort and re-index.
///
/// The target-id monotonicity of the result is verified and reported as
/// an internal-consistency error on violation.
pub fn reconcile(
    table: &mut EdgeTable,
    delete_mask: &[bool],
    additions: &EdgeTable,
) -> RewireResult<()> {
    let num_deleted = delete_mask.iter().filter(|&&d| d).count();
    if num_deleted > 0 {
        let keep: Vec<bool> = delete_mask.iter().map(|&d| !d).collect();
        table.retain(&keep);
        info!(target: "rewire-core", "Deleted {num_deleted} unused synapses");
    }

    if !additions.is_empty() {
        table.append(additions)?;
        info!(target: "rewire-core", "Generated {} new synapses", additions.len());
    }

    table.sort_by_target_source();
    table.check_consistent()?;
    if !table.is_sorted_by_target_source() {
        return Err(RewireError::UnsortedOutput);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge_table::{PropKind, PropValue};
    use rewire_models::NodeId;

    fn row(t: &mut EdgeTable, src: u64, tgt: u64) {
        t.push_row(
            NodeId(src),
            NodeId(tgt),
            [0.0; 3],
            1.0,
            &[PropValue::Float(0.0)],
        )
        .unwrap();
    }

    #[test]
    fn deletions_apply_before_appends() {
        let mut table = EdgeTable::with_schema(&[("u_syn", PropKind::Float)]);
        row(&mut table, 4, 1);
        row(&mut table, 2, 1);
        row(&mut table, 9, 2);

        let mut additions = table.empty_like();
        row(&mut additions, 1, 2);

        reconcile(&mut table, &[false, true, false], &additions).unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.is_sorted_by_target_source());
        assert_eq!(table.source(0), NodeId(4));
        assert_eq!(table.source(1), NodeId(1));
        assert_eq!(table.source(2), NodeId(9));
    }

    #[test]
    fn no_op_reconcile_keeps_rows_sorted() {
        let mut table = EdgeTable::with_schema(&[("u_syn", PropKind::Float)]);
        row(&mut table, 1, 1);
        row(&mut table, 2, 1);
        let additions = table.empty_like();
        reconcile(&mut table, &[false, false], &additions).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.is_sorted_by_target_source());
    }
}
