// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Batch rewiring statistics.

Counts are appended per target neuron and aggregated once per batch.
They feed reproducibility audits, so totals are exact, never sampled.
*/

use tracing::info;

/// Append-only per-batch counters of synapse/connection changes
#[derive(Debug, Clone, Default)]
pub struct RewiringStats {
    syn_removed: Vec<usize>,
    conn_removed: Vec<usize>,
    syn_added: Vec<usize>,
    conn_added: Vec<usize>,
    syn_rewired: Vec<usize>,
    conn_rewired: Vec<usize>,
}

impl RewiringStats {
    pub fn record_removed(&mut self, synapses: usize, connections: usize) {
        self.syn_removed.push(synapses);
        self.conn_removed.push(connections);
    }

    pub fn record_added(&mut self, synapses: usize, connections: usize) {
        self.syn_added.push(synapses);
        self.conn_added.push(connections);
    }

    pub fn record_rewired(&mut self, synapses: usize, connections: usize) {
        self.syn_rewired.push(synapses);
        self.conn_rewired.push(connections);
    }

    pub fn total_syn_removed(&self) -> usize {
        self.syn_removed.iter().sum()
    }

    pub fn total_conn_removed(&self) -> usize {
        self.conn_removed.iter().sum()
    }

    pub fn total_syn_added(&self) -> usize {
        self.syn_added.iter().sum()
    }

    pub fn total_conn_added(&self) -> usize {
        self.conn_added.iter().sum()
    }

    pub fn total_syn_rewired(&self) -> usize {
        self.syn_rewired.iter().sum()
    }

    pub fn total_conn_rewired(&self) -> usize {
        self.conn_rewired.iter().sum()
    }

    /// Log a per-counter COUNT/MEAN/MIN/MAX/SUM summary
    pub fn log_summary(&self) {
        let entries: [(&str, &[usize]); 6] = [
            ("num_syn_removed", &self.syn_removed),
            ("num_conn_removed", &self.conn_removed),
            ("num_syn_added", &self.syn_added),
            ("num_conn_added", &self.conn_added),
            ("num_syn_rewired", &self.syn_rewired),
            ("num_conn_rewired", &self.conn_rewired),
        ];
        for (name, values) in entries {
            if values.is_empty() {
                continue;
            }
            let count = values.len();
            let sum: usize = values.iter().sum();
            let min = values.iter().min().copied().unwrap_or(0);
            let max = values.iter().max().copied().unwrap_or(0);
            let mean = sum as f64 / count as f64;
            info!(
                target: "rewire-core",
                "STATISTICS {name}: COUNT {count}, MEAN {mean:.2}, MIN {min}, MAX {max}, SUM {sum}"
            );
        }
    }
}
