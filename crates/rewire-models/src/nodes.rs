// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Node population tables and position mapping.

A `NodePopulation` holds the per-neuron properties the rewiring core needs
to query: soma position, morphological type, cortical layer and synapse
class. Node ids are stored in ascending order; lookups go through an
id -> row map.

An optional `PositionMap` remaps neuron coordinates (e.g. flat-mapped
positions) before any pairwise geometry is computed. When a mapping is
present it *replaces* the population's raw positions for every node it is
applied to; a node missing from the mapping is an error.
*/

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Node (neuron) identifier within a population
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// Synapse class of a neuron, structurally encoded in its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynapseClass {
    #[serde(rename = "EXC")]
    Exc,
    #[serde(rename = "INH")]
    Inh,
}

impl fmt::Display for SynapseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynapseClass::Exc => write!(f, "EXC"),
            SynapseClass::Inh => write!(f, "INH"),
        }
    }
}

/// Per-neuron properties required by the rewiring core
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub position: [f64; 3],
    pub mtype: String,
    pub layer: u32,
    pub synapse_class: SynapseClass,
}

/// Predicate for selecting a subset of a node population.
///
/// All present fields must match; an empty selector matches every node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeSelector {
    #[serde(default)]
    pub mtype: Option<String>,
    #[serde(default)]
    pub layer: Option<u32>,
    #[serde(default)]
    pub synapse_class: Option<SynapseClass>,
}

impl NodeSelector {
    fn matches(&self, info: &NodeInfo) -> bool {
        if let Some(m) = &self.mtype {
            if info.mtype != *m {
                return false;
            }
        }
        if let Some(l) = self.layer {
            if info.layer != l {
                return false;
            }
        }
        if let Some(c) = self.synapse_class {
            if info.synapse_class != c {
                return false;
            }
        }
        true
    }
}

/// A population of neurons with the properties the rewiring core queries
#[derive(Debug, Clone)]
pub struct NodePopulation {
    nodes: Vec<NodeInfo>,
    index: AHashMap<NodeId, usize>,
}

impl NodePopulation {
    /// Build a population from per-node records. Nodes are stored in
    /// ascending id order; duplicate ids are rejected.
    pub fn from_nodes(mut nodes: Vec<NodeInfo>) -> ModelResult<Self> {
        nodes.sort_by_key(|n| n.id);
        let mut index = AHashMap::with_capacity(nodes.len());
        for (row, node) in nodes.iter().enumerate() {
            if index.insert(node.id, row).is_some() {
                return Err(ModelError::DuplicateNode(node.id));
            }
        }
        Ok(Self { nodes, index })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// All node ids, ascending
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    fn info(&self, id: NodeId) -> ModelResult<&NodeInfo> {
        self.index
            .get(&id)
            .map(|&row| &self.nodes[row])
            .ok_or(ModelError::UnknownNode(id))
    }

    /// Raw (unmapped) soma position of a node
    pub fn position(&self, id: NodeId) -> ModelResult<[f64; 3]> {
        Ok(self.info(id)?.position)
    }

    pub fn mtype(&self, id: NodeId) -> ModelResult<&str> {
        Ok(self.info(id)?.mtype.as_str())
    }

    pub fn layer(&self, id: NodeId) -> ModelResult<u32> {
        Ok(self.info(id)?.layer)
    }

    pub fn synapse_class(&self, id: NodeId) -> ModelResult<SynapseClass> {
        Ok(self.info(id)?.synapse_class)
    }

    /// Ids of all nodes matching the selector, ascending.
    /// `None` selects the whole population.
    pub fn select(&self, selector: Option<&NodeSelector>) -> Vec<NodeId> {
        match selector {
            None => self.ids(),
            Some(sel) => self
                .nodes
                .iter()
                .filter(|n| sel.matches(n))
                .map(|n| n.id)
                .collect(),
        }
    }
}

/// Optional coordinate remapping applied before geometry computation.
///
/// Source and target nodes must be covered by the same mapping.
#[derive(Debug, Clone, Default)]
pub struct PositionMap {
    map: AHashMap<NodeId, [f64; 3]>,
}

impl PositionMap {
    pub fn from_entries(entries: impl IntoIterator<Item = (NodeId, [f64; 3])>) -> Self {
        Self {
            map: entries.into_iter().collect(),
        }
    }

    pub fn position(&self, id: NodeId) -> ModelResult<[f64; 3]> {
        self.map
            .get(&id)
            .copied()
            .ok_or(ModelError::UnmappedNode(id))
    }
}

/// Position of a node, going through the position mapping when one is given.
pub fn resolved_position(
    population: &NodePopulation,
    pos_map: Option<&PositionMap>,
    id: NodeId,
) -> ModelResult<[f64; 3]> {
    match pos_map {
        Some(map) => map.position(id),
        None => population.position(id),
    }
}
