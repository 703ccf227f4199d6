// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Columnar edge (synapse) table.

One row per synapse: source node, target node, synapse position on the
target dendrite (afferent center), delay, plus an open set of named extra
property columns. Extra columns are statically typed at construction time
(`PropKind::Float` or `PropKind::Int`); there is no runtime reflection
over column types.

Rows are identified by their index. Index identity is not stable across
reconciliation: deletions and appends are staged externally (deletion
mask + pending-additions table) and applied in one pass, after which the
table is re-sorted by (target, source) and the dense zero-based index is
re-established implicitly by row order.

A column name containing any of `_node`, `_x`, `_y`, `_z`, `_section`,
`_segment`, `_length` is morphology-linked: its values stay tied to the
duplicated synapse position and are never resampled per connection.
*/

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use rewire_models::NodeId;

use crate::types::{RewireError, RewireResult};

/// Name fragments marking a column as morphology-linked
pub const MORPHOLOGY_NAME_FRAGMENTS: &[&str] =
    &["_node", "_x", "_y", "_z", "_section", "_segment", "_length"];

/// Declared type of an extra property column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropKind {
    Float,
    Int,
}

/// Storage for one extra property column
#[derive(Debug, Clone, PartialEq)]
pub enum PropColumn {
    Float(Vec<f64>),
    Int(Vec<i64>),
}

impl PropColumn {
    fn new(kind: PropKind) -> Self {
        match kind {
            PropKind::Float => PropColumn::Float(Vec::new()),
            PropKind::Int => PropColumn::Int(Vec::new()),
        }
    }

    fn kind(&self) -> PropKind {
        match self {
            PropColumn::Float(_) => PropKind::Float,
            PropColumn::Int(_) => PropKind::Int,
        }
    }

    fn len(&self) -> usize {
        match self {
            PropColumn::Float(v) => v.len(),
            PropColumn::Int(v) => v.len(),
        }
    }

    fn gather(&self, rows: &[usize]) -> Self {
        match self {
            PropColumn::Float(v) => PropColumn::Float(rows.iter().map(|&r| v[r]).collect()),
            PropColumn::Int(v) => PropColumn::Int(rows.iter().map(|&r| v[r]).collect()),
        }
    }

    fn push(&mut self, value: PropValue) -> RewireResult<()> {
        match (self, value) {
            (PropColumn::Float(v), PropValue::Float(x)) => v.push(x),
            (PropColumn::Int(v), PropValue::Int(x)) => v.push(x),
            (col, value) => {
                return Err(RewireError::SchemaMismatch(format!(
                    "cannot store {value:?} in a {:?} column",
                    col.kind()
                )))
            }
        }
        Ok(())
    }

    fn set(&mut self, row: usize, value: PropValue) -> RewireResult<()> {
        match (self, value) {
            (PropColumn::Float(v), PropValue::Float(x)) => v[row] = x,
            (PropColumn::Int(v), PropValue::Int(x)) => v[row] = x,
            (col, value) => {
                return Err(RewireError::SchemaMismatch(format!(
                    "cannot store {value:?} in a {:?} column",
                    col.kind()
                )))
            }
        }
        Ok(())
    }

    fn get(&self, row: usize) -> PropValue {
        match self {
            PropColumn::Float(v) => PropValue::Float(v[row]),
            PropColumn::Int(v) => PropValue::Int(v[row]),
        }
    }

    fn append(&mut self, other: &PropColumn) -> RewireResult<()> {
        match (self, other) {
            (PropColumn::Float(a), PropColumn::Float(b)) => a.extend_from_slice(b),
            (PropColumn::Int(a), PropColumn::Int(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(RewireError::SchemaMismatch(format!(
                    "cannot append {:?} column to {:?} column",
                    b.kind(),
                    a.kind()
                )))
            }
        }
        Ok(())
    }
}

/// A single extra-property cell value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropValue {
    Float(f64),
    Int(i64),
}

/// Columnar synapse table for one batch of target neurons
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeTable {
    source: Vec<NodeId>,
    target: Vec<NodeId>,
    position: Vec<[f64; 3]>,
    delay: Vec<f64>,
    prop_names: Vec<String>,
    props: AHashMap<String, PropColumn>,
}

impl EdgeTable {
    /// Create an empty table with the given extra-property schema
    pub fn with_schema(schema: &[(&str, PropKind)]) -> Self {
        let mut prop_names = Vec::with_capacity(schema.len());
        let mut props = AHashMap::with_capacity(schema.len());
        for &(name, kind) in schema {
            prop_names.push(name.to_string());
            props.insert(name.to_string(), PropColumn::new(kind));
        }
        Self {
            source: Vec::new(),
            target: Vec::new(),
            position: Vec::new(),
            delay: Vec::new(),
            prop_names,
            props,
        }
    }

    /// Empty table sharing this table's schema
    pub fn empty_like(&self) -> Self {
        self.gather(&[])
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Append one row; `props` must follow the schema's column order
    pub fn push_row(
        &mut self,
        source: NodeId,
        target: NodeId,
        position: [f64; 3],
        delay: f64,
        props: &[PropValue],
    ) -> RewireResult<()> {
        if props.len() != self.prop_names.len() {
            return Err(RewireError::SchemaMismatch(format!(
                "row has {} extra properties, schema has {}",
                props.len(),
                self.prop_names.len()
            )));
        }
        for (name, &value) in self.prop_names.iter().zip(props.iter()) {
            // Column presence is a construction invariant
            let col = self
                .props
                .get_mut(name)
                .ok_or_else(|| RewireError::SchemaMismatch(format!("missing column {name}")))?;
            col.push(value)?;
        }
        self.source.push(source);
        self.target.push(target);
        self.position.push(position);
        self.delay.push(delay);
        Ok(())
    }

    pub fn source(&self, row: usize) -> NodeId {
        self.source[row]
    }

    pub fn target(&self, row: usize) -> NodeId {
        self.target[row]
    }

    pub fn position(&self, row: usize) -> [f64; 3] {
        self.position[row]
    }

    pub fn delay(&self, row: usize) -> f64 {
        self.delay[row]
    }

    pub fn set_source(&mut self, row: usize, source: NodeId) {
        self.source[row] = source;
    }

    pub fn set_delay(&mut self, row: usize, delay: f64) {
        self.delay[row] = delay;
    }

    /// Extra-property column names, in schema order
    pub fn prop_names(&self) -> &[String] {
        &self.prop_names
    }

    /// Schema as (name, kind) pairs, in column order
    pub fn schema(&self) -> Vec<(String, PropKind)> {
        self.prop_names
            .iter()
            .map(|n| (n.clone(), self.props[n].kind()))
            .collect()
    }

    /// Extra-property column names that are NOT morphology-linked.
    /// These are the columns resampled once per connection and broadcast
    /// to the connection's synapses.
    pub fn non_morph_prop_names(&self) -> Vec<String> {
        self.prop_names
            .iter()
            .filter(|name| {
                !MORPHOLOGY_NAME_FRAGMENTS
                    .iter()
                    .any(|frag| name.contains(frag))
            })
            .cloned()
            .collect()
    }

    pub fn prop_value(&self, name: &str, row: usize) -> RewireResult<PropValue> {
        self.props
            .get(name)
            .map(|col| col.get(row))
            .ok_or_else(|| RewireError::SchemaMismatch(format!("unknown column {name}")))
    }

    pub fn set_prop_value(&mut self, name: &str, row: usize, value: PropValue) -> RewireResult<()> {
        let col = self
            .props
            .get_mut(name)
            .ok_or_else(|| RewireError::SchemaMismatch(format!("unknown column {name}")))?;
        col.set(row, value)
    }

    /// Integer column by name, if present with that type
    pub fn int_prop(&self, name: &str) -> Option<&[i64]> {
        match self.props.get(name) {
            Some(PropColumn::Int(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Float column by name, if present with that type
    pub fn float_prop(&self, name: &str) -> Option<&[f64]> {
        match self.props.get(name) {
            Some(PropColumn::Float(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Row indices grouped by target node
    pub fn rows_by_target(&self) -> AHashMap<NodeId, Vec<usize>> {
        let mut map: AHashMap<NodeId, Vec<usize>> = AHashMap::new();
        for (row, &tgt) in self.target.iter().enumerate() {
            map.entry(tgt).or_default().push(row);
        }
        map
    }

    /// New table holding copies of the given rows, in the given order
    pub fn gather(&self, rows: &[usize]) -> EdgeTable {
        let mut props = AHashMap::with_capacity(self.props.len());
        for name in &self.prop_names {
            props.insert(name.clone(), self.props[name].gather(rows));
        }
        EdgeTable {
            source: rows.iter().map(|&r| self.source[r]).collect(),
            target: rows.iter().map(|&r| self.target[r]).collect(),
            position: rows.iter().map(|&r| self.position[r]).collect(),
            delay: rows.iter().map(|&r| self.delay[r]).collect(),
            prop_names: self.prop_names.clone(),
            props,
        }
    }

    /// Drop every row whose mask entry is false
    pub fn retain(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.len());
        let rows: Vec<usize> = (0..self.len()).filter(|&r| keep[r]).collect();
        let kept = self.gather(&rows);
        *self = kept;
    }

    /// Append all rows of `other`; schemas must match exactly
    pub fn append(&mut self, other: &EdgeTable) -> RewireResult<()> {
        if self.prop_names != other.prop_names {
            return Err(RewireError::SchemaMismatch(format!(
                "column sets differ: {:?} vs {:?}",
                self.prop_names, other.prop_names
            )));
        }
        for name in &self.prop_names {
            let col = self
                .props
                .get_mut(name)
                .ok_or_else(|| RewireError::SchemaMismatch(format!("missing column {name}")))?;
            col.append(&other.props[name])?;
        }
        self.source.extend_from_slice(&other.source);
        self.target.extend_from_slice(&other.target);
        self.position.extend_from_slice(&other.position);
        self.delay.extend_from_slice(&other.delay);
        Ok(())
    }

    /// Sort rows by (target, source) ascending and re-establish the dense
    /// zero-based row index (implicit in row order). Stable, so rows of
    /// one connection keep their relative order.
    pub fn sort_by_target_source(&mut self) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&r| (self.target[r], self.source[r]));
        let sorted = self.gather(&order);
        *self = sorted;
    }

    /// True when rows are sorted by (target, source) ascending
    pub fn is_sorted_by_target_source(&self) -> bool {
        (1..self.len()).all(|r| {
            (self.target[r - 1], self.source[r - 1]) <= (self.target[r], self.source[r])
        })
    }

    /// Internal consistency check: every column has one entry per row
    pub fn check_consistent(&self) -> RewireResult<()> {
        let n = self.len();
        if self.target.len() != n
            || self.position.len() != n
            || self.delay.len() != n
            || self.props.values().any(|c| c.len() != n)
        {
            return Err(RewireError::SchemaMismatch(
                "column lengths diverge".to_string(),
            ));
        }
        Ok(())
    }
}
