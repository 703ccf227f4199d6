// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Error types for model loading and evaluation.
*/

use crate::nodes::NodeId;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while loading or evaluating models
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    FileNotFound(String),

    #[error("Model file '{path}' does not match the expected model family: {reason}")]
    InvalidModelFile { path: String, reason: String },

    #[error("Invalid model parameters: {0}")]
    InvalidParameters(String),

    #[error("Model of order {order} expects {expected} input(s), got {got}")]
    InputMismatch {
        order: u8,
        expected: usize,
        got: usize,
    },

    #[error("Feature vector shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Unknown node id {0}")]
    UnknownNode(NodeId),

    #[error("Duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("No position mapping for node id {0}")]
    UnmappedNode(NodeId),
}
