// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors for structurally invalid grid configuration.
//!
//! Runtime data variability (out-of-range widths, unknown selected keys, bad offsets) is never an
//! error. Those inputs are logged through `tracing` and replaced by their documented defaults.

/// Configuration the grid refuses to run with.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A sort direction other than `"asc"` or `"desc"`.
    #[error("invalid sort direction {value:?}, expected \"asc\" or \"desc\"")]
    InvalidSortDirection {
        /// The rejected input.
        value: String,
    },
    /// `keyField` was given but is not a string.
    #[error("keyField must be a string, found {found}")]
    InvalidKeyField {
        /// JSON rendering of the rejected input.
        found: String,
    },
    /// Type-attribute metadata was requested for a type nobody registered.
    #[error("unknown column type {name:?}")]
    UnknownType {
        /// The unregistered type name.
        name: String,
    },
    /// Two rows produced the same key while [`RowKeyPolicy::Strict`](crate::RowKeyPolicy::Strict) is active.
    #[error("row {row_index} has key {key:?}, which an earlier row already uses")]
    DuplicateRowKey {
        /// The colliding key.
        key: String,
        /// Position of the second row in the data.
        row_index: usize,
    },
    /// A JSON configuration document could not be decoded.
    #[error("invalid grid options")]
    Options(#[from] serde_json::Error),
}
