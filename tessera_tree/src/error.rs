// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while parsing a tree.

use crate::types::{SourceId, TreeKey};

/// Structural problems in the item graph handed to [`TreeData::parse`](crate::TreeData::parse).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// An item was reached again while one of its own descendants was being visited.
    #[error("tree data has a circular reference at item {node}")]
    CircularReference {
        /// The item that closes the cycle.
        node: SourceId,
    },
    /// An item below the root has an empty label and [`LabelPolicy::Reject`](crate::LabelPolicy::Reject) is active.
    #[error("tree item at {path} has an empty label")]
    MissingLabel {
        /// Key the item would have received.
        path: TreeKey,
    },
}
