// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessera Tree: flatten a labeled item graph into a navigable tree.
//!
//! Tessera Tree is the model behind hierarchical list widgets such as file browsers, outline
//! views and navigation trees.
//!
//! - Parses a graph of items into a depth-first traversal order with dotted path keys (`"1.2.1"`).
//! - Tracks which items are visible, given the expanded and disabled state of their ancestors.
//! - Answers keyboard focus queries (next, previous, first, last visible item).
//! - Detects circular references instead of recursing forever.
//!
//! ## Items and the source seam
//!
//! Items are read through the [`TreeSource`] trait, keyed by [`SourceId`]. The crate ships
//! [`ItemGraph`], a small arena that can express every shape the parser must handle: plain
//! nesting, the same item linked under two parents (two distinct tree nodes), and links back to
//! an ancestor (a [`TreeError::CircularReference`]).
//!
//! ## Keys
//!
//! The synthetic root is `"0"`. Top-level items are `"1"`, `"2"`, ... and the `n`-th child of
//! `"1.2"` is `"1.2.n"`. Ordinals are 1-based. Items skipped for an empty label still consume
//! their ordinal.
//!
//! ## API overview
//!
//! - [`TreeData`]: the flattened tree. [`TreeData::parse`] rebuilds it from a source.
//! - [`TreeNode`]: parsed node tree returned by the parser.
//! - [`TreeItemIndex`]: per-key index entry (traversal position, parent, level).
//! - [`TreeView`]: keyboard and click controller producing [`TreeEvent`]s.
//! - [`LabelPolicy`]: skip or reject unlabeled items.
//!
//! Key operations:
//! - [`TreeData::find_next_to_focus`] / [`TreeData::find_prev_to_focus`]
//! - [`TreeData::find_first_to_focus`] / [`TreeData::find_last_to_focus`]
//! - [`TreeData::update_visible_on_collapse`] / [`TreeData::reveal_children`]
//!
//! ### Minimal usage
//!
//! ```
//! use tessera_tree::{ItemGraph, LabelPolicy, TreeData, TreeItemSpec, TreeKey};
//!
//! let mut graph = ItemGraph::new();
//! let docs = graph.insert(TreeItemSpec::new("docs").expanded(true));
//! let _guide = graph.insert_child(docs, TreeItemSpec::new("guide.md"));
//! let src = graph.insert(TreeItemSpec::new("src"));
//!
//! let mut data = TreeData::new();
//! let root = data.parse(&graph, &[docs, src], LabelPolicy::Skip).unwrap();
//! assert_eq!(root.children.len(), 2);
//!
//! let order: Vec<&str> = data.traversal_order().iter().map(TreeKey::as_str).collect();
//! assert_eq!(order, ["1", "1.1", "2"]);
//!
//! // Collapsing "1" hides its child.
//! data.update_visible_on_collapse(&TreeKey::new("1"));
//! assert!(!data.is_visible(&TreeKey::new("1.1")));
//! ```
//!
//! ### Cycles are reported
//!
//! ```
//! use tessera_tree::{ItemGraph, LabelPolicy, TreeData, TreeError, TreeItemSpec};
//!
//! let mut graph = ItemGraph::new();
//! let a = graph.insert(TreeItemSpec::new("a"));
//! let b = graph.insert_child(a, TreeItemSpec::new("b"));
//! graph.link(b, a);
//!
//! let err = TreeData::new().parse(&graph, &[a], LabelPolicy::Skip).unwrap_err();
//! assert!(matches!(err, TreeError::CircularReference { .. }));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod data;
mod error;
mod types;
mod view;

pub use data::{LabelPolicy, TreeData, TreeItemIndex, TreeNode};
pub use error::TreeError;
pub use types::{ItemGraph, SourceId, TreeItemSpec, TreeKey, TreeSource, TreeSourceMut};
pub use view::{ClickTarget, TreeEvent, TreeKeyCode, TreeView};
