// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the tree engine: source identifiers, the source seam, the item graph and keys.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// Identifier of an item inside a [`TreeSource`].
///
/// This is a small, copyable handle. The engine never interprets it beyond equality and
/// ordering: it is used to detect circular references while parsing and to read item
/// properties back from the source.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SourceId(u32);

impl SourceId {
    /// Create an identifier from a raw slot number.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw slot number of this identifier.
    pub const fn get(self) -> u32 {
        self.0
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read access to a graph of labeled items.
///
/// The graph may share items between branches and may even contain cycles; the
/// parser in [`TreeData::parse`](crate::TreeData::parse) is responsible for rejecting the latter.
pub trait TreeSource {
    /// Display label of the item. Items without a non-empty label are not valid tree nodes.
    fn label(&self, id: SourceId) -> Option<&str>;

    /// Name reported in `select` notifications. Defaults to no name.
    fn name(&self, id: SourceId) -> Option<&str> {
        let _ = id;
        None
    }

    /// Whether the item's branch is expanded.
    fn is_expanded(&self, id: SourceId) -> bool;

    /// Whether the item is disabled. Disabled branches never reveal their children.
    fn is_disabled(&self, id: SourceId) -> bool {
        let _ = id;
        false
    }

    /// Ordered children of the item.
    fn children(&self, id: SourceId) -> &[SourceId];
}

/// Write access needed by the [`TreeView`](crate::TreeView) controller to expand and collapse branches.
pub trait TreeSourceMut: TreeSource {
    /// Set the expanded flag of an item.
    fn set_expanded(&mut self, id: SourceId, expanded: bool);
}

/// Properties of one item of an [`ItemGraph`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeItemSpec {
    /// Display label; must be non-empty for the item to appear in the tree.
    pub label: String,
    /// Name reported by `select` notifications.
    pub name: String,
    /// Branch expanded flag.
    pub expanded: bool,
    /// Disabled items cannot be expanded, collapsed or selected.
    pub disabled: bool,
    /// Optional link target.
    pub href: Option<String>,
    /// Optional secondary text.
    pub metatext: Option<String>,
}

impl TreeItemSpec {
    /// Create an item with the given label, using the label as its name as well.
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            name: label.to_string(),
            ..Default::default()
        }
    }

    /// Builder: set the expanded flag.
    #[must_use]
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Builder: set the disabled flag.
    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Builder: set the reported name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// Arena of tree items with explicit child links.
///
/// Children are stored as [`SourceId`] lists, so an item can be linked under several parents
/// (it then produces a distinct tree node per occurrence) and a link back to an ancestor is
/// representable, which the parser reports as a circular reference.
#[derive(Clone, Debug, Default)]
pub struct ItemGraph {
    items: Vec<TreeItemSpec>,
    children: Vec<Vec<SourceId>>,
}

impl ItemGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item without links and return its identifier.
    pub fn insert(&mut self, item: TreeItemSpec) -> SourceId {
        self.items.push(item);
        self.children.push(Vec::new());
        #[allow(
            clippy::cast_possible_truncation,
            reason = "SourceId uses 32-bit slots."
        )]
        SourceId::new((self.items.len() - 1) as u32)
    }

    /// Insert an item and link it as the last child of `parent`.
    pub fn insert_child(&mut self, parent: SourceId, item: TreeItemSpec) -> SourceId {
        let id = self.insert(item);
        self.link(parent, id);
        id
    }

    /// Append `child` to the children of `parent`. Unknown parents are ignored.
    pub fn link(&mut self, parent: SourceId, child: SourceId) {
        if let Some(list) = self.children.get_mut(parent.idx()) {
            list.push(child);
        }
    }

    /// Item properties, if `id` belongs to this graph.
    pub fn item(&self, id: SourceId) -> Option<&TreeItemSpec> {
        self.items.get(id.idx())
    }

    /// Mutable item properties, if `id` belongs to this graph.
    pub fn item_mut(&mut self, id: SourceId) -> Option<&mut TreeItemSpec> {
        self.items.get_mut(id.idx())
    }

    /// Number of items in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the arena holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl TreeSource for ItemGraph {
    fn label(&self, id: SourceId) -> Option<&str> {
        self.item(id).map(|item| item.label.as_str())
    }

    fn name(&self, id: SourceId) -> Option<&str> {
        self.item(id).map(|item| item.name.as_str())
    }

    fn is_expanded(&self, id: SourceId) -> bool {
        self.item(id).is_some_and(|item| item.expanded)
    }

    fn is_disabled(&self, id: SourceId) -> bool {
        self.item(id).is_some_and(|item| item.disabled)
    }

    fn children(&self, id: SourceId) -> &[SourceId] {
        self.children.get(id.idx()).map_or(&[], Vec::as_slice)
    }
}

impl TreeSourceMut for ItemGraph {
    fn set_expanded(&mut self, id: SourceId, expanded: bool) {
        if let Some(item) = self.item_mut(id) {
            item.expanded = expanded;
        }
    }
}

/// Dotted path key of a tree node, for example `"1.2.1"`.
///
/// Segments are 1-based ordinals among the parent's children. The synthetic root is `"0"`;
/// its children are `"1"`, `"2"`, ... without a root prefix.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TreeKey(String);

impl TreeKey {
    /// Key of the synthetic root.
    pub fn root() -> Self {
        Self(String::from("0"))
    }

    /// Wrap an existing dotted path.
    pub fn new(path: &str) -> Self {
        Self(path.to_string())
    }

    /// Whether this is the synthetic root key.
    pub fn is_root(&self) -> bool {
        self.0 == "0"
    }

    /// Key of the `ordinal`-th child (1-based) of this node.
    pub fn child(&self, ordinal: usize) -> Self {
        if self.is_root() {
            Self(ordinal.to_string())
        } else {
            let mut path = self.0.clone();
            path.push('.');
            path.push_str(&ordinal.to_string());
            Self(path)
        }
    }

    /// The dotted path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Zero-based position of this node among its siblings, read from the last path segment.
    ///
    /// Returns `None` when the last segment is not a positive number.
    pub fn child_num(&self) -> Option<usize> {
        let last = self.0.rsplit('.').next()?;
        last.parse::<usize>().ok()?.checked_sub(1)
    }
}

impl fmt::Display for TreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreeKey {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_keys_drop_root_prefix() {
        let root = TreeKey::root();
        let first = root.child(1);
        assert_eq!(first.as_str(), "1");
        assert_eq!(first.child(2).child(1).as_str(), "1.2.1");
    }

    #[test]
    fn child_num_reads_last_segment() {
        assert_eq!(TreeKey::new("3").child_num(), Some(2));
        assert_eq!(TreeKey::new("1.2.4").child_num(), Some(3));
        assert_eq!(TreeKey::new("1.x").child_num(), None);
        assert_eq!(TreeKey::new("0").child_num(), None, "root has no ordinal");
    }

    #[test]
    fn graph_links_shared_children() {
        let mut graph = ItemGraph::new();
        let a = graph.insert(TreeItemSpec::new("a"));
        let b = graph.insert(TreeItemSpec::new("b"));
        let shared = graph.insert(TreeItemSpec::new("shared"));
        graph.link(a, shared);
        graph.link(b, shared);
        assert_eq!(graph.children(a), &[shared]);
        assert_eq!(graph.children(b), &[shared]);
        assert_eq!(graph.label(shared), Some("shared"));
        assert!(graph.children(SourceId::new(99)).is_empty());
    }

    #[test]
    fn set_expanded_round_trips_through_source() {
        let mut graph = ItemGraph::new();
        let a = graph.insert(TreeItemSpec::new("a"));
        assert!(!graph.is_expanded(a));
        graph.set_expanded(a, true);
        assert!(graph.is_expanded(a));
    }
}
