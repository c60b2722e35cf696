// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree flattening: traversal order, the key index, the visible set and focus queries.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use tracing::warn;

use crate::error::TreeError;
use crate::types::{SourceId, TreeKey, TreeSource};

/// What to do with an item whose label is empty.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Skip the item and its subtree, logging a warning.
    #[default]
    Skip,
    /// Abort the parse with [`TreeError::MissingLabel`].
    Reject,
}

/// A parsed tree node.
///
/// The root returned by [`TreeData::parse`] is synthetic: it has key `"0"`, level 0, no
/// source item and is always expanded and visible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    /// Dotted path key.
    pub key: TreeKey,
    /// Source item this node was built from; `None` for the synthetic root.
    pub source: Option<SourceId>,
    /// Depth, 1-based for real items.
    pub level: usize,
    /// Key of the parent node; `None` for the root.
    pub parent: Option<TreeKey>,
    /// Display label.
    pub label: String,
    /// Name reported by `select`.
    pub name: Option<String>,
    /// Expanded flag at parse time, kept in sync by [`TreeView`](crate::TreeView).
    pub expanded: bool,
    /// Disabled flag.
    pub disabled: bool,
    /// True when the source item has no children.
    pub is_leaf: bool,
    /// Visibility at parse time.
    pub visible: bool,
    /// Parsed children, in source order, skipping invalid items.
    pub children: Vec<Self>,
    /// Keys of every visible descendant in pre-order.
    pub visible_items: Vec<TreeKey>,
}

impl TreeNode {
    fn root() -> Self {
        Self {
            key: TreeKey::root(),
            source: None,
            level: 0,
            parent: None,
            label: String::new(),
            name: None,
            expanded: true,
            disabled: false,
            is_leaf: false,
            visible: true,
            children: Vec::new(),
            visible_items: Vec::new(),
        }
    }

    /// Find a node by key in this subtree.
    pub fn find(&self, key: &TreeKey) -> Option<&Self> {
        if &self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    /// Find a node by key in this subtree, mutably.
    pub fn find_mut(&mut self, key: &TreeKey) -> Option<&mut Self> {
        if &self.key == key {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(key))
    }
}

/// Index entry for one item of the traversal order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeItemIndex {
    /// Position in [`TreeData::traversal_order`].
    pub index: usize,
    /// Dotted path key.
    pub key: TreeKey,
    /// Parent key; top-level items point at the root key `"0"`.
    pub parent: TreeKey,
    /// Depth, 1-based.
    pub level: usize,
    /// Source item.
    pub source: SourceId,
    /// Zero-based ordinal of the child that last held focus, if any.
    pub focused_child: Option<usize>,
}

/// Flattened view of a parsed tree.
///
/// Navigation queries consider only items in the visible set but use the traversal order to
/// decide adjacency.
#[derive(Clone, Default)]
pub struct TreeData {
    current_focused_index: usize,
    traversal: Vec<TreeKey>,
    visible: BTreeSet<TreeKey>,
    indices: BTreeMap<TreeKey, TreeItemIndex>,
    root_focused_child: Option<usize>,
}

impl fmt::Debug for TreeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeData")
            .field("current_focused_index", &self.current_focused_index)
            .field("items", &self.traversal.len())
            .field("visible", &self.visible.len())
            .finish_non_exhaustive()
    }
}

struct ParseCtx<'a, S: ?Sized> {
    source: &'a S,
    policy: LabelPolicy,
    in_progress: BTreeSet<SourceId>,
}

impl TreeData {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the items reachable from `roots` and rebuild every index.
    ///
    /// Items are visited depth first. An item that is reached again while it is still being
    /// visited closes a cycle and fails the parse with [`TreeError::CircularReference`]; an
    /// item shared between unrelated branches is fine and yields one node per occurrence.
    ///
    /// Items without a label are handled per `policy`. Skipped items still consume their
    /// ordinal, so sibling keys stay stable.
    pub fn parse<S: TreeSource + ?Sized>(
        &mut self,
        source: &S,
        roots: &[SourceId],
        policy: LabelPolicy,
    ) -> Result<TreeNode, TreeError> {
        *self = Self::default();
        let mut ctx = ParseCtx {
            source,
            policy,
            in_progress: BTreeSet::new(),
        };
        let mut root = TreeNode::root();
        for (i, &id) in roots.iter().enumerate() {
            self.build(&mut ctx, &mut root, id, i + 1)?;
        }
        self.visible = root.visible_items.iter().cloned().collect();
        Ok(root)
    }

    fn build<S: TreeSource + ?Sized>(
        &mut self,
        ctx: &mut ParseCtx<'_, S>,
        parent: &mut TreeNode,
        id: SourceId,
        ordinal: usize,
    ) -> Result<(), TreeError> {
        let source = ctx.source;
        let key = parent.key.child(ordinal);
        if ctx.in_progress.contains(&id) {
            return Err(TreeError::CircularReference { node: id });
        }
        let label = source.label(id).unwrap_or_default();
        if label.is_empty() {
            match ctx.policy {
                LabelPolicy::Skip => {
                    warn!(key = %key, "tree item has an empty label, skipping it");
                    return Ok(());
                }
                LabelPolicy::Reject => return Err(TreeError::MissingLabel { path: key }),
            }
        }

        let children = source.children(id);
        let mut node = TreeNode {
            key: key.clone(),
            source: Some(id),
            level: parent.level + 1,
            parent: Some(parent.key.clone()),
            label: label.to_string(),
            name: source.name(id).map(ToString::to_string),
            expanded: source.is_expanded(id),
            disabled: source.is_disabled(id),
            is_leaf: children.is_empty(),
            visible: parent.visible && parent.expanded && !parent.disabled,
            children: Vec::new(),
            visible_items: Vec::new(),
        };

        self.traversal.push(key.clone());
        self.indices.insert(
            key.clone(),
            TreeItemIndex {
                index: self.traversal.len() - 1,
                key,
                parent: parent.key.clone(),
                level: node.level,
                source: id,
                focused_child: None,
            },
        );

        ctx.in_progress.insert(id);
        for (i, &child) in children.iter().enumerate() {
            self.build(ctx, &mut node, child, i + 1)?;
        }
        ctx.in_progress.remove(&id);

        if node.visible {
            parent.visible_items.push(node.key.clone());
            parent.visible_items.extend(node.visible_items.iter().cloned());
        }
        parent.children.push(node);
        Ok(())
    }

    /// Keys in depth-first pre-order.
    pub fn traversal_order(&self) -> &[TreeKey] {
        &self.traversal
    }

    /// Number of parsed items.
    pub fn len(&self) -> usize {
        self.traversal.len()
    }

    /// Whether the parse produced no items.
    pub fn is_empty(&self) -> bool {
        self.traversal.is_empty()
    }

    /// Keys of the currently visible items, in key order.
    pub fn visible_items(&self) -> impl Iterator<Item = &TreeKey> + '_ {
        self.visible.iter()
    }

    /// Whether `key` is in the visible set.
    pub fn is_visible(&self, key: &TreeKey) -> bool {
        self.visible.contains(key)
    }

    /// Add `key` to the visible set.
    pub fn add_visible(&mut self, key: TreeKey) {
        self.visible.insert(key);
    }

    /// Remove `key` from the visible set.
    pub fn remove_visible(&mut self, key: &TreeKey) {
        self.visible.remove(key);
    }

    /// Traversal index of the focused item.
    pub fn current_focused_index(&self) -> usize {
        self.current_focused_index
    }

    /// Index entry for `key`.
    pub fn item(&self, key: &TreeKey) -> Option<&TreeItemIndex> {
        self.indices.get(key)
    }

    /// Index entry at traversal position `index`.
    pub fn item_at(&self, index: usize) -> Option<&TreeItemIndex> {
        self.traversal.get(index).and_then(|key| self.indices.get(key))
    }

    /// Traversal position of `key`.
    pub fn find_index(&self, key: &TreeKey) -> Option<usize> {
        self.indices.get(key).map(|item| item.index)
    }

    /// Whether `key` is the focused item.
    pub fn is_current_focused(&self, key: &TreeKey) -> bool {
        self.find_index(key) == Some(self.current_focused_index)
    }

    /// Whether `key` still names a parsed item.
    pub fn is_valid_current(&self, key: &TreeKey) -> bool {
        self.indices.contains_key(key)
    }

    /// First visible item after the focused one.
    pub fn find_next_to_focus(&self) -> Option<&TreeItemIndex> {
        self.traversal
            .iter()
            .skip(self.current_focused_index + 1)
            .find(|key| self.is_visible(key))
            .and_then(|key| self.item(key))
    }

    /// Last visible item before the focused one.
    pub fn find_prev_to_focus(&self) -> Option<&TreeItemIndex> {
        let end = self.current_focused_index.min(self.traversal.len());
        self.traversal[..end]
            .iter()
            .rev()
            .find(|key| self.is_visible(key))
            .and_then(|key| self.item(key))
    }

    /// The first item in traversal order. Top-level items are always visible.
    pub fn find_first_to_focus(&self) -> Option<&TreeItemIndex> {
        self.item_at(0)
    }

    /// The last visible item in traversal order.
    pub fn find_last_to_focus(&self) -> Option<&TreeItemIndex> {
        self.traversal
            .iter()
            .rev()
            .find(|key| self.is_visible(key))
            .and_then(|key| self.item(key))
    }

    /// Move the focus to traversal position `index`, returning the item now focused.
    ///
    /// Out-of-range positions leave the focus unchanged and return `None`.
    pub fn update_current_focused_index(&mut self, index: usize) -> Option<&TreeItemIndex> {
        if index < self.traversal.len() {
            self.current_focused_index = index;
            self.item_at(index)
        } else {
            None
        }
    }

    /// Remember `key` as the focused child of its parent.
    pub fn update_current_focused_child(&mut self, key: &TreeKey) {
        let Some(num) = key.child_num() else {
            return;
        };
        let Some(parent) = self.indices.get(key).map(|item| item.parent.clone()) else {
            return;
        };
        if parent.is_root() {
            self.root_focused_child = Some(num);
        } else if let Some(entry) = self.indices.get_mut(&parent) {
            entry.focused_child = Some(num);
        }
    }

    /// Ordinal of the top-level item that last held focus.
    pub fn root_focused_child(&self) -> Option<usize> {
        self.root_focused_child
    }

    /// Hide every descendant of the collapsed branch `key`.
    ///
    /// Walks the traversal order after `key` until the first entry whose level is not deeper.
    pub fn update_visible_on_collapse(&mut self, key: &TreeKey) {
        let Some(branch) = self.item(key) else {
            return;
        };
        let (start, level) = (branch.index + 1, branch.level);
        let hidden: Vec<TreeKey> = self.traversal[start..]
            .iter()
            .take_while(|k| self.indices.get(*k).is_some_and(|item| item.level > level))
            .cloned()
            .collect();
        for k in &hidden {
            self.visible.remove(k);
        }
    }

    /// Show the descendants of the expanded branch `key` whose ancestors are all expanded and enabled.
    pub fn reveal_children<S: TreeSource + ?Sized>(&mut self, source: &S, key: &TreeKey) {
        let Some(branch) = self.item(key) else {
            return;
        };
        let (start, level) = (branch.index + 1, branch.level);
        let mut hidden_below: Option<usize> = None;
        let mut shown = Vec::new();
        for k in &self.traversal[start..] {
            let Some(item) = self.indices.get(k) else {
                break;
            };
            if item.level <= level {
                break;
            }
            if hidden_below.is_some_and(|l| item.level > l) {
                continue;
            }
            hidden_below = None;
            shown.push(k.clone());
            if !source.is_expanded(item.source) || source.is_disabled(item.source) {
                hidden_below = Some(item.level);
            }
        }
        self.visible.extend(shown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemGraph, TreeItemSpec};
    use alloc::vec;

    /// Builds `1, 1.1, 1.2, 1.2.1, 1.2.2, 2, 3` with every branch expanded.
    fn nested() -> (ItemGraph, Vec<SourceId>) {
        let mut g = ItemGraph::new();
        let one = g.insert(TreeItemSpec::new("one").expanded(true));
        let _ = g.insert_child(one, TreeItemSpec::new("one.one"));
        let one_two = g.insert_child(one, TreeItemSpec::new("one.two").expanded(true));
        let _ = g.insert_child(one_two, TreeItemSpec::new("one.two.one"));
        let _ = g.insert_child(one_two, TreeItemSpec::new("one.two.two"));
        let two = g.insert(TreeItemSpec::new("two"));
        let three = g.insert(TreeItemSpec::new("three"));
        (g, vec![one, two, three])
    }

    fn keys(list: &[&str]) -> Vec<TreeKey> {
        list.iter().map(|k| TreeKey::new(k)).collect()
    }

    fn visible(data: &TreeData) -> Vec<TreeKey> {
        data.traversal_order()
            .iter()
            .filter(|k| data.is_visible(k))
            .cloned()
            .collect()
    }

    #[test]
    fn parse_builds_preorder_keys_and_levels() {
        let (g, roots) = nested();
        let mut data = TreeData::new();
        let root = data.parse(&g, &roots, LabelPolicy::Skip).unwrap();
        assert_eq!(
            data.traversal_order(),
            keys(&["1", "1.1", "1.2", "1.2.1", "1.2.2", "2", "3"]).as_slice()
        );
        let item = data.item(&TreeKey::new("1.2.1")).unwrap();
        assert_eq!(item.level, 3);
        assert_eq!(item.index, 3);
        assert_eq!(item.parent, TreeKey::new("1.2"));
        assert_eq!(data.item(&TreeKey::new("2")).unwrap().parent, TreeKey::root());
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.visible_items.len(), 7);
    }

    #[test]
    fn collapsing_hides_descendants_only() {
        let (g, roots) = nested();
        let mut data = TreeData::new();
        data.parse(&g, &roots, LabelPolicy::Skip).unwrap();
        assert_eq!(visible(&data).len(), 7, "all items start visible");

        data.update_visible_on_collapse(&TreeKey::new("1"));
        assert_eq!(visible(&data), keys(&["1", "2", "3"]));

        // Collapsing a leaf changes nothing.
        data.update_visible_on_collapse(&TreeKey::new("2"));
        assert_eq!(visible(&data), keys(&["1", "2", "3"]));
    }

    #[test]
    fn collapsed_branches_hide_children_at_parse() {
        let mut g = ItemGraph::new();
        let a = g.insert(TreeItemSpec::new("a"));
        let _ = g.insert_child(a, TreeItemSpec::new("a1"));
        let b = g.insert(TreeItemSpec::new("b").expanded(true).disabled(true));
        let _ = g.insert_child(b, TreeItemSpec::new("b1"));
        let mut data = TreeData::new();
        let root = data.parse(&g, &[a, b], LabelPolicy::Skip).unwrap();
        assert_eq!(visible(&data), keys(&["1", "2"]));
        assert!(!root.children[0].children[0].visible);
        assert!(!root.children[1].children[0].visible, "disabled branch hides children");
    }

    #[test]
    fn cycle_is_an_error() {
        let mut g = ItemGraph::new();
        let a = g.insert(TreeItemSpec::new("A"));
        let b = g.insert_child(a, TreeItemSpec::new("B"));
        let c = g.insert_child(b, TreeItemSpec::new("C"));
        g.link(c, a);
        let mut data = TreeData::new();
        let err = data.parse(&g, &[a], LabelPolicy::Skip).unwrap_err();
        assert_eq!(err, TreeError::CircularReference { node: a });
    }

    #[test]
    fn shared_items_produce_distinct_nodes() {
        let mut g = ItemGraph::new();
        let shared = g.insert(TreeItemSpec::new("shared"));
        let a = g.insert(TreeItemSpec::new("a").expanded(true));
        let b = g.insert(TreeItemSpec::new("b").expanded(true));
        g.link(a, shared);
        g.link(b, shared);
        let mut data = TreeData::new();
        data.parse(&g, &[a, b, shared], LabelPolicy::Skip).unwrap();
        assert_eq!(
            data.traversal_order(),
            keys(&["1", "1.1", "2", "2.1", "3"]).as_slice()
        );
        assert_eq!(data.item(&TreeKey::new("2.1")).unwrap().source, shared);
    }

    #[test]
    fn unlabeled_items_follow_policy() {
        let mut g = ItemGraph::new();
        let a = g.insert(TreeItemSpec::new("a").expanded(true));
        let _ = g.insert_child(a, TreeItemSpec::default());
        let _ = g.insert_child(a, TreeItemSpec::new("a2"));

        let mut data = TreeData::new();
        data.parse(&g, &[a], LabelPolicy::Skip).unwrap();
        // The skipped item keeps its ordinal.
        assert_eq!(data.traversal_order(), keys(&["1", "1.2"]).as_slice());

        let err = data.parse(&g, &[a], LabelPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            TreeError::MissingLabel {
                path: TreeKey::new("1.1")
            }
        );
    }

    #[test]
    fn navigation_skips_hidden_items() {
        let (g, roots) = nested();
        let mut data = TreeData::new();
        data.parse(&g, &roots, LabelPolicy::Skip).unwrap();
        data.update_visible_on_collapse(&TreeKey::new("1.2"));

        data.update_current_focused_index(2);
        assert_eq!(data.find_next_to_focus().unwrap().key, TreeKey::new("2"));
        assert_eq!(data.find_prev_to_focus().unwrap().key, TreeKey::new("1.1"));
        assert_eq!(data.find_first_to_focus().unwrap().key, TreeKey::new("1"));
        assert_eq!(data.find_last_to_focus().unwrap().key, TreeKey::new("3"));

        data.update_current_focused_index(0);
        assert!(data.find_prev_to_focus().is_none());
        data.update_current_focused_index(6);
        assert!(data.find_next_to_focus().is_none());
        assert!(
            data.update_current_focused_index(7).is_none(),
            "out of range leaves focus alone"
        );
        assert_eq!(data.current_focused_index(), 6);
    }

    #[test]
    fn reveal_respects_nested_collapse() {
        let (mut g, roots) = nested();
        let mut data = TreeData::new();
        data.parse(&g, &roots, LabelPolicy::Skip).unwrap();
        data.update_visible_on_collapse(&TreeKey::new("1"));

        let one_two = data.item(&TreeKey::new("1.2")).unwrap().source;
        g.item_mut(one_two).unwrap().expanded = false;
        data.reveal_children(&g, &TreeKey::new("1"));
        assert_eq!(visible(&data), keys(&["1", "1.1", "1.2", "2", "3"]));
    }

    #[test]
    fn focused_child_is_tracked_on_parent() {
        let (g, roots) = nested();
        let mut data = TreeData::new();
        data.parse(&g, &roots, LabelPolicy::Skip).unwrap();
        data.update_current_focused_child(&TreeKey::new("1.2"));
        assert_eq!(data.item(&TreeKey::new("1")).unwrap().focused_child, Some(1));
        data.update_current_focused_child(&TreeKey::new("3"));
        assert_eq!(data.root_focused_child(), Some(2));
    }
}
