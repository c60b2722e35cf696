// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree view controller: keyboard and pointer reactions over a parsed tree.
//!
//! ## Minimal example
//!
//! ```
//! use tessera_tree::{ItemGraph, TreeItemSpec, TreeKey, TreeKeyCode, TreeView, TreeEvent};
//!
//! let mut graph = ItemGraph::new();
//! let fruit = graph.insert(TreeItemSpec::new("Fruit"));
//! let _apple = graph.insert_child(fruit, TreeItemSpec::new("Apple"));
//! let veg = graph.insert(TreeItemSpec::new("Vegetables"));
//!
//! let mut view = TreeView::new(graph, vec![fruit, veg]).unwrap();
//! // Right expands the collapsed branch.
//! let events = view.handle_key(&TreeKey::new("1"), TreeKeyCode::Right);
//! assert_eq!(events, vec![TreeEvent::Expanded(TreeKey::new("1"))]);
//! // Down now reaches the revealed child.
//! let events = view.handle_key(&TreeKey::new("1"), TreeKeyCode::Down);
//! assert!(events.contains(&TreeEvent::Focus(TreeKey::new("1.1"))));
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::data::{LabelPolicy, TreeData, TreeItemIndex, TreeNode};
use crate::error::TreeError;
use crate::types::{SourceId, TreeKey, TreeSource, TreeSourceMut};

/// Keys the tree view reacts to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TreeKeyCode {
    /// Previous visible item.
    Up,
    /// Next visible item.
    Down,
    /// First item.
    Home,
    /// Last visible item.
    End,
    /// Expand the branch.
    Right,
    /// Collapse the branch, or move to the parent and collapse it.
    Left,
}

/// Which part of an item was clicked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    /// The expand/collapse chevron.
    Chevron,
    /// The label.
    Label,
}

/// Notification produced by the controller for the embedding view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    /// An enabled item was chosen.
    Select {
        /// The item's name.
        name: String,
    },
    /// Move keyboard focus to the item.
    Focus(TreeKey),
    /// Remove keyboard focus from the item.
    Unfocus(TreeKey),
    /// The branch was expanded.
    Expanded(TreeKey),
    /// The branch was collapsed.
    Collapsed(TreeKey),
}

/// Keyboard and click controller owning a [`TreeSourceMut`] and its parsed [`TreeData`].
pub struct TreeView<S> {
    source: S,
    roots: Vec<SourceId>,
    policy: LabelPolicy,
    data: TreeData,
    root: TreeNode,
    current: Option<TreeKey>,
}

impl<S> fmt::Debug for TreeView<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeView")
            .field("roots", &self.roots.len())
            .field("data", &self.data)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<S: TreeSourceMut> TreeView<S> {
    /// Parse `roots` from `source` with [`LabelPolicy::Skip`].
    pub fn new(source: S, roots: Vec<SourceId>) -> Result<Self, TreeError> {
        Self::with_policy(source, roots, LabelPolicy::Skip)
    }

    /// Parse `roots` from `source` with an explicit label policy.
    pub fn with_policy(
        source: S,
        roots: Vec<SourceId>,
        policy: LabelPolicy,
    ) -> Result<Self, TreeError> {
        let mut data = TreeData::new();
        let root = data.parse(&source, &roots, policy)?;
        let mut view = Self {
            source,
            roots,
            policy,
            data,
            root,
            current: None,
        };
        view.sync_current_focused();
        Ok(view)
    }

    /// Replace the top-level items and re-parse, keeping the focused key when it survives.
    pub fn set_items(&mut self, roots: Vec<SourceId>) -> Result<(), TreeError> {
        self.roots = roots;
        self.normalize()
    }

    /// Re-parse the current roots, for example after the source changed.
    pub fn normalize(&mut self) -> Result<(), TreeError> {
        self.root = self.data.parse(&self.source, &self.roots, self.policy)?;
        self.sync_current_focused();
        Ok(())
    }

    /// The item source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The parsed, flattened data.
    pub fn data(&self) -> &TreeData {
        &self.data
    }

    /// The parsed tree, rooted at the synthetic `"0"` node.
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Key of the item that owns the tab stop.
    pub fn current(&self) -> Option<&TreeKey> {
        self.current.as_ref()
    }

    /// Fall back to the first top-level item when the focused item no longer exists.
    pub fn sync_current_focused(&mut self) {
        if self.data.is_empty() {
            self.current = None;
            return;
        }
        let valid = self
            .current
            .as_ref()
            .is_some_and(|key| self.data.is_valid_current(key));
        if !valid {
            self.current = Some(TreeKey::new("1"));
        }
        if let Some(key) = self.current.clone() {
            if let Some(index) = self.data.find_index(&key) {
                let _ = self.data.update_current_focused_index(index);
            }
            self.data.update_current_focused_child(&key);
        }
    }

    /// React to a key pressed while `key` has focus.
    pub fn handle_key(&mut self, key: &TreeKey, code: TreeKeyCode) -> Vec<TreeEvent> {
        let mut out = Vec::new();
        match code {
            TreeKeyCode::Up => {
                let target = self.data.find_prev_to_focus().cloned();
                self.focus_item(target.as_ref(), &mut out);
            }
            TreeKeyCode::Down => {
                let target = self.data.find_next_to_focus().cloned();
                self.focus_item(target.as_ref(), &mut out);
            }
            TreeKeyCode::Home => {
                let target = self.data.find_first_to_focus().cloned();
                self.focus_item(target.as_ref(), &mut out);
            }
            TreeKeyCode::End => {
                let target = self.data.find_last_to_focus().cloned();
                self.focus_item(target.as_ref(), &mut out);
            }
            TreeKeyCode::Right => self.expand_branch(key, &mut out),
            TreeKeyCode::Left => {
                let expanded_branch = self.data.item(key).is_some_and(|item| {
                    self.source.is_expanded(item.source)
                        && !self.source.children(item.source).is_empty()
                });
                if expanded_branch {
                    self.collapse_branch(key, &mut out);
                } else {
                    self.collapse_parent(key, &mut out);
                }
            }
        }
        out
    }

    /// React to a click on part of the item `key`.
    pub fn handle_click(&mut self, key: &TreeKey, target: ClickTarget) -> Vec<TreeEvent> {
        let mut out = Vec::new();
        let Some(item) = self.data.item(key).cloned() else {
            return out;
        };
        match target {
            ClickTarget::Chevron => {
                if self.source.is_expanded(item.source) {
                    self.collapse_branch(key, &mut out);
                } else {
                    self.expand_branch(key, &mut out);
                }
            }
            ClickTarget::Label => {
                if !self.source.is_disabled(item.source) {
                    let name = self.source.name(item.source).unwrap_or_default();
                    out.push(TreeEvent::Select { name: name.into() });
                }
                self.focus_item(Some(&item), &mut out);
            }
        }
        out
    }

    fn is_branch(&self, id: SourceId) -> bool {
        !self.source.children(id).is_empty() && !self.source.is_disabled(id)
    }

    fn expand_branch(&mut self, key: &TreeKey, out: &mut Vec<TreeEvent>) {
        let Some(id) = self.data.item(key).map(|item| item.source) else {
            return;
        };
        if !self.is_branch(id) {
            return;
        }
        self.source.set_expanded(id, true);
        if let Some(node) = self.root.find_mut(key) {
            node.expanded = true;
        }
        if self.data.is_visible(key) {
            self.data.reveal_children(&self.source, key);
        }
        out.push(TreeEvent::Expanded(key.clone()));
    }

    fn collapse_branch(&mut self, key: &TreeKey, out: &mut Vec<TreeEvent>) {
        let Some(id) = self.data.item(key).map(|item| item.source) else {
            return;
        };
        if !self.is_branch(id) {
            return;
        }
        self.source.set_expanded(id, false);
        if let Some(node) = self.root.find_mut(key) {
            node.expanded = false;
        }
        self.data.update_visible_on_collapse(key);
        out.push(TreeEvent::Collapsed(key.clone()));
    }

    fn collapse_parent(&mut self, key: &TreeKey, out: &mut Vec<TreeEvent>) {
        let Some(item) = self.data.item(key) else {
            return;
        };
        if item.level <= 1 {
            return;
        }
        let Some(parent) = self.data.item(&item.parent).cloned() else {
            return;
        };
        self.collapse_branch(&parent.key, out);
        self.focus_item(Some(&parent), out);
    }

    fn focus_item(&mut self, item: Option<&TreeItemIndex>, out: &mut Vec<TreeEvent>) {
        let Some(item) = item else {
            return;
        };
        if let Some(current) = self.data.item_at(self.data.current_focused_index()) {
            out.push(TreeEvent::Unfocus(current.key.clone()));
        }
        if self.data.update_current_focused_index(item.index).is_some() {
            self.data.update_current_focused_child(&item.key);
            self.current = Some(item.key.clone());
            out.push(TreeEvent::Focus(item.key.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemGraph, TreeItemSpec};
    use alloc::vec;

    fn view() -> TreeView<ItemGraph> {
        let mut g = ItemGraph::new();
        let one = g.insert(TreeItemSpec::new("one").expanded(true));
        let _ = g.insert_child(one, TreeItemSpec::new("one.one"));
        let one_two = g.insert_child(one, TreeItemSpec::new("one.two").expanded(true));
        let _ = g.insert_child(one_two, TreeItemSpec::new("one.two.one"));
        let two = g.insert(TreeItemSpec::new("two").disabled(true));
        let _ = g.insert_child(two, TreeItemSpec::new("two.one"));
        let three = g.insert(TreeItemSpec::new("three").named("third"));
        TreeView::new(g, vec![one, two, three]).unwrap()
    }

    fn k(s: &str) -> TreeKey {
        TreeKey::new(s)
    }

    #[test]
    fn starts_focused_on_first_item() {
        let v = view();
        assert_eq!(v.current(), Some(&k("1")));
        assert_eq!(v.data().root_focused_child(), Some(0));
    }

    #[test]
    fn down_and_up_walk_visible_items() {
        let mut v = view();
        let events = v.handle_key(&k("1"), TreeKeyCode::Down);
        assert_eq!(events, vec![TreeEvent::Unfocus(k("1")), TreeEvent::Focus(k("1.1"))]);
        let _ = v.handle_key(&k("1.1"), TreeKeyCode::End);
        assert_eq!(v.current(), Some(&k("3")));
        let _ = v.handle_key(&k("3"), TreeKeyCode::Up);
        assert_eq!(v.current(), Some(&k("2")), "disabled item is still focusable");
        let _ = v.handle_key(&k("2"), TreeKeyCode::Home);
        assert_eq!(v.current(), Some(&k("1")));
    }

    #[test]
    fn left_collapses_then_moves_to_parent() {
        let mut v = view();
        let _ = v.handle_key(&k("1"), TreeKeyCode::Down);
        let _ = v.handle_key(&k("1.1"), TreeKeyCode::Down);
        assert_eq!(v.current(), Some(&k("1.2")));

        let events = v.handle_key(&k("1.2"), TreeKeyCode::Left);
        assert_eq!(events, vec![TreeEvent::Collapsed(k("1.2"))]);
        assert!(!v.data().is_visible(&k("1.2.1")));

        // Collapsed branch: collapse the parent and focus it.
        let events = v.handle_key(&k("1.2"), TreeKeyCode::Left);
        assert!(events.contains(&TreeEvent::Collapsed(k("1"))));
        assert_eq!(v.current(), Some(&k("1")));
        assert!(!v.data().is_visible(&k("1.1")));

        // Top level items have no parent to collapse.
        let events = v.handle_key(&k("1"), TreeKeyCode::Left);
        assert!(events.is_empty(), "nothing happens at level one");
    }

    #[test]
    fn right_reveals_nested_expanded_children() {
        let mut v = view();
        let _ = v.handle_key(&k("1"), TreeKeyCode::Left);
        assert!(!v.data().is_visible(&k("1.2.1")));
        let events = v.handle_key(&k("1"), TreeKeyCode::Right);
        assert_eq!(events, vec![TreeEvent::Expanded(k("1"))]);
        assert!(v.data().is_visible(&k("1.2.1")), "1.2 stayed expanded");
        assert!(v.root().find(&k("1")).unwrap().expanded);
    }

    #[test]
    fn disabled_branches_do_not_toggle() {
        let mut v = view();
        let events = v.handle_click(&k("2"), ClickTarget::Chevron);
        assert!(events.is_empty(), "disabled branch ignores the chevron");
        let id = v.data().item(&k("2")).unwrap().source;
        assert!(!v.source().is_expanded(id));
    }

    #[test]
    fn label_click_selects_and_focuses() {
        let mut v = view();
        let events = v.handle_click(&k("3"), ClickTarget::Label);
        assert_eq!(
            events,
            vec![
                TreeEvent::Select {
                    name: "third".into()
                },
                TreeEvent::Unfocus(k("1")),
                TreeEvent::Focus(k("3")),
            ]
        );
        let events = v.handle_click(&k("2"), ClickTarget::Label);
        assert!(
            !events.iter().any(|e| matches!(e, TreeEvent::Select { .. })),
            "disabled items do not select"
        );
    }

    #[test]
    fn focus_falls_back_after_reparse() {
        let mut v = view();
        let _ = v.handle_key(&k("1"), TreeKeyCode::End);
        assert_eq!(v.current(), Some(&k("3")));
        let first = v.data().item(&k("1")).unwrap().source;
        v.set_items(vec![first]).unwrap();
        assert_eq!(v.current(), Some(&k("1")));
    }
}
