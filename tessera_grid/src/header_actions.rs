// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Header menus: customer actions, plus the built-in wrap/clip text toggle.

use serde::{Deserialize, Serialize};

use crate::columns::Column;
use crate::state::GridState;

/// Name of the internal action that wraps cell text.
pub const WRAP_TEXT_ACTION: &str = "wrap_text";
/// Name of the internal action that clips cell text.
pub const CLIP_TEXT_ACTION: &str = "clip_text";

const WRAPABLE_TYPES: &[&str] = &[
    "text", "number", "currency", "percent", "email", "date", "phone", "url", "location", "tree",
];

/// Whether columns of `type_name` offer the wrap/clip text toggle.
pub fn is_wrapable_type(type_name: &str) -> bool {
    WRAPABLE_TYPES.contains(&type_name)
}

/// One entry of a header menu.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderAction {
    /// Displayed label.
    pub label: String,
    /// Identifier handed back when the action is triggered.
    pub name: String,
    /// Tooltip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Check mark state, `None` for plain actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// Whether the action is greyed out.
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    pub disabled: bool,
    /// Leading icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
}

/// Which side of the header the menu opens towards.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MenuAlignment {
    /// Opens to the left edge of the header.
    #[default]
    Left,
    /// Opens to the right edge, used for the last column and before `action` columns.
    Right,
}

/// Header menu of a column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnActions {
    /// Side the menu opens towards.
    pub menu_alignment: MenuAlignment,
    /// Actions supplied with the column definition.
    pub customer_actions: Vec<HeaderAction>,
    /// Actions the grid handles itself.
    pub internal_actions: Vec<HeaderAction>,
}

/// Who handles a triggered header action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionType {
    /// The application, through a `headeraction` event.
    Customer,
    /// The grid.
    Internal,
}

fn wrap_text_actions(state: &mut GridState, column: &Column) -> Vec<HeaderAction> {
    let wrap = *state.wrap_text.entry(column.col_key.clone()).or_insert(false);
    if !is_wrapable_type(&column.type_name) {
        return Vec::new();
    }
    let action = |label: &str, name: &str, checked: bool| HeaderAction {
        label: label.to_owned(),
        name: name.to_owned(),
        title: Some(label.to_owned()),
        checked: Some(checked),
        ..HeaderAction::default()
    };
    vec![
        action(&state.labels.wrap_text, WRAP_TEXT_ACTION, wrap),
        action(&state.labels.clip_text, CLIP_TEXT_ACTION, !wrap),
    ]
}

/// Recomputes the menu of every column.
pub fn update_header_actions(state: &mut GridState) {
    let mut columns = core::mem::take(&mut state.columns);
    let count = columns.len();
    for index in 0..count {
        let alignment = if index + 1 == count || columns[index + 1].type_name == "action" {
            MenuAlignment::Right
        } else {
            MenuAlignment::Left
        };
        let internal_actions = wrap_text_actions(state, &columns[index]);
        let actions = &mut columns[index].actions;
        actions.menu_alignment = alignment;
        actions.internal_actions = internal_actions;
    }
    state.columns = columns;
}

/// Whether text in column `col_key` wraps.
pub fn is_wrap_text(state: &GridState, col_key: &str) -> bool {
    state.wrap_text.get(col_key).copied().unwrap_or(false)
}

/// Applies a triggered internal action. Returns whether the wrap state changed.
pub fn handle_internal_action(state: &mut GridState, action_name: &str, col_key: &str) -> bool {
    let wrap = match action_name {
        WRAP_TEXT_ACTION => true,
        CLIP_TEXT_ACTION => false,
        _ => return false,
    };
    if is_wrap_text(state, col_key) == wrap {
        return false;
    }
    let Some(index) = state.header_indexes.internal_index(col_key) else {
        return false;
    };
    state.wrap_text.insert(col_key.to_owned(), wrap);

    if let Some(column) = state.columns.get_mut(index.0) {
        for action in &mut column.actions.internal_actions {
            match action.name.as_str() {
                WRAP_TEXT_ACTION => action.checked = Some(wrap),
                CLIP_TEXT_ACTION => action.checked = Some(!wrap),
                _ => {}
            }
        }
    }
    for row in &mut state.rows {
        if let Some(cell) = row.cells.get_mut(index.0) {
            cell.wrap_text = wrap;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{ColumnIndexMap, ColumnDefinition, normalize_columns};
    use crate::registry::TypeRegistry;
    use serde_json::json;

    fn state() -> GridState {
        let mut state = GridState::default();
        state.hide_checkbox_column = true;
        state.user_columns = serde_json::from_value::<Vec<ColumnDefinition>>(json!([
            { "fieldName": "name", "actions": [{ "label": "Pin", "name": "pin" }] },
            { "fieldName": "flag", "type": "boolean" },
            { "type": "action" },
        ]))
        .unwrap();
        normalize_columns(&mut state, &TypeRegistry::new());
        update_header_actions(&mut state);
        state
    }

    #[test]
    fn alignment_turns_right_before_action_columns_and_at_the_end() {
        let state = state();
        let alignments: Vec<_> = state.columns.iter().map(|c| c.actions.menu_alignment).collect();
        assert_eq!(
            alignments,
            [MenuAlignment::Left, MenuAlignment::Right, MenuAlignment::Right]
        );
    }

    #[test]
    fn only_wrapable_columns_get_the_toggle() {
        let state = state();
        let names: Vec<_> = state.columns[0]
            .actions
            .internal_actions
            .iter()
            .map(|a| (a.name.as_str(), a.checked))
            .collect();
        assert_eq!(names, [("wrap_text", Some(false)), ("clip_text", Some(true))]);
        assert!(state.columns[1].actions.internal_actions.is_empty());
        assert_eq!(state.columns[0].actions.customer_actions[0].name, "pin");
        assert_eq!(state.wrap_text.get("flag-boolean"), Some(&false));
    }

    #[test]
    fn toggling_updates_state_and_checks_once() {
        let mut state = state();
        assert!(handle_internal_action(&mut state, WRAP_TEXT_ACTION, "name-text"));
        assert!(is_wrap_text(&state, "name-text"));
        assert!(!handle_internal_action(&mut state, WRAP_TEXT_ACTION, "name-text"));
        let checks: Vec<_> = state.columns[0]
            .actions
            .internal_actions
            .iter()
            .map(|a| a.checked)
            .collect();
        assert_eq!(checks, [Some(true), Some(false)]);
        assert!(!handle_internal_action(&mut state, "pin", "name-text"));
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let mut state = state();
        state.header_indexes = ColumnIndexMap::default();
        assert!(!handle_internal_action(&mut state, WRAP_TEXT_ACTION, "name-text"));
    }
}
