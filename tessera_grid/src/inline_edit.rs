// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inline editing: dirty values and the edit panel session.
//!
//! Dirty values are uncommitted edits, keyed by row key and column key. They overlay the data
//! when rows are rebuilt and leave the grid as draft values keyed by field name.
//!
//! ## Session
//!
//! An edit session opens on a cell ([`open_inline_edit`]) and finishes with a [`FinishReason`].
//! Finishing takes two steps because the rows are rebuilt in between:
//!
//! 1. [`commit_inline_edit`] merges the panel's value into the dirty values and returns the
//!    changed drafts, if anything was saved.
//! 2. The caller rebuilds the rows when drafts were returned.
//! 3. [`conclude_inline_edit`] moves focus according to the reason and closes the panel.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{error, warn};

use crate::columns::{Column, column_index_by_field_name};
use crate::keyboard::{FocusEffect, react_to_tab_left, react_to_tab_right, set_focus_active_cell};
use crate::keys::RowData;
use crate::selector::{
    current_selection_length, is_selected_row, mark_deselected_cell, mark_selected_cell,
    selected_rows_keys,
};
use crate::state::GridState;
use crate::utils::{is_truthy_opt, value_to_key};
use crate::validation::TableErrors;

/// Types a cell can be edited as.
pub const EDITABLE_TYPES: [&str; 10] = [
    "text",
    "percent",
    "phone",
    "email",
    "url",
    "currency",
    "number",
    "boolean",
    "date-local",
    "date",
];

/// Scroll distance, in pixels, that closes an open panel.
pub const PANEL_SCROLL_THRESHOLD: f64 = 5.0;

/// Whether cells of `type_name` can be edited.
pub fn is_editable_type(type_name: &str) -> bool {
    EDITABLE_TYPES.contains(&type_name)
}

/// Resolves a column's `editable` flag.
///
/// Types that cannot be edited are never editable. Otherwise the value's truthiness decides,
/// so the string `"false"` enables editing.
pub fn normalize_editable(type_name: &str, editable: Option<&Value>) -> bool {
    is_editable_type(type_name) && is_truthy_opt(editable)
}

/// Why an edit session ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FinishReason {
    /// The user cancelled the edit.
    EditCanceled,
    /// The panel lost focus.
    LoosedFocus,
    /// Tab was pressed in the panel.
    TabPressedNext,
    /// Shift+Tab was pressed in the panel.
    TabPressedPrev,
    /// The panel was submitted.
    SubmitAction,
}

/// What the edit panel holds when a session ends.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelResult {
    /// The edited value.
    pub value: Option<Value>,
    /// Whether the panel's input passed validation.
    pub valid: bool,
    /// Whether "apply to all selected rows" was checked.
    pub mass_edit_checked: bool,
}

/// Scroll axis of the grid's scrollers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScrollAxis {
    /// Horizontal scroller.
    Horizontal,
    /// Vertical scroller.
    Vertical,
}

/// Inline edit slice of [`GridState`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InlineEditState {
    /// Uncommitted values, by row key then column key.
    pub dirty_values: IndexMap<String, IndexMap<String, Value>>,
    /// Whether the edit panel is shown.
    pub is_panel_visible: bool,
    /// Row of the edited cell.
    pub row_key: Option<String>,
    /// Column of the edited cell.
    pub col_key: Option<String>,
    /// Value the panel opened with.
    pub edited_value: Option<Value>,
    /// Number of selected rows when the panel opened.
    pub mass_edit_selected_rows: usize,
    /// Whether the edit may be applied to every selected row.
    pub mass_edit_enabled: bool,
    /// Column of the edited cell, as it was when the panel opened.
    pub column_def: Option<Column>,
    /// Horizontal scroll offset seen first while the panel is open.
    pub last_scroll_x: Option<f64>,
    /// Vertical scroll offset seen first while the panel is open.
    pub last_scroll_y: Option<f64>,
}

/// Dirty value of a cell.
pub fn dirty_value<'a>(state: &'a GridState, row_key: &str, col_key: &str) -> Option<&'a Value> {
    state.inline_edit.dirty_values.get(row_key)?.get(col_key)
}

fn row_changes_from_customer(state: &GridState, row: &RowData) -> IndexMap<String, Value> {
    row.iter()
        .filter(|(field, _)| state.key_field.as_deref() != Some(field.as_str()))
        .filter_map(|(field, value)| {
            let index = column_index_by_field_name(state, field)?;
            Some((state.columns[index].col_key.clone(), value.clone()))
        })
        .collect()
}

/// Replaces the dirty values with drafts keyed by field name.
///
/// Each draft names its row through the key field. Fields that no column displays are dropped,
/// and so are drafts without a key. Anything but an array clears the dirty values.
pub fn set_dirty_values(state: &mut GridState, value: &Value) {
    let drafts: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        Value::Null => &[],
        other => {
            error!(value = %other, "draftValues must be an array");
            &[]
        }
    };
    let Some(key_field) = state.key_field.clone() else {
        if !drafts.is_empty() {
            warn!(drafts = drafts.len(), "draftValues ignored, no keyField is set");
        }
        state.inline_edit.dirty_values.clear();
        return;
    };
    let dirty_values = drafts
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|row| {
            let key = row.get(&key_field).map(value_to_key)?;
            Some((key, row_changes_from_customer(state, row)))
        })
        .collect();
    state.inline_edit.dirty_values = dirty_values;
}

/// Translates internal changes to drafts keyed by field name, adding the key field.
///
/// Rows without any change are skipped. Without a key field the drafts carry no row key.
pub fn changes_for_customer(
    state: &GridState,
    changes: &IndexMap<String, IndexMap<String, Value>>,
) -> Vec<RowData> {
    let key_field = state.key_field.as_deref();
    if key_field.is_none() && !changes.is_empty() {
        warn!(rows = changes.len(), "no keyField is set, drafts carry no row key");
    }
    changes
        .iter()
        .filter_map(|(row_key, row_changes)| {
            let mut draft: RowData = row_changes
                .iter()
                .filter_map(|(col_key, value)| {
                    let index = state.header_indexes.internal_index(col_key)?;
                    let field = state.columns.get(index.0)?.field_name.clone()?;
                    Some((field, value.clone()))
                })
                .collect();
            if draft.is_empty() {
                return None;
            }
            if let Some(key_field) = key_field {
                draft.insert(key_field.to_owned(), Value::String(row_key.clone()));
            }
            Some(draft)
        })
        .collect()
}

/// All dirty values as drafts keyed by field name.
pub fn dirty_values_for_customer(state: &GridState) -> Vec<RowData> {
    changes_for_customer(state, &state.inline_edit.dirty_values)
}

/// Whether any edit is pending.
pub fn is_inline_edit_triggered(state: &GridState) -> bool {
    !state.inline_edit.dirty_values.is_empty()
}

/// Whether the bottom status bar should show.
pub fn show_status_bar(state: &GridState) -> bool {
    is_inline_edit_triggered(state) && !state.suppress_bottom_bar
}

/// Drops every pending edit and every error. Rows must be rebuilt afterwards.
pub fn cancel_inline_edit(state: &mut GridState) {
    state.inline_edit.dirty_values.clear();
    state.errors = TableErrors::default();
}

/// Current value of a cell, dirty value included.
pub fn cell_value<'a>(state: &'a GridState, row_key: &str, col_key: &str) -> Option<&'a Value> {
    let (row, col) = state.indexes.get(row_key)?.cell(col_key)?;
    state.rows.get(row)?.cells.get(col)?.value.as_ref()
}

fn is_valid_cell(state: &GridState, row_key: &str, col_key: &str) -> bool {
    state
        .indexes
        .get(row_key)
        .is_some_and(|entry| entry.cell(col_key).is_some())
}

/// Opens the panel on a cell.
///
/// The caller finishes a session that is already open before opening the next one.
pub fn open_inline_edit(state: &mut GridState, row_key: &str, col_key: &str) {
    let edited_value = cell_value(state, row_key, col_key).cloned();
    let column_def = state
        .header_indexes
        .internal_index(col_key)
        .and_then(|index| state.columns.get(index.0))
        .cloned();
    let selected = current_selection_length(state);
    let mass_edit_enabled = is_selected_row(state, row_key) && selected > 1;

    let edit = &mut state.inline_edit;
    edit.is_panel_visible = true;
    edit.row_key = Some(row_key.to_owned());
    edit.col_key = Some(col_key.to_owned());
    edit.edited_value = edited_value;
    edit.mass_edit_selected_rows = selected;
    edit.mass_edit_enabled = mass_edit_enabled;
    edit.column_def = column_def;
    edit.last_scroll_x = None;
    edit.last_scroll_y = None;

    mark_selected_cell(state, row_key, col_key);
}

/// Saves the panel's value into the dirty values, when the session allows it.
///
/// Nothing is saved when the edit was cancelled, when a mass edit lost focus, when the cell no
/// longer exists, when the panel is invalid, or when the value is unchanged and no mass edit was
/// requested. Returns the drafts of the changed rows.
pub fn commit_inline_edit(
    state: &mut GridState,
    reason: FinishReason,
    panel: &PanelResult,
) -> Option<Vec<RowData>> {
    let (row_key, col_key) = (
        state.inline_edit.row_key.clone()?,
        state.inline_edit.col_key.clone()?,
    );
    let should_save = reason != FinishReason::EditCanceled
        && !(state.inline_edit.mass_edit_enabled && reason == FinishReason::LoosedFocus)
        && is_valid_cell(state, &row_key, &col_key);
    if !should_save || !panel.valid {
        return None;
    }
    let changed = panel.value.as_ref() != cell_value(state, &row_key, &col_key);
    if !changed && !panel.mass_edit_checked {
        return None;
    }

    let value = panel.value.clone().unwrap_or(Value::Null);
    let mut changes: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();
    changes
        .entry(row_key)
        .or_default()
        .insert(col_key.clone(), value.clone());
    if panel.mass_edit_checked {
        for key in selected_rows_keys(state) {
            changes
                .entry(key)
                .or_default()
                .insert(col_key.clone(), value.clone());
        }
    }

    for (row_key, row_changes) in &changes {
        state
            .inline_edit
            .dirty_values
            .entry(row_key.clone())
            .or_default()
            .extend(row_changes.clone());
    }
    Some(changes_for_customer(state, &changes))
}

/// Moves focus as `reason` asks and closes the panel.
///
/// Losing focus leaves focus where it went. Tab moves to the neighbouring cell and every other
/// reason returns focus to the edited cell.
pub fn conclude_inline_edit(state: &mut GridState, reason: FinishReason) -> Vec<FocusEffect> {
    let mut effects = Vec::new();
    match reason {
        FinishReason::LoosedFocus => {}
        FinishReason::TabPressedNext => react_to_tab_right(state, &mut effects),
        FinishReason::TabPressedPrev => react_to_tab_left(state, &mut effects),
        FinishReason::EditCanceled | FinishReason::SubmitAction => {
            set_focus_active_cell(state, None, None, &mut effects);
        }
    }

    if let (Some(row_key), Some(col_key)) = (
        state.inline_edit.row_key.clone(),
        state.inline_edit.col_key.clone(),
    ) {
        for key in selected_rows_keys(state) {
            mark_deselected_cell(state, &key, &col_key);
        }
        mark_deselected_cell(state, &row_key, &col_key);
    }
    state.inline_edit.is_panel_visible = false;
    effects
}

/// Marks the edited column of every selected row while "apply to all" is checked.
pub fn handle_mass_checkbox_change(state: &mut GridState, checked: bool) {
    let (Some(row_key), Some(col_key)) = (
        state.inline_edit.row_key.clone(),
        state.inline_edit.col_key.clone(),
    ) else {
        return;
    };
    for key in selected_rows_keys(state) {
        if checked {
            mark_selected_cell(state, &key, &col_key);
        } else {
            mark_deselected_cell(state, &key, &col_key);
        }
    }
    if !checked {
        mark_selected_cell(state, &row_key, &col_key);
    }
}

/// Records a scroll while the panel is open.
///
/// The first offset seen on an axis is the reference. Returns `true` once the scroller moved
/// past [`PANEL_SCROLL_THRESHOLD`] from it; the caller then finishes the session with
/// [`FinishReason::LoosedFocus`].
pub fn panel_scrolled(state: &mut GridState, axis: ScrollAxis, position: f64) -> bool {
    let edit = &mut state.inline_edit;
    if !edit.is_panel_visible {
        return false;
    }
    let reference = match axis {
        ScrollAxis::Horizontal => &mut edit.last_scroll_x,
        ScrollAxis::Vertical => &mut edit.last_scroll_y,
    };
    let start = *reference.get_or_insert(position);
    if (position - start).abs() > PANEL_SCROLL_THRESHOLD {
        edit.last_scroll_x = None;
        edit.last_scroll_y = None;
        return true;
    }
    false
}
