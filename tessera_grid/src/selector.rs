// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row selection.
//!
//! ## Selection cap
//!
//! `max_row_selection` bounds how many rows may be selected:
//!
//! - `None`: unlimited, rows render checkboxes.
//! - `Some(1)`: radio semantics. Selecting a row replaces the previous one and rows are never
//!   disabled.
//! - `Some(n)` with `n > 1`: once `n` rows are selected, every other row is disabled until one is
//!   deselected.
//! - `Some(0)`: nothing can be selected.
//!
//! ## Tombstones
//!
//! Deselecting keeps the key in [`SelectionState::selected_rows_keys`] with value `false`.
//! Always filter on the value, never on key presence.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::{error, warn};

use crate::keys::{RowData, RowId};
use crate::rows::{InputType, Row, RowClass, row_by_key_mut, row_index_by_key};
use crate::state::GridState;
use crate::utils::{parse_positive_integer, value_to_key};

/// Selection slice of [`GridState`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Selected keys in selection order, with tombstones.
    pub selected_rows_keys: IndexMap<String, bool>,
    /// Selection cap.
    pub max_row_selection: Option<u32>,
    /// Anchor of shift-click ranges.
    pub last_selected_row: Option<RowId>,
}

/// Select-all checkbox state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BulkSelection {
    /// Nothing selected.
    #[default]
    None,
    /// As many rows selected as the cap (or the row count) allows.
    All,
    /// Anything in between.
    Some,
}

fn cap_len(max: u32) -> usize {
    usize::try_from(max).unwrap_or(usize::MAX)
}

fn set_row_selected(row: &mut Row, selected: bool) {
    if selected {
        row.is_disabled = false;
    }
    row.is_selected = selected;
    row.aria_selected = selected;
    row.classes = RowClass::for_selection(selected);
}

/// Selected row keys, in selection order.
pub fn selected_rows_keys(state: &GridState) -> Vec<String> {
    state
        .selection
        .selected_rows_keys
        .iter()
        .filter(|(_, selected)| **selected)
        .map(|(key, _)| key.clone())
        .collect()
}

/// Number of selected rows.
pub fn current_selection_length(state: &GridState) -> usize {
    state
        .selection
        .selected_rows_keys
        .values()
        .filter(|selected| **selected)
        .count()
}

/// Whether `key` is selected.
pub fn is_selected_row(state: &GridState, key: &str) -> bool {
    state.selection.selected_rows_keys.get(key) == Some(&true)
}

/// Whether the unselected row `key` is blocked because the cap is reached.
pub fn is_disabled_row(state: &GridState, key: &str) -> bool {
    if is_selected_row(state, key) {
        return false;
    }
    match state.selection.max_row_selection {
        Some(1) | None => false,
        Some(max) => current_selection_length(state) == cap_len(max),
    }
}

/// Radio for a cap of one, checkbox otherwise.
pub fn row_selection_input_type(state: &GridState) -> InputType {
    if state.selection.max_row_selection == Some(1) {
        InputType::Radio
    } else {
        InputType::Checkbox
    }
}

/// Whether the select-all checkbox is hidden.
pub fn hide_select_all_checkbox(state: &GridState) -> bool {
    state.selection.max_row_selection == Some(1)
}

/// The cap, or the row count when unlimited.
fn effective_cap(state: &GridState) -> usize {
    match state.selection.max_row_selection {
        Some(max) if max > 0 => cap_len(max),
        _ => state.rows.len(),
    }
}

fn mark_deselected_rows_disabled(state: &mut GridState, disabled: bool) {
    let keys = &state.selection.selected_rows_keys;
    for row in &mut state.rows {
        if keys.get(&row.key) != Some(&true) {
            row.is_disabled = disabled;
        }
    }
}

/// Selects one row, enforcing the cap.
pub fn mark_row_selected(state: &mut GridState, key: &str) {
    if is_selected_row(state, key) {
        return;
    }
    let cap = effective_cap(state);
    let previous = current_selection_length(state);
    let Some(row) = row_by_key_mut(state, key) else {
        return;
    };
    set_row_selected(row, true);

    if cap > 1 {
        state.selection.selected_rows_keys.insert(key.to_owned(), true);
        if previous + 1 == cap {
            mark_deselected_rows_disabled(state, true);
        }
    } else {
        if previous == 1 {
            let replaced = state
                .selection
                .selected_rows_keys
                .iter()
                .find(|(_, selected)| **selected)
                .map(|(key, _)| key.clone());
            if let Some(previous_key) = replaced {
                if let Some(row) = row_by_key_mut(state, &previous_key) {
                    set_row_selected(row, false);
                }
            }
            state.selection.selected_rows_keys.clear();
        }
        state.selection.selected_rows_keys.insert(key.to_owned(), true);
    }
}

/// Deselects one row, re-enabling the others when it drops the count below the cap.
pub fn mark_row_deselected(state: &mut GridState, key: &str) {
    let Some(row) = row_by_key_mut(state, key) else {
        return;
    };
    set_row_selected(row, false);
    if let Some(selected) = state.selection.selected_rows_keys.get_mut(key) {
        *selected = false;
    }
    if let Some(max) = state.selection.max_row_selection.filter(|m| *m > 0) {
        if current_selection_length(state) == cap_len(max) - 1 {
            mark_deselected_rows_disabled(state, false);
        }
    }
}

fn last_row_selection(state: &GridState) -> Option<RowId> {
    state
        .selection
        .last_selected_row
        .clone()
        .filter(|id| id.key().is_some_and(|k| row_index_by_key(state, k).is_some()))
}

fn row_interval(state: &GridState, start: &RowId, end: &str) -> Option<(usize, usize)> {
    let start = match start {
        RowId::Header => 0,
        RowId::Row(key) => row_index_by_key(state, key)?,
    };
    let end = row_index_by_key(state, end)?;
    Some((start.min(end), start.max(end)))
}

fn interval_start(state: &GridState, key: &str, is_multiple: bool) -> RowId {
    if is_multiple {
        last_row_selection(state).unwrap_or_else(|| RowId::row(key))
    } else {
        RowId::row(key)
    }
}

/// Selects `key`, or the range from the last clicked row to `key` when `is_multiple`.
///
/// Range selection stops as soon as the cap is reached. A disabled row ignores the click.
pub fn handle_select_row(state: &mut GridState, key: &str, is_multiple: bool) {
    if state.selection.max_row_selection == Some(0) {
        return;
    }
    let from = interval_start(state, key, is_multiple);
    if let Some((start, end)) = row_interval(state, &from, key) {
        let cap = effective_cap(state);
        for index in start..=end {
            let row_key = state.rows[index].key.clone();
            if cap > 1 && !is_selected_row(state, &row_key) && current_selection_length(state) >= cap {
                break;
            }
            mark_row_selected(state, &row_key);
            if current_selection_length(state) >= cap {
                break;
            }
        }
    }
    state.selection.last_selected_row = Some(RowId::row(key));
}

/// Deselects `key`, or the range from the last clicked row to `key` when `is_multiple`.
pub fn handle_deselect_row(state: &mut GridState, key: &str, is_multiple: bool) {
    let from = interval_start(state, key, is_multiple);
    if let Some((start, end)) = row_interval(state, &from, key) {
        for index in start..=end {
            let row_key = state.rows[index].key.clone();
            mark_row_deselected(state, &row_key);
        }
    }
    state.selection.last_selected_row = Some(RowId::row(key));
}

/// Replaces the selection with `value`, an array of row keys.
///
/// Unknown and repeated keys are dropped, and keys beyond the cap are cut off with a warning.
/// Anything but an array clears the selection and is logged as an error.
pub fn set_selected_rows_keys(state: &mut GridState, value: &Value) {
    let Value::Array(items) = value else {
        error!(%value, "selectedRows must be an array of row keys");
        mark_all_rows_deselected(state);
        return;
    };
    let max = state.selection.max_row_selection.map(cap_len);
    let previous = current_selection_length(state);

    let mut selected: Vec<String> = items
        .iter()
        .map(value_to_key)
        .filter(|key| state.indexes.contains_key(key))
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect();
    if let Some(max) = max {
        if selected.len() > max {
            warn!(
                requested = selected.len(),
                max_row_selection = max,
                "selectedRows exceeds maxRowSelection, extra keys are ignored"
            );
            selected.truncate(max);
        }
    }

    let next: IndexMap<String, bool> = selected.iter().map(|k| (k.clone(), true)).collect();
    let deselect: Vec<String> = selected_rows_keys(state)
        .into_iter()
        .filter(|key| !next.contains_key(key))
        .collect();
    for key in &selected {
        if !is_selected_row(state, key) {
            if let Some(row) = row_by_key_mut(state, key) {
                set_row_selected(row, true);
            }
        }
    }
    for key in &deselect {
        if let Some(row) = row_by_key_mut(state, key) {
            set_row_selected(row, false);
        }
    }
    state.selection.selected_rows_keys = next;

    if let Some(max) = max {
        if selected.len() == max && max > 1 {
            mark_deselected_rows_disabled(state, true);
        } else if selected.len() < max && previous == max {
            mark_deselected_rows_disabled(state, false);
        }
    }
}

fn is_multi_selection(value: Option<u32>) -> bool {
    value.is_none_or(|v| v > 1)
}

/// Whether moving the cap from `previous` to `next` switches the input type or the disabled set.
pub fn input_type_needs_to_change(previous: Option<u32>, next: Option<u32>) -> bool {
    (previous == Some(1) && is_multi_selection(next))
        || (is_multi_selection(previous) && next == Some(1))
        || previous == Some(0)
        || next == Some(0)
}

/// Sets the cap. The current selection is always cleared first.
///
/// Invalid input resets the cap to unlimited and is logged as an error.
pub fn set_max_row_selection(state: &mut GridState, value: &Value) {
    mark_all_rows_deselected(state);
    match parse_positive_integer(value) {
        Some(max) => {
            let previous = state.selection.max_row_selection;
            state.selection.max_row_selection = Some(max);
            if input_type_needs_to_change(previous, Some(max)) {
                update_row_selection_input_type(state);
                update_selection_state(state);
            }
        }
        None => {
            state.selection.max_row_selection = None;
            error!(%value, "maxRowSelection must be a non-negative integer");
        }
    }
}

/// Clears the selection and re-derives input type and disabled flags of every row.
pub fn update_row_selection_input_type(state: &mut GridState) {
    let input_type = row_selection_input_type(state);
    state.selection.selected_rows_keys.clear();
    // With the selection cleared, only a zero cap blocks rows.
    let blocked = state.selection.max_row_selection == Some(0);
    for row in &mut state.rows {
        row.input_type = input_type;
        set_row_selected(row, false);
        row.is_disabled = blocked;
    }
}

/// Selects rows in data order up to the cap. Rows past the cap are disabled.
pub fn mark_all_rows_selected(state: &mut GridState) {
    let max = state.selection.max_row_selection.map(cap_len);
    state.selection.selected_rows_keys.clear();
    for (index, row) in state.rows.iter_mut().enumerate() {
        if max.is_none_or(|max| index < max) {
            set_row_selected(row, true);
            state
                .selection
                .selected_rows_keys
                .insert(row.key.clone(), true);
        } else {
            row.is_disabled = true;
            set_row_selected(row, false);
        }
    }
}

/// Clears the selection and enables every row.
pub fn mark_all_rows_deselected(state: &mut GridState) {
    state.selection.selected_rows_keys.clear();
    for row in &mut state.rows {
        row.is_disabled = false;
        set_row_selected(row, false);
    }
}

/// Reconciles the key map with the rows the view reports as selected.
///
/// Returns whether the map changed, in which case a `rowselection` event is due.
pub fn sync_selected_rows_keys(state: &mut GridState, selected_rows: &[RowData]) -> bool {
    let key_field = state.key_field.clone();
    let row_key = |row: &RowData| {
        key_field
            .as_deref()
            .and_then(|field| row.get(field))
            .map(value_to_key)
    };
    let keys = &state.selection.selected_rows_keys;
    let changed = keys.len() != selected_rows.len()
        || selected_rows
            .iter()
            .any(|row| row_key(row).is_none_or(|k| keys.get(&k) != Some(&true)));
    if changed {
        state.selection.selected_rows_keys = selected_rows
            .iter()
            .filter_map(row_key)
            .map(|k| (k, true))
            .collect();
    }
    update_selection_state(state);
    changed
}

/// State of the select-all checkbox.
pub fn bulk_selection_state(state: &GridState) -> BulkSelection {
    let selected = current_selection_length(state);
    if selected == 0 {
        BulkSelection::None
    } else if selected == effective_cap(state) {
        BulkSelection::All
    } else {
        BulkSelection::Some
    }
}

/// Whether the select-all checkbox is disabled.
pub fn is_bulk_selection_disabled(state: &GridState) -> bool {
    state.rows.is_empty() || state.selection.max_row_selection == Some(0)
}

/// Refreshes the select-all annotation on the checkbox column.
pub fn update_selection_state(state: &mut GridState) {
    let bulk = bulk_selection_state(state);
    let disabled = is_bulk_selection_disabled(state);
    if let Some(column) = state.columns.iter_mut().find(|c| c.is_checkbox()) {
        column.bulk_selection = bulk;
        column.is_bulk_selection_disabled = disabled;
    }
}

fn set_cell_aria_selected(state: &mut GridState, row_key: &str, col_key: &str, selected: bool) {
    let Some(col) = state.header_indexes.internal_index(col_key) else {
        return;
    };
    if let Some(cell) = row_by_key_mut(state, row_key).and_then(|row| row.cells.get_mut(col.0)) {
        cell.aria_selected = selected;
    }
}

/// Marks a cell as part of a pending mass edit.
pub fn mark_selected_cell(state: &mut GridState, row_key: &str, col_key: &str) {
    set_cell_aria_selected(state, row_key, col_key, true);
}

/// Clears the mass-edit mark of a cell.
pub fn mark_deselected_cell(state: &mut GridState, row_key: &str, col_key: &str) {
    set_cell_aria_selected(state, row_key, col_key, false);
}
