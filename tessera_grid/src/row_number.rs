// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The row-number column.

use serde_json::{Value, json};

use crate::columns::Column;
use crate::resizer::{DEFAULT_MAX_COLUMN_WIDTH, adjust_columns_size, has_defined_column_widths};
use crate::state::GridState;
use crate::utils::{normalize_boolean, normalize_positive_integer};
use crate::validation::RowError;

/// Type name of the row-number column.
pub const ROW_NUMBER: &str = "rowNumber";

/// Narrowest the row-number column gets.
pub const ROW_NUMBER_MIN_WIDTH: u32 = 52;

const DIGIT_WIDTH: u32 = 10;
const CELL_PADDING: u32 = 12;
const ERROR_ICON_WIDTH: u32 = 20;

/// A fresh row-number column.
pub fn row_number_column() -> Column {
    let mut column = Column::new("", ROW_NUMBER);
    column.internal = true;
    column.sortable = false;
    column.resizable = false;
    column.initial_width = Some(ROW_NUMBER_MIN_WIDTH);
    column.min_width = ROW_NUMBER_MIN_WIDTH;
    column.max_width = DEFAULT_MAX_COLUMN_WIDTH;
    column
}

/// Shows or hides the row-number column. Callers re-run column normalization.
pub fn set_show_row_number_column(state: &mut GridState, value: &Value) {
    state.show_row_number_column = normalize_boolean(value);
}

/// Sets the number the first row counts from. Invalid input falls back to 0.
pub fn set_row_number_offset(state: &mut GridState, value: &Value) {
    state.row_number_offset = normalize_positive_integer("rowNumberOffset", value, 0);
}

/// Width that fits the largest row number of `rows` rows counted from `offset`.
pub fn adjusted_row_number_width(rows: usize, offset: u32) -> u32 {
    let largest = rows as u64 + u64::from(offset);
    let digits = u32::try_from(largest.to_string().len()).unwrap_or(u32::MAX);
    DIGIT_WIDTH * digits + CELL_PADDING + ERROR_ICON_WIDTH
}

/// Widens the row-number column to fit the current row count.
///
/// When widths were already laid out, a fresh layout pass runs against `available_width`.
pub fn adjust_row_number_column_width(state: &mut GridState, available_width: u32) {
    if !state.show_row_number_column {
        return;
    }
    let width = adjusted_row_number_width(state.rows.len(), state.row_number_offset);
    let Some(column) = state.columns.iter_mut().find(|c| c.type_name == ROW_NUMBER) else {
        return;
    };
    if column.initial_width == Some(width) {
        return;
    }
    column.initial_width = Some(width.max(column.min_width));
    if has_defined_column_widths(state) {
        adjust_columns_size(state, available_width);
    }
}

/// Error payload carried by a row-number cell.
///
/// `row_title` is the row's value in the scope column.
pub fn row_number_error(state: &GridState, row_error: Option<&RowError>, row_title: &str) -> Value {
    let (title, messages, field_count) = match row_error {
        Some(error) => (
            error.title.clone(),
            error.messages.clone(),
            if error.field_names.is_empty() {
                String::new()
            } else {
                error.field_names.len().to_string()
            },
        ),
        None => (None, Vec::new(), String::new()),
    };
    let alternative_text = state
        .labels
        .format_row_error(row_title, &field_count);
    json!({
        "title": title,
        "messages": messages,
        "alternativeText": alternative_text,
    })
}
