// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column width layout and user resizing.
//!
//! A layout pass sorts columns into three groups:
//!
//! - *fixed*: columns with a `fixed_width`,
//! - *resized*: columns the user resized, or that declare an `initial_width`,
//! - *flexible*: everything else.
//!
//! Flexible columns share whatever width the fixed and resized columns leave over, each clamped
//! into the global `[min_column_width, max_column_width]`. With no flexible columns the table is
//! exactly as wide as its columns and never stretches.

use serde_json::Value;

use crate::columns::{Column, InternalColumnIndex};
use crate::state::GridState;
use crate::utils::{clamp, normalize_boolean, normalize_positive_integer};

/// Default lower bound of a customer column.
pub const DEFAULT_MIN_COLUMN_WIDTH: u32 = 50;
/// Default upper bound of a customer column.
pub const DEFAULT_MAX_COLUMN_WIDTH: u32 = 1000;
/// Default keyboard resize step.
pub const DEFAULT_RESIZE_STEP: u32 = 10;

/// Resizer slice of [`GridState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResizerState {
    /// Whether the user may resize columns at all.
    pub resize_column_disabled: bool,
    /// Width change per keyboard resize step.
    pub resize_step: u32,
    /// Assigned widths, parallel to the column list. Empty until the first layout pass.
    pub column_widths: Vec<u32>,
    /// Total table width.
    pub table_width: u32,
    /// Global lower bound of customer columns.
    pub min_column_width: u32,
    /// Global upper bound of customer columns.
    pub max_column_width: u32,
}

impl Default for ResizerState {
    fn default() -> Self {
        Self {
            resize_column_disabled: false,
            resize_step: DEFAULT_RESIZE_STEP,
            column_widths: Vec::new(),
            table_width: 0,
            min_column_width: DEFAULT_MIN_COLUMN_WIDTH,
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
        }
    }
}

/// Enables or disables user resizing.
pub fn set_resize_column_disabled(state: &mut GridState, value: &Value) {
    state.resizer.resize_column_disabled = normalize_boolean(value);
}

/// Sets the keyboard resize step. Invalid input falls back to [`DEFAULT_RESIZE_STEP`].
pub fn set_resize_step(state: &mut GridState, value: &Value) {
    state.resizer.resize_step =
        normalize_positive_integer("resizeStep", value, DEFAULT_RESIZE_STEP);
}

/// Sets the global lower bound and re-applies it to customer columns.
///
/// Invalid input falls back to [`DEFAULT_MIN_COLUMN_WIDTH`].
pub fn set_min_column_width(state: &mut GridState, value: &Value) {
    state.resizer.min_column_width =
        normalize_positive_integer("minColumnWidth", value, DEFAULT_MIN_COLUMN_WIDTH);
    update_column_widths_metadata(state);
}

/// Sets the global upper bound and re-applies it to customer columns.
///
/// Invalid input falls back to [`DEFAULT_MAX_COLUMN_WIDTH`].
pub fn set_max_column_width(state: &mut GridState, value: &Value) {
    state.resizer.max_column_width =
        normalize_positive_integer("maxColumnWidth", value, DEFAULT_MAX_COLUMN_WIDTH);
    update_column_widths_metadata(state);
}

/// Copies the global bounds onto customer columns and clamps their initial widths.
///
/// Internal columns keep their own bounds.
pub fn update_column_widths_metadata(state: &mut GridState) {
    let (min, max) = (state.resizer.min_column_width, state.resizer.max_column_width);
    for column in state.columns.iter_mut().filter(|c| !c.internal) {
        column.min_width = min;
        column.max_width = max;
        if let Some(initial) = column.initial_width.filter(|w| *w > 0) {
            column.initial_width = Some(clamp(initial, min, max));
        }
    }
}

/// Whether a layout pass has assigned widths.
pub fn has_defined_column_widths(state: &GridState) -> bool {
    !state.resizer.column_widths.is_empty()
}

/// Inline style for a width, empty for zero.
pub fn width_style(width: u32) -> String {
    if width > 0 {
        format!("width:{width}px")
    } else {
        String::new()
    }
}

/// Inline style for the table.
pub fn table_width_style(state: &GridState) -> String {
    width_style(state.resizer.table_width)
}

fn width_from_definition(column: &Column) -> Option<u32> {
    column
        .fixed_width
        .filter(|w| *w > 0)
        .or_else(|| {
            column
                .column_width
                .filter(|w| column.is_resized && *w > 0)
        })
        .or_else(|| column.initial_width.filter(|w| *w > 0))
}

#[derive(Default)]
struct WidthsMeta {
    total_fixed_width: u32,
    total_resized_width: u32,
    fixed_number: u32,
    resized_number: u32,
    flexible_number: u32,
}

fn columns_width_meta(columns: &[Column]) -> WidthsMeta {
    let mut meta = WidthsMeta::default();
    for column in columns {
        if let Some(fixed) = column.fixed_width.filter(|w| *w > 0) {
            meta.fixed_number += 1;
            meta.total_fixed_width += fixed;
        } else if let Some(width) = column.column_width.filter(|w| column.is_resized && *w > 0) {
            meta.resized_number += 1;
            meta.total_resized_width += width;
        } else if let Some(initial) = column.initial_width.filter(|w| *w > 0) {
            meta.resized_number += 1;
            meta.total_resized_width += initial;
        } else {
            meta.flexible_number += 1;
        }
    }
    meta
}

/// Full layout pass against `available_width`, the width the host can give the table.
pub fn adjust_columns_size(state: &mut GridState, available_width: u32) {
    let min = state.resizer.min_column_width;
    let max = state.resizer.max_column_width;
    let meta = columns_width_meta(&state.columns);

    let min_expected_table_width =
        meta.flexible_number * min + meta.total_fixed_width + meta.total_resized_width;
    let expected_table_width = if meta.flexible_number == 0 {
        min_expected_table_width
    } else {
        min_expected_table_width.max(available_width)
    };
    let flex_width = if meta.flexible_number == 0 {
        min
    } else {
        let remaining =
            expected_table_width - meta.total_fixed_width - meta.total_resized_width;
        (remaining / meta.flexible_number).max(min).min(max)
    };

    let mut widths = Vec::with_capacity(state.columns.len());
    for column in &mut state.columns {
        let width = width_from_definition(column).unwrap_or(flex_width);
        column.column_width = Some(width);
        column.style = width_style(width);
        widths.push(width);
    }
    let sum: u32 = widths.iter().sum();
    state.resizer.column_widths = widths;
    state.resizer.table_width = expected_table_width.min(sum);
}

/// Sets a column to `width`, clamped into the column's own bounds.
///
/// Returns whether anything changed. A changed column is marked resized and keeps its width in
/// later layout passes.
pub fn resize_column(state: &mut GridState, index: InternalColumnIndex, width: u32) -> bool {
    let Some(column) = state.columns.get_mut(index.0) else {
        return false;
    };
    let Some(current) = state.resizer.column_widths.get(index.0).copied() else {
        return false;
    };
    let next = clamp(width, column.min_width, column.max_width);
    if next == current {
        return false;
    }
    let table = i64::from(state.resizer.table_width) + i64::from(next) - i64::from(current);
    state.resizer.table_width = u32::try_from(table.max(0)).unwrap_or(u32::MAX);
    state.resizer.column_widths[index.0] = next;
    column.column_width = Some(next);
    column.style = width_style(next);
    column.is_resized = true;
    true
}

/// [`resize_column`] expressed as a change relative to the current width.
pub fn resize_column_with_delta(
    state: &mut GridState,
    index: InternalColumnIndex,
    delta: i32,
) -> bool {
    let Some(current) = state.resizer.column_widths.get(index.0).copied() else {
        return false;
    };
    let target = (i64::from(current) + i64::from(delta)).max(0);
    resize_column(state, index, u32::try_from(target).unwrap_or(u32::MAX))
}

/// Widths of the customer columns, in user order.
pub fn customer_column_widths(state: &GridState) -> Vec<u32> {
    state
        .columns
        .iter()
        .zip(&state.resizer.column_widths)
        .filter(|(column, _)| !column.internal)
        .map(|(_, width)| *width)
        .collect()
}

/// Forgets all assigned widths.
pub fn reset_column_widths(state: &mut GridState) {
    state.resizer.column_widths.clear();
}
