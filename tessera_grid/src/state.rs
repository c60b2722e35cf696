// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The grid state aggregate.

use std::collections::HashMap;

use crate::columns::{Column, ColumnDefinition, ColumnIndexMap};
use crate::infinite_loading::InfiniteLoadingState;
use crate::inline_edit::InlineEditState;
use crate::keyboard::KeyboardState;
use crate::keys::RowData;
use crate::resizer::ResizerState;
use crate::rows::{Row, RowIndexEntry, RowKeyPolicy};
use crate::selector::SelectionState;
use crate::sort::SortState;
use crate::validation::TableErrors;

/// Localizable strings the engine writes into its view models.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    /// Label of the "wrap text" header action.
    pub wrap_text: String,
    /// Label of the "clip text" header action.
    pub clip_text: String,
    /// Assistive text of a row-number error; `{0}` is the row title and `{1}` the error count.
    pub row_error_alternative_text: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            wrap_text: "Wrap text".into(),
            clip_text: "Clip text".into(),
            row_error_alternative_text: "Item {0} has {1} errors".into(),
        }
    }
}

impl Labels {
    /// Fills the row error template.
    pub fn format_row_error(&self, title: &str, count: &str) -> String {
        self.row_error_alternative_text
            .replace("{0}", title)
            .replace("{1}", count)
    }
}

/// Everything one grid instance knows.
///
/// Each engine module owns a slice (`selection`, `sort`, `resizer`, ...) and exposes free
/// functions over the whole aggregate. Derived data (`columns`, `rows`, `indexes`) is rebuilt
/// wholesale from the inputs (`user_columns`, `data`) and must not be read across a rebuild.
#[derive(Clone, Debug, Default)]
pub struct GridState {
    /// Field of the data rows holding their unique key.
    pub key_field: Option<String>,
    /// Application rows.
    pub data: Vec<RowData>,
    /// Application column definitions.
    pub user_columns: Vec<ColumnDefinition>,
    /// Normalized columns, internal ones first.
    pub columns: Vec<Column>,
    /// Column addressing table, rebuilt with `columns`.
    pub header_indexes: ColumnIndexMap,
    /// Row view models.
    pub rows: Vec<Row>,
    /// Cell positions, by row key.
    pub indexes: HashMap<String, RowIndexEntry>,
    /// What to do with duplicate row keys.
    pub row_key_policy: RowKeyPolicy,
    /// Whether the selection checkbox column is hidden.
    pub hide_checkbox_column: bool,
    /// Whether the row-number column is shown.
    pub show_row_number_column: bool,
    /// Number the first row counts from, minus one.
    pub row_number_offset: u32,
    /// Whether the header row is hidden.
    pub hide_table_header: bool,
    /// Whether the inline edit status bar is suppressed.
    pub suppress_bottom_bar: bool,
    /// Row selection.
    pub selection: SelectionState,
    /// Sorting.
    pub sort: SortState,
    /// Column widths.
    pub resizer: ResizerState,
    /// Focus and keyboard mode.
    pub keyboard: KeyboardState,
    /// Inline edit session and dirty values.
    pub inline_edit: InlineEditState,
    /// Infinite loading.
    pub infinite_loading: InfiniteLoadingState,
    /// Validation errors.
    pub errors: TableErrors,
    /// Wrap-text state, by column key.
    pub wrap_text: HashMap<String, bool>,
    /// Localizable strings.
    pub labels: Labels,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_an_unconfigured_grid() {
        let state = GridState::default();
        assert_eq!(state.resizer.min_column_width, 50);
        assert_eq!(state.resizer.max_column_width, 1000);
        assert_eq!(state.infinite_loading.load_more_offset, 20);
        assert_eq!(state.row_key_policy, RowKeyPolicy::Overwrite);
        assert!(state.keyboard.active_cell.is_none());
    }

    #[test]
    fn row_error_template_is_filled() {
        let labels = Labels::default();
        assert_eq!(labels.format_row_error("Acme", "3"), "Item Acme has 3 errors");
    }
}
