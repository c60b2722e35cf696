// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column normalization and the two column address spaces.
//!
//! User columns are expanded into the internal column list: the row-number column and the
//! selection checkbox column are prepended when enabled, defaults are merged under user fields,
//! and every column receives its key. The application addresses columns by *user* index, which
//! skips the prepended columns. [`ColumnIndexMap`] translates between the two and is rebuilt
//! whenever the column list is.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::header_actions::{ColumnActions, HeaderAction};
use crate::inline_edit::normalize_editable;
use crate::keys::col_key_value;
use crate::registry::{TypeRegistry, is_tree_type, is_valid_type_for_tree};
use crate::row_number::row_number_column;
use crate::selector::BulkSelection;
use crate::sort::{SortAriaLabel, SortDirection, update_column_sorting_state};
use crate::state::GridState;
use crate::utils::is_truthy_opt;

/// Type name of the internal selection checkbox column.
pub const SELECTABLE_CHECKBOX: &str = "SELECTABLE_CHECKBOX";

/// Width of the selection checkbox column.
pub const CHECKBOX_COLUMN_WIDTH: u32 = 32;

/// Fixed width given to `action` columns that do not set one.
pub const ACTION_COLUMN_WIDTH: u32 = 50;

/// A column as supplied by the embedding application.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnDefinition {
    /// Column type. Unknown types render as `text`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Row field displayed by the column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Header label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Whether the header offers sorting.
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    pub sortable: bool,
    /// Loosely typed editable flag, see [`normalize_editable`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable: Option<Value>,
    /// Type attributes. A value `{ "fieldName": f }` is read from row field `f`.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub type_attributes: Map<String, Value>,
    /// Cell attributes, resolved the same way as type attributes.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub cell_attributes: Map<String, Value>,
    /// Width before the user resizes the column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_width: Option<u32>,
    /// Width that neither layout nor resizing changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_width: Option<u32>,
    /// Whether the user may drag the column edge. Defaults to resizable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,
    /// Header menu actions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<HeaderAction>,
    /// Header icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
}

/// A normalized column in the internal column list.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Unique key, see [`col_key_value`].
    pub col_key: String,
    /// Normalized type name.
    pub type_name: String,
    /// Row field displayed by the column.
    pub field_name: Option<String>,
    /// Header label.
    pub label: Option<String>,
    /// Engine-injected column (row number or selection checkbox).
    pub internal: bool,
    /// First customer column, which acts as the row header for assistive technologies.
    pub is_scope_col: bool,
    /// Whether cells of this column can be edited inline.
    pub editable: bool,
    /// Whether the header offers sorting.
    pub sortable: bool,
    /// Whether the user may drag the column edge.
    pub resizable: bool,
    /// Raw type attributes.
    pub type_attributes: Map<String, Value>,
    /// Raw cell attributes.
    pub cell_attributes: Map<String, Value>,
    /// Width before any user resize, clamped into `[min_width, max_width]`.
    pub initial_width: Option<u32>,
    /// Width that neither layout nor resizing changes.
    pub fixed_width: Option<u32>,
    /// Lower resize bound.
    pub min_width: u32,
    /// Upper resize bound.
    pub max_width: u32,
    /// Width assigned by the last layout pass or resize.
    pub column_width: Option<u32>,
    /// Set once the user resized the column, which pins its width in later layouts.
    pub is_resized: bool,
    /// Inline width style, `"width:Npx"`.
    pub style: String,
    /// Header cell tab index.
    pub tab_index: i32,
    /// Whether this is the sorted column.
    pub sorted: bool,
    /// Live direction when sorted, default direction otherwise.
    pub sorted_direction: Option<SortDirection>,
    /// Accessible sort label, `None` for unsortable columns.
    pub sort_aria_label: Option<SortAriaLabel>,
    /// Header menu.
    pub actions: ColumnActions,
    /// Select-all state, only meaningful on the checkbox column.
    pub bulk_selection: BulkSelection,
    /// Whether select-all is disabled, only meaningful on the checkbox column.
    pub is_bulk_selection_disabled: bool,
    /// Header icon.
    pub icon_name: Option<String>,
}

impl Column {
    /// A bare column of the given type. Width bounds default to the global defaults.
    pub fn new(col_key: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            col_key: col_key.into(),
            type_name: type_name.into(),
            field_name: None,
            label: None,
            internal: false,
            is_scope_col: false,
            editable: false,
            sortable: false,
            resizable: true,
            type_attributes: Map::new(),
            cell_attributes: Map::new(),
            initial_width: None,
            fixed_width: None,
            min_width: crate::resizer::DEFAULT_MIN_COLUMN_WIDTH,
            max_width: crate::resizer::DEFAULT_MAX_COLUMN_WIDTH,
            column_width: None,
            is_resized: false,
            style: String::new(),
            tab_index: -1,
            sorted: false,
            sorted_direction: None,
            sort_aria_label: None,
            actions: ColumnActions::default(),
            bulk_selection: BulkSelection::None,
            is_bulk_selection_disabled: false,
            icon_name: None,
        }
    }

    /// Whether this is the selection checkbox column.
    pub fn is_checkbox(&self) -> bool {
        self.type_name == SELECTABLE_CHECKBOX
    }

    /// Whether this is a tree column.
    pub fn is_tree(&self) -> bool {
        is_tree_type(&self.type_name)
    }
}

/// Index of a column as seen by the application, internal columns excluded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserColumnIndex(pub usize);

/// Index of a column in the internal column list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternalColumnIndex(pub usize);

/// Bidirectional column address table, also serving as the header index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnIndexMap {
    by_key: HashMap<String, InternalColumnIndex>,
    user_of: Vec<Option<UserColumnIndex>>,
    internal_of: Vec<InternalColumnIndex>,
}

impl ColumnIndexMap {
    /// Builds the table for `columns`.
    pub fn new(columns: &[Column]) -> Self {
        let mut map = Self::default();
        for (index, column) in columns.iter().enumerate() {
            let internal = InternalColumnIndex(index);
            map.by_key.insert(column.col_key.clone(), internal);
            if column.internal {
                map.user_of.push(None);
            } else {
                map.user_of.push(Some(UserColumnIndex(map.internal_of.len())));
                map.internal_of.push(internal);
            }
        }
        map
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.user_of.len()
    }

    /// Whether there are no columns.
    pub fn is_empty(&self) -> bool {
        self.user_of.is_empty()
    }

    /// Whether a column with this key exists.
    pub fn contains(&self, col_key: &str) -> bool {
        self.by_key.contains_key(col_key)
    }

    /// Internal index of the column with this key.
    pub fn internal_index(&self, col_key: &str) -> Option<InternalColumnIndex> {
        self.by_key.get(col_key).copied()
    }

    /// User index of an internal position, `None` for internal columns.
    pub fn user_index(&self, index: InternalColumnIndex) -> Option<UserColumnIndex> {
        self.user_of.get(index.0).copied().flatten()
    }

    /// Internal position of a user index.
    pub fn internal_from_user(&self, index: UserColumnIndex) -> Option<InternalColumnIndex> {
        self.internal_of.get(index.0).copied()
    }
}

/// Whether any user column asks to be editable.
pub fn has_editable_column(columns: &[ColumnDefinition]) -> bool {
    columns.iter().any(|c| is_truthy_opt(c.editable.as_ref()))
}

fn checkbox_column() -> Column {
    let mut column = Column::new("", SELECTABLE_CHECKBOX);
    column.fixed_width = Some(CHECKBOX_COLUMN_WIDTH);
    column.min_width = CHECKBOX_COLUMN_WIDTH;
    column.max_width = CHECKBOX_COLUMN_WIDTH;
    column.internal = true;
    column.resizable = false;
    column
}

fn customer_column(state: &GridState, user: &ColumnDefinition, registry: &TypeRegistry) -> Column {
    let requested = user.type_name.as_deref().unwrap_or("text");
    let type_name = if registry.is_valid_type(requested) {
        requested
    } else {
        "text"
    };
    let is_action = type_name == "action";

    let mut column = Column::new("", type_name);
    column.field_name = user.field_name.clone();
    column.label = user.label.clone();
    column.sortable = user.sortable;
    column.type_attributes = user.type_attributes.clone();
    column.cell_attributes = user.cell_attributes.clone();
    column.initial_width = user.initial_width;
    column.fixed_width = user
        .fixed_width
        .or_else(|| is_action.then_some(ACTION_COLUMN_WIDTH));
    column.resizable = user.resizable.unwrap_or(!is_action);
    column.icon_name = user.icon_name.clone();
    column.actions.customer_actions = user.actions.clone();
    column.min_width = state.resizer.min_column_width;
    column.max_width = state.resizer.max_column_width;
    column.editable = normalize_editable(type_name, user.editable.as_ref());

    if is_tree_type(type_name) {
        let sub_type = column
            .type_attributes
            .get("subType")
            .and_then(Value::as_str)
            .filter(|s| is_valid_type_for_tree(s))
            .unwrap_or("text")
            .to_owned();
        column
            .type_attributes
            .insert("subType".into(), Value::String(sub_type));
        column
            .type_attributes
            .entry("subTypeAttributes")
            .or_insert_with(|| Value::Object(Map::new()));
    }

    update_column_sorting_state(&mut column, &state.sort);
    column
}

/// Rebuilds `state.columns` and `state.header_indexes` from `state.user_columns`.
pub fn normalize_columns(state: &mut GridState, registry: &TypeRegistry) {
    if state.user_columns.is_empty() {
        state.columns.clear();
        state.header_indexes = ColumnIndexMap::default();
        return;
    }

    let mut columns = Vec::with_capacity(state.user_columns.len() + 2);
    if state.show_row_number_column || has_editable_column(&state.user_columns) {
        columns.push(row_number_column());
    }
    if !state.hide_checkbox_column {
        columns.push(checkbox_column());
    }
    let first_column_for_readers = columns.len();
    columns.extend(
        state
            .user_columns
            .iter()
            .map(|user| customer_column(state, user, registry)),
    );

    for (index, column) in columns.iter_mut().enumerate() {
        column.col_key = col_key_value(column.field_name.as_deref(), &column.type_name, index);
        column.tab_index = -1;
        column.is_scope_col = index == first_column_for_readers;
    }

    state.header_indexes = ColumnIndexMap::new(&columns);
    state.columns = columns;
}

/// Internal index of the first column displaying `field_name`.
pub fn column_index_by_field_name(state: &GridState, field_name: &str) -> Option<usize> {
    state
        .columns
        .iter()
        .position(|c| c.field_name.as_deref() == Some(field_name))
}

/// Whether any column is a tree column.
pub fn has_tree_data_type(state: &GridState) -> bool {
    state.columns.iter().any(Column::is_tree)
}

/// The first tree column.
pub fn state_tree_column(state: &GridState) -> Option<&Column> {
    state.columns.iter().find(|c| c.is_tree())
}

/// User column definition behind an internal column index.
pub fn user_column_definition(
    state: &GridState,
    index: InternalColumnIndex,
) -> Option<&ColumnDefinition> {
    state
        .header_indexes
        .user_index(index)
        .and_then(|user| state.user_columns.get(user.0))
}
