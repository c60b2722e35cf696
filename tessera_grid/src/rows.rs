// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row and cell view models and the index that addresses them.
//!
//! [`update_rows_and_cell_indexes`] is a full rebuild: every row and cell is recomputed from the
//! data, the columns, and the selection, error, dirty-value and wrap-text slices. Keys held from
//! before a rebuild must be re-validated against [`GridState::indexes`] before use.

use std::collections::HashMap;

use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::GridError;
use crate::columns::{Column, state_tree_column};
use crate::inline_edit::dirty_value;
use crate::keys::{RowData, RowKeyGenerator};
use crate::registry::{TypeRegistry, is_tree_type, standard_attribute_names};
use crate::row_number::{ROW_NUMBER, row_number_error};
use crate::selector::{is_disabled_row, is_selected_row, row_selection_input_type};
use crate::state::GridState;
use crate::utils::{is_truthy, value_to_key};

bitflags! {
    /// Presentation classes of a row.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RowClass: u8 {
        /// Always present; lets cells react to row hover.
        const HINT_PARENT = 0b0000_0001;
        /// The row is selected.
        const SELECTED    = 0b0000_0010;
    }
}

impl Default for RowClass {
    fn default() -> Self {
        Self::HINT_PARENT
    }
}

impl RowClass {
    /// Classes of a row with the given selection state.
    pub fn for_selection(selected: bool) -> Self {
        let mut classes = Self::default();
        classes.set(Self::SELECTED, selected);
        classes
    }
}

bitflags! {
    /// Presentation classes of a cell.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CellClass: u8 {
        /// The column is editable.
        const EDITABLE  = 0b0000_0001;
        /// The cell renders a tree item.
        const TREE_ITEM = 0b0000_0010;
        /// The row's errors list this cell's field.
        const HAS_ERROR = 0b0000_0100;
        /// The cell shows an uncommitted edit.
        const EDITED    = 0b0000_1000;
    }
}

/// Selection control rendered in the checkbox column.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InputType {
    /// Multiple selection.
    #[default]
    Checkbox,
    /// Single selection.
    Radio,
}

/// How the indexer treats two rows with the same key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKeyPolicy {
    /// The later row silently replaces the earlier one in the index.
    #[default]
    Overwrite,
    /// The rebuild fails with [`GridError::DuplicateRowKey`].
    Strict,
}

/// Tree fields of a row, present only when a tree column exists.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowTreeState {
    /// 1-based depth.
    pub level: u32,
    /// 1-based position among siblings.
    pub pos_in_set: u32,
    /// Number of siblings.
    pub set_size: u32,
    /// Whether the row has children.
    pub has_children: bool,
    /// Expansion state, `None` for rows without children.
    pub is_expanded: Option<bool>,
}

impl Default for RowTreeState {
    /// A top-level leaf that is alone in its set.
    fn default() -> Self {
        Self {
            level: 1,
            pos_in_set: 1,
            set_size: 1,
            has_children: false,
            is_expanded: None,
        }
    }
}

/// Tree fields copied onto the cells of a tree column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellTreeState {
    /// Whether the row has children.
    pub has_children: bool,
    /// Whether the row is expanded.
    pub is_expanded: bool,
}

/// A cell view model. Its identity is `(row_key, col_key)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Key of the owning row.
    pub row_key: String,
    /// Key of the owning column.
    pub col_key: String,
    /// Column type.
    pub column_type: String,
    /// Column sub type, for tree columns.
    pub column_sub_type: Option<String>,
    /// Column label, repeated for narrow layouts.
    pub data_label: Option<String>,
    /// Displayed value: the dirty value when one exists, the row field otherwise.
    pub value: Option<Value>,
    /// Tab index, `0` only on the active cell.
    pub tab_index: i32,
    /// Whether this is a selection checkbox cell.
    pub is_checkbox: bool,
    /// Presentation classes.
    pub classes: CellClass,
    /// Whether the row's errors list this cell's field.
    pub has_error: bool,
    /// Registered type outside the scope column.
    pub is_data_type: bool,
    /// Registered type in the scope column.
    pub is_data_type_scope: bool,
    /// Whether the column wraps text.
    pub wrap_text: bool,
    /// Whether the column uses a custom type.
    pub is_custom_type: bool,
    /// Whether the cell can be edited inline.
    pub editable: bool,
    /// Whether the cell is marked for a pending mass edit.
    pub aria_selected: bool,
    /// Type attribute values, positional per the type's attribute list.
    pub type_attributes: Vec<Option<Value>>,
    /// Resolved cell attributes.
    pub cell_attributes: IndexMap<String, Option<Value>>,
    /// Tree state, on tree columns only.
    pub tree: Option<CellTreeState>,
}

/// A row view model.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// Unique key.
    pub key: String,
    /// Cells, parallel to the column list.
    pub cells: Vec<Cell>,
    /// Selection control.
    pub input_type: InputType,
    /// Whether the row is selected.
    pub is_selected: bool,
    /// Accessible selection state.
    pub aria_selected: bool,
    /// Whether selecting the row is currently blocked by the selection cap.
    pub is_disabled: bool,
    /// Presentation classes.
    pub classes: RowClass,
    /// Tab index, `0` only on the active row in row navigation mode.
    pub tab_index: i32,
    /// Tree state, when a tree column exists.
    pub tree: Option<RowTreeState>,
}

/// Index entry of one row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowIndexEntry {
    /// Position of the row.
    pub row_index: usize,
    /// `(row_index, col_index)` of each cell, by column key.
    pub cells: HashMap<String, (usize, usize)>,
}

impl RowIndexEntry {
    /// Position of the cell in column `col_key`.
    pub fn cell(&self, col_key: &str) -> Option<(usize, usize)> {
        self.cells.get(col_key).copied()
    }
}

/// Replaces the data.
pub fn set_data(state: &mut GridState, data: Vec<RowData>) {
    state.data = data;
}

/// Replaces the data from loosely typed input. Anything but an array yields no rows.
pub fn set_data_value(state: &mut GridState, value: &Value) {
    state.data = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_object().cloned().unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    };
}

/// Sets the field rows are keyed by.
///
/// A non-string value clears the key field and is reported as an error; rows then receive
/// synthetic keys.
pub fn set_key_field(state: &mut GridState, value: &Value) -> Result<(), GridError> {
    if let Value::String(field) = value {
        state.key_field = Some(field.clone());
        Ok(())
    } else {
        state.key_field = None;
        error!(%value, "keyField must be a string");
        Err(GridError::InvalidKeyField {
            found: value.to_string(),
        })
    }
}

/// Whether a key field is configured.
pub fn has_valid_key_field(state: &GridState) -> bool {
    state.key_field.is_some()
}

/// Position of the row with `key`.
pub fn row_index_by_key(state: &GridState, key: &str) -> Option<usize> {
    state.indexes.get(key).map(|entry| entry.row_index)
}

/// The row with `key`.
pub fn row_by_key<'a>(state: &'a GridState, key: &str) -> Option<&'a Row> {
    let index = row_index_by_key(state, key)?;
    state.rows.get(index)
}

/// The row with `key`, mutably.
pub fn row_by_key_mut<'a>(state: &'a mut GridState, key: &str) -> Option<&'a mut Row> {
    let index = row_index_by_key(state, key)?;
    state.rows.get_mut(index)
}

/// Whether a row with `key` exists.
pub fn row_key_exists(state: &GridState, key: &str) -> bool {
    state.indexes.contains_key(key)
}

/// Number of rows.
pub fn rows_total(state: &GridState) -> usize {
    state.rows.len()
}

/// Application data behind the row with `key`.
pub fn user_row_by_key<'a>(state: &'a GridState, key: &str) -> Option<&'a RowData> {
    let index = row_index_by_key(state, key)?;
    state.data.get(index)
}

/// Resolves an attribute value: `{ "fieldName": f }` reads field `f` of the row.
fn resolve_attribute_value(value: Option<&Value>, row: &RowData) -> Option<Value> {
    if let Some(Value::Object(object)) = value {
        if let Some(field) = object.get("fieldName").filter(|f| is_truthy(f)) {
            return row.get(&value_to_key(field)).cloned();
        }
    }
    value.cloned()
}

fn tree_number(value: Option<Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(1),
        Some(Value::String(s)) => s.parse().ok().filter(|n| *n > 0).unwrap_or(1),
        _ => 1,
    }
}

fn row_tree_state(column: &Column, row: &RowData) -> RowTreeState {
    let attr = |name: &str| resolve_attribute_value(column.type_attributes.get(name), row);
    let has_children = attr("hasChildren").is_some_and(|v| is_truthy(&v));
    RowTreeState {
        level: tree_number(attr("level")),
        pos_in_set: tree_number(attr("posInSet")),
        set_size: tree_number(attr("setSize")),
        has_children,
        is_expanded: has_children.then(|| attr("isExpanded").is_some_and(|v| is_truthy(&v))),
    }
}

fn sub_type_attributes(column: &Column, row: &RowData) -> Result<Vec<Option<Value>>, GridError> {
    let sub_type = column.type_attributes.get("subType");
    let names = sub_type
        .and_then(Value::as_str)
        .and_then(standard_attribute_names)
        .ok_or_else(|| GridError::UnknownType {
            name: sub_type.map(value_to_key).unwrap_or_default(),
        })?;
    let values = column
        .type_attributes
        .get("subTypeAttributes")
        .and_then(Value::as_object);
    Ok(names
        .iter()
        .map(|name| resolve_attribute_value(values.and_then(|v| v.get(*name)), row))
        .collect())
}

fn cell_type_attributes(
    column: &Column,
    row: &RowData,
    registry: &TypeRegistry,
) -> Result<Vec<Option<Value>>, GridError> {
    if column
        .type_attributes
        .get("subType")
        .is_some_and(is_truthy)
    {
        return sub_type_attributes(column, row);
    }
    Ok(registry
        .attribute_names(&column.type_name)?
        .into_iter()
        .map(|name| resolve_attribute_value(column.type_attributes.get(name), row))
        .collect())
}

/// Rebuilds `state.rows` and `state.indexes`.
///
/// On error the previous rows and indexes are kept.
pub fn update_rows_and_cell_indexes(
    state: &mut GridState,
    registry: &TypeRegistry,
) -> Result<(), GridError> {
    let mut keys = RowKeyGenerator::new(state.key_field.as_deref());
    let scope_field = state
        .columns
        .iter()
        .find(|c| registry.is_valid_type(&c.type_name) && c.is_scope_col)
        .and_then(|c| c.field_name.as_deref());
    let tree_column = state_tree_column(state);
    let input_type = row_selection_input_type(state);

    let mut rows = Vec::with_capacity(state.data.len());
    let mut indexes = HashMap::with_capacity(state.data.len());

    for (row_index, data) in state.data.iter().enumerate() {
        let key = keys.compute(data);
        if state.row_key_policy == RowKeyPolicy::Strict && indexes.contains_key(&key) {
            return Err(GridError::DuplicateRowKey { key, row_index });
        }
        let row_error = state.errors.rows.get(&key);
        let is_selected = is_selected_row(state, &key);
        let is_disabled = is_disabled_row(state, &key);
        let tree = tree_column.map(|column| row_tree_state(column, data));

        let mut entry = RowIndexEntry {
            row_index,
            cells: HashMap::with_capacity(state.columns.len()),
        };
        let mut cells = Vec::with_capacity(state.columns.len());

        for (col_index, column) in state.columns.iter().enumerate() {
            let dirty = dirty_value(state, &key, &column.col_key);
            let valid_type = registry.is_valid_type(&column.type_name);
            let has_error = column
                .field_name
                .as_deref()
                .is_some_and(|field| state.errors.has_field_error(&key, field));

            let mut classes = CellClass::empty();
            classes.set(CellClass::EDITABLE, column.editable);
            classes.set(CellClass::TREE_ITEM, is_tree_type(&column.type_name));
            classes.set(CellClass::HAS_ERROR, has_error);
            classes.set(CellClass::EDITED, dirty.is_some());

            let mut cell = Cell {
                row_key: key.clone(),
                col_key: column.col_key.clone(),
                column_type: column.type_name.clone(),
                column_sub_type: column
                    .type_attributes
                    .get("subType")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                data_label: column.label.clone(),
                value: match dirty {
                    Some(value) => Some(value.clone()),
                    None => column
                        .field_name
                        .as_deref()
                        .and_then(|field| data.get(field))
                        .cloned(),
                },
                tab_index: -1,
                is_checkbox: column.is_checkbox(),
                classes,
                has_error,
                is_data_type: valid_type && !column.is_scope_col,
                is_data_type_scope: valid_type && column.is_scope_col,
                wrap_text: state.wrap_text.get(&column.col_key).copied().unwrap_or(false),
                is_custom_type: registry.is_custom_type(&column.type_name),
                editable: false,
                aria_selected: false,
                type_attributes: Vec::new(),
                cell_attributes: IndexMap::new(),
                tree: None,
            };

            if !column.internal {
                cell.type_attributes = cell_type_attributes(column, data, registry)?;
                cell.cell_attributes = column
                    .cell_attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), resolve_attribute_value(Some(value), data)))
                    .collect();
                cell.editable = column.editable;
                if is_tree_type(&column.type_name) {
                    cell.tree = tree.map(|t| CellTreeState {
                        has_children: t.has_children,
                        is_expanded: t.is_expanded == Some(true),
                    });
                }
            } else if column.type_name == ROW_NUMBER {
                let title = scope_field
                    .and_then(|field| data.get(field))
                    .filter(|v| is_truthy(v))
                    .map(value_to_key)
                    .unwrap_or_default();
                cell.type_attributes = vec![Some(row_number_error(state, row_error, &title))];
            }

            entry
                .cells
                .insert(column.col_key.clone(), (row_index, col_index));
            cells.push(cell);
        }

        indexes.insert(key.clone(), entry);
        rows.push(Row {
            key,
            cells,
            input_type,
            is_selected,
            aria_selected: is_selected,
            is_disabled,
            classes: RowClass::for_selection(is_selected),
            tab_index: -1,
            tree,
        });
    }

    state.rows = rows;
    state.indexes = indexes;
    Ok(())
}
