// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical rows on top of the grid.
//!
//! A tree grid takes nested row data, with children under [`CHILDREN_FIELD`], and a set of
//! expanded row keys. Only rows whose ancestors are all expanded are handed to the grid, each
//! annotated with its `level`, `posInSet`, `setSize`, `isExpanded` and, when it has a children
//! field, `hasChildren`. The first column becomes a `tree` column that reads those fields.
//!
//! Expansion changes come from the host (a toggle button, [`TreeGrid::expand_all`]) or from the
//! keyboard in row mode. The keyboard path reaches the grid's host as an internal toggle request,
//! which [`TreeGrid`] intercepts and applies before anything else runs.

use indexmap::IndexSet;
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::GridError;
use crate::columns::ColumnDefinition;
use crate::datatable::{Datatable, DatatableEvent, EventOutcome, GridHost};
use crate::infinite_loading::ScrollMetrics;
use crate::inline_edit::PanelResult;
use crate::keyboard::{FocusEffect, Key};
use crate::keys::{RowData, RowId};
use crate::registry::TREE_TYPE;
use crate::utils::value_to_key;

/// Row field holding the child rows.
pub const CHILDREN_FIELD: &str = "_children";

const TREE_STATE_FIELDS: [&str; 5] = ["hasChildren", "isExpanded", "level", "setSize", "posInSet"];

fn children(row: &RowData) -> Option<&[Value]> {
    row.get(CHILDREN_FIELD)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

fn has_children_content(row: &RowData) -> bool {
    children(row).is_some_and(|children| !children.is_empty())
}

fn row_key(row: &RowData, key_field: &str) -> Option<String> {
    row.get(key_field).map(value_to_key)
}

/// Flattens nested rows into display order.
///
/// Children of a row are emitted right after it when its key is in `expanded` and it has at least
/// one child. Keys in `expanded` that match no row are ignored. Entries that are not objects are
/// skipped.
pub fn flatten_tree_data(
    data: &[Value],
    expanded: &IndexSet<String>,
    key_field: &str,
) -> Vec<RowData> {
    let mut flattened = Vec::new();
    flatten_level(data, expanded, key_field, 1, &mut flattened);
    flattened
}

fn flatten_level(
    rows: &[Value],
    expanded: &IndexSet<String>,
    key_field: &str,
    level: u32,
    out: &mut Vec<RowData>,
) {
    let set_size = rows.len();
    for (index, row) in rows.iter().enumerate() {
        let Some(row) = row.as_object() else {
            continue;
        };
        let open = has_children_content(row)
            && row_key(row, key_field).is_some_and(|key| expanded.contains(&key));

        let mut flat = row.clone();
        flat.insert("level".into(), json!(level));
        flat.insert("posInSet".into(), json!(index + 1));
        flat.insert("setSize".into(), json!(set_size));
        flat.insert("isExpanded".into(), Value::Bool(open));
        if row.contains_key(CHILDREN_FIELD) {
            flat.insert("hasChildren".into(), Value::Bool(true));
        }
        out.push(flat);

        if open {
            if let Some(children) = children(row) {
                flatten_level(children, expanded, key_field, level + 1, out);
            }
        }
    }
}

/// Converts column definitions for a tree grid.
///
/// The first column becomes a `tree` column: its type moves to `subType`, its type attributes to
/// `subTypeAttributes`, and the tree state is read from the fields [`flatten_tree_data`] adds.
/// Other columns keep only what a tree grid supports, so they are neither sortable, editable nor
/// individually resizable.
pub fn normalize_tree_columns(columns: &[ColumnDefinition]) -> Vec<ColumnDefinition> {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            if index == 0 {
                tree_column(column)
            } else {
                ColumnDefinition {
                    sortable: false,
                    editable: None,
                    resizable: None,
                    ..column.clone()
                }
            }
        })
        .collect()
}

fn tree_column(column: &ColumnDefinition) -> ColumnDefinition {
    let mut type_attributes: Map<String, Value> = TREE_STATE_FIELDS
        .iter()
        .map(|field| ((*field).to_owned(), json!({ "fieldName": field })))
        .collect();
    type_attributes.insert(
        "subType".into(),
        Value::String(column.type_name.clone().unwrap_or_else(|| "text".into())),
    );
    type_attributes.insert(
        "subTypeAttributes".into(),
        Value::Object(column.type_attributes.clone()),
    );
    ColumnDefinition {
        type_name: Some(TREE_TYPE.into()),
        type_attributes,
        ..column.clone()
    }
}

/// Host wrapper that captures keyboard toggle requests.
#[derive(Debug)]
pub struct TreeGridHost<H> {
    inner: H,
    pending_toggles: Vec<(String, bool)>,
}

impl<H> TreeGridHost<H> {
    /// The wrapped host.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// The wrapped host, mutably.
    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }
}

impl<H: GridHost> GridHost for TreeGridHost<H> {
    fn available_width(&self) -> u32 {
        self.inner.available_width()
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        self.inner.scroll_metrics()
    }

    fn viewable_rect(&self) -> kurbo::Rect {
        self.inner.viewable_rect()
    }

    fn edit_panel(&self) -> PanelResult {
        self.inner.edit_panel()
    }

    fn dispatch(&mut self, event: DatatableEvent) -> EventOutcome {
        if let DatatableEvent::ToggleCell { name, next_state } = event {
            self.pending_toggles.push((name, next_state));
            return EventOutcome::Continue;
        }
        self.inner.dispatch(event)
    }
}

/// A grid over nested rows.
#[derive(Debug)]
pub struct TreeGrid<H: GridHost> {
    grid: Datatable<TreeGridHost<H>>,
    key_field: Option<String>,
    data: Vec<Value>,
    columns: Vec<ColumnDefinition>,
    expanded_rows: IndexSet<String>,
}

impl<H: GridHost> TreeGrid<H> {
    /// An empty tree grid.
    pub fn new(host: H) -> Self {
        let host = TreeGridHost {
            inner: host,
            pending_toggles: Vec::new(),
        };
        Self {
            grid: Datatable::new(host),
            key_field: None,
            data: Vec::new(),
            columns: Vec::new(),
            expanded_rows: IndexSet::new(),
        }
    }

    /// The underlying grid.
    pub fn datatable(&self) -> &Datatable<TreeGridHost<H>> {
        &self.grid
    }

    /// The underlying grid, for properties a tree grid does not wrap.
    ///
    /// Data and columns must go through [`set_data`](Self::set_data) and
    /// [`set_columns`](Self::set_columns). Keyboard handlers called here need a following
    /// [`apply_pending_toggles`](Self::apply_pending_toggles).
    pub fn datatable_mut(&mut self) -> &mut Datatable<TreeGridHost<H>> {
        &mut self.grid
    }

    /// The host.
    pub fn host(&self) -> &H {
        self.grid.host().inner()
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        self.grid.host_mut().inner_mut()
    }

    /// Sets the field rows are keyed by.
    pub fn set_key_field(&mut self, value: &Value) -> Result<(), GridError> {
        self.grid.set_key_field(value)?;
        self.key_field = self.grid.state().key_field.clone();
        self.refresh()
    }

    /// Replaces the column definitions.
    pub fn set_columns(&mut self, columns: Vec<ColumnDefinition>) -> Result<(), GridError> {
        self.columns = columns;
        self.grid.set_columns(normalize_tree_columns(&self.columns))
    }

    /// The column definitions, as supplied.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Replaces the nested data. Anything but an array yields no rows.
    pub fn set_data(&mut self, value: &Value) -> Result<(), GridError> {
        self.data = match value {
            Value::Array(rows) => rows.clone(),
            other => {
                error!(value = %other, "data must be an array of rows");
                Vec::new()
            }
        };
        self.refresh()
    }

    /// Replaces the set of expanded row keys.
    pub fn set_expanded_rows(&mut self, value: &Value) -> Result<(), GridError> {
        self.expanded_rows = match value {
            Value::Array(keys) => keys.iter().map(value_to_key).collect(),
            _ => IndexSet::new(),
        };
        self.refresh()
    }

    /// Expanded row keys, in the order they were expanded.
    pub fn expanded_rows(&self) -> Vec<String> {
        self.expanded_rows.iter().cloned().collect()
    }

    /// The nested row keyed `name`, anywhere in the tree.
    pub fn row_by_name(&self, name: &str) -> Option<&RowData> {
        let key_field = self.key_field.as_deref()?;
        find_row(&self.data, name, key_field)
    }

    /// Expands or collapses the row `name` and emits `toggle`.
    ///
    /// The event fires even for rows without children, so the host can fetch them lazily.
    pub fn toggle_row(&mut self, name: &str, is_expanded: bool) -> Result<(), GridError> {
        let Some(row) = self.row_by_name(name).cloned() else {
            debug!(name, "toggle for an unknown row");
            return Ok(());
        };
        if is_expanded {
            self.expanded_rows.insert(name.to_owned());
        } else {
            self.expanded_rows.shift_remove(name);
        }
        self.refresh()?;
        self.host_mut().dispatch(DatatableEvent::Toggle {
            name: name.to_owned(),
            is_expanded,
            has_children_content: has_children_content(&row),
            row,
        });
        Ok(())
    }

    /// Expands every row that has children and emits `toggleall`.
    pub fn expand_all(&mut self) -> Result<(), GridError> {
        let mut expanded = IndexSet::new();
        if let Some(key_field) = self.key_field.as_deref() {
            collect_parents(&self.data, key_field, &mut expanded);
        }
        self.expanded_rows = expanded;
        self.refresh()?;
        self.host_mut()
            .dispatch(DatatableEvent::ToggleAll { is_expanded: true });
        Ok(())
    }

    /// Collapses every row and emits `toggleall`.
    pub fn collapse_all(&mut self) -> Result<(), GridError> {
        self.expanded_rows.clear();
        self.refresh()?;
        self.host_mut()
            .dispatch(DatatableEvent::ToggleAll { is_expanded: false });
        Ok(())
    }

    /// Applies toggles the keyboard requested.
    pub fn apply_pending_toggles(&mut self) -> Result<(), GridError> {
        let pending = core::mem::take(&mut self.grid.host_mut().pending_toggles);
        for (name, is_expanded) in pending {
            self.toggle_row(&name, is_expanded)?;
        }
        Ok(())
    }

    /// A key was pressed while the row `row_key` had focus. Returns whether it was consumed.
    pub fn handle_row_keydown(&mut self, row_key: &str, key: Key) -> Result<bool, GridError> {
        let consumed = self.grid.handle_row_keydown(row_key, key);
        self.apply_pending_toggles()?;
        Ok(consumed)
    }

    /// A key was pressed inside the cell `row`/`col_key`. Returns whether it was consumed.
    pub fn handle_cell_keydown(
        &mut self,
        row: &RowId,
        col_key: &str,
        key: Key,
    ) -> Result<bool, GridError> {
        let consumed = self.grid.handle_cell_keydown(row, col_key, key);
        self.apply_pending_toggles()?;
        Ok(consumed)
    }

    /// A key was pressed while a cell wrapper had focus. Returns whether it was consumed.
    pub fn handle_table_keydown(&mut self, key: Key) -> Result<bool, GridError> {
        let consumed = self.grid.handle_table_keydown(key);
        self.apply_pending_toggles()?;
        Ok(consumed)
    }

    /// Runs the grid's post-render work.
    pub fn after_render(&mut self) -> Vec<FocusEffect> {
        self.grid.after_render()
    }

    fn refresh(&mut self) -> Result<(), GridError> {
        let Some(key_field) = self.key_field.as_deref() else {
            return Ok(());
        };
        let rows = flatten_tree_data(&self.data, &self.expanded_rows, key_field);
        let rows = Value::Array(rows.into_iter().map(Value::Object).collect());
        self.grid.set_data(&rows)
    }
}

fn find_row<'a>(rows: &'a [Value], name: &str, key_field: &str) -> Option<&'a RowData> {
    rows.iter().filter_map(Value::as_object).find_map(|row| {
        if row_key(row, key_field).as_deref() == Some(name) {
            return Some(row);
        }
        children(row).and_then(|children| find_row(children, name, key_field))
    })
}

fn collect_parents(rows: &[Value], key_field: &str, out: &mut IndexSet<String>) {
    for row in rows.iter().filter_map(Value::as_object) {
        if let Some(children) = children(row).filter(|c| !c.is_empty()) {
            if let Some(key) = row_key(row, key_field) {
                out.insert(key);
            }
            collect_parents(children, key_field, out);
        }
    }
}
