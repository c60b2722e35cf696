// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use serde_json::{Value, json};

use crate::columns::normalize_columns;
use crate::header_actions::update_header_actions;
use crate::registry::TypeRegistry;
use crate::rows::{set_data_value, update_rows_and_cell_indexes};
use crate::selector::update_selection_state;
use crate::state::GridState;

/// Normalizes `columns`, loads `data` keyed by `id` and indexes it, after `configure` runs.
pub(crate) fn build_with(
    columns: Value,
    data: Value,
    configure: impl FnOnce(&mut GridState),
) -> GridState {
    let mut state = GridState::default();
    state.key_field = Some("id".into());
    configure(&mut state);
    state.user_columns = serde_json::from_value(columns).unwrap();
    set_data_value(&mut state, &data);
    normalize_columns(&mut state, &TypeRegistry::new());
    update_header_actions(&mut state);
    rebuild(&mut state);
    update_selection_state(&mut state);
    state
}

/// [`build_with`] without the checkbox column.
pub(crate) fn build(columns: Value, data: Value) -> GridState {
    build_with(columns, data, |state| state.hide_checkbox_column = true)
}

/// Re-runs the row indexer.
pub(crate) fn rebuild(state: &mut GridState) {
    update_rows_and_cell_indexes(state, &TypeRegistry::new()).unwrap();
}

/// Columns `name-text`, `amount-number`, `email-text`; rows `a`, `b`, `c`; no checkbox column.
pub(crate) fn fixture_state() -> GridState {
    build(fixture_columns(), fixture_rows())
}

pub(crate) fn fixture_columns() -> Value {
    json!([
        { "label": "Name", "fieldName": "name", "type": "text" },
        { "label": "Amount", "fieldName": "amount", "type": "number" },
        { "label": "Email", "fieldName": "email", "type": "text" },
    ])
}

pub(crate) fn fixture_rows() -> Value {
    json!([
        { "id": "a", "name": "Alpha", "amount": 10, "email": "a@example.com" },
        { "id": "b", "name": "Bravo", "amount": 20, "email": "b@example.com" },
        { "id": "c", "name": "Charlie", "amount": 30, "email": "c@example.com" },
    ])
}

/// Five rows `r0..r4` with the checkbox column, under `max_row_selection`.
pub(crate) fn selectable_state(max_row_selection: Option<u32>) -> GridState {
    let data: Vec<Value> = (0..5)
        .map(|i| json!({ "id": format!("r{i}"), "name": format!("Row {i}") }))
        .collect();
    build_with(json!([{ "fieldName": "name" }]), Value::Array(data), |state| {
        state.selection.max_row_selection = max_row_selection;
    })
}
