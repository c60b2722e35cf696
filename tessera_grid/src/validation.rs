// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row and table validation errors supplied by the application.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::state::GridState;

/// Errors attached to one row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowError {
    /// Summary shown in the row-number cell tooltip.
    pub title: Option<String>,
    /// Individual messages.
    pub messages: Vec<String>,
    /// Fields whose cells are flagged.
    pub field_names: Vec<String>,
}

/// Errors attached to the whole table, shown in the bottom bar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableError {
    /// Summary.
    pub title: Option<String>,
    /// Individual messages.
    pub messages: Vec<String>,
}

/// The `errors` configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableErrors {
    /// Per-row errors, by row key.
    pub rows: HashMap<String, RowError>,
    /// Table-level errors.
    pub table: TableError,
}

impl TableErrors {
    /// Whether `field_name` is flagged on row `row_key`.
    pub fn has_field_error(&self, row_key: &str, field_name: &str) -> bool {
        self.rows
            .get(row_key)
            .is_some_and(|e| e.field_names.iter().any(|f| f == field_name))
    }
}

/// Replaces the error set.
pub fn set_errors(state: &mut GridState, errors: TableErrors) {
    state.errors = errors;
}

/// Replaces the error set from loosely typed input. Undecodable input clears it.
pub fn set_errors_value(state: &mut GridState, value: &Value) {
    state.errors = if value.is_null() {
        TableErrors::default()
    } else {
        serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            error!(%err, "ignoring malformed errors configuration");
            TableErrors::default()
        })
    };
}

/// Errors of one row, if any.
pub fn row_error<'a>(state: &'a GridState, row_key: &str) -> Option<&'a RowError> {
    state.errors.rows.get(row_key)
}

/// Table-level errors.
pub fn table_error(state: &GridState) -> &TableError {
    &state.errors.table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_errors_fill_in_defaults() {
        let mut state = GridState::default();
        set_errors_value(
            &mut state,
            &json!({ "rows": { "a": { "title": "oops", "fieldNames": ["name"] } } }),
        );
        assert!(state.errors.has_field_error("a", "name"));
        assert!(!state.errors.has_field_error("a", "amount"));
        assert!(!state.errors.has_field_error("b", "name"));
        assert_eq!(table_error(&state), &TableError::default());
        assert_eq!(row_error(&state, "a").unwrap().title.as_deref(), Some("oops"));
    }

    #[test]
    fn malformed_errors_are_dropped() {
        let mut state = GridState::default();
        set_errors_value(&mut state, &json!({ "rows": { "a": { "fieldNames": [] } } }));
        set_errors_value(&mut state, &json!({ "rows": 3 }));
        assert!(state.errors.rows.is_empty());
    }
}
