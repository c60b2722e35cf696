// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative grid configuration.
//!
//! [`Options`] mirrors the public properties of the grid. Properties whose input is validated
//! leniently (numbers, booleans, key lists) are kept as raw JSON so they reach the same
//! clamp-and-warn paths as a property assignment would. Absent properties keep the grid's
//! defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GridError;
use crate::columns::ColumnDefinition;
use crate::rows::RowKeyPolicy;

/// A grid configuration document.
///
/// ```
/// use tessera_grid::Options;
///
/// let options = Options::from_json(r#"{
///     "keyField": "id",
///     "columns": [{ "label": "Name", "fieldName": "name" }],
///     "data": [{ "id": "1", "name": "Ada" }],
///     "maxRowSelection": 1
/// }"#).unwrap();
/// assert_eq!(options.columns.as_ref().map(Vec::len), Some(1));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Column definitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnDefinition>>,
    /// Row data, an array of objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Field holding each row's unique key. Must be a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_field: Option<Value>,
    /// Hides the selection checkbox column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_checkbox_column: Option<Value>,
    /// Shows the row-number column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_row_number_column: Option<Value>,
    /// Offset of the first row number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_number_offset: Option<Value>,
    /// Disables user column resizing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_column_disabled: Option<Value>,
    /// Global lower column width bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_column_width: Option<Value>,
    /// Global upper column width bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_column_width: Option<Value>,
    /// Keyboard resize step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_step: Option<Value>,
    /// Field the data is sorted by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted_by: Option<String>,
    /// `"asc"` or `"desc"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted_direction: Option<String>,
    /// `"asc"` or `"desc"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sort_direction: Option<String>,
    /// Asks for more rows when scrolling near the end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_infinite_loading: Option<Value>,
    /// Trigger distance of infinite loading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_more_offset: Option<Value>,
    /// Whether the application is loading rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_loading: Option<Value>,
    /// Selection cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_row_selection: Option<Value>,
    /// Keys of the selected rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_rows: Option<Value>,
    /// Row and table errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    /// Uncommitted edits, keyed by field name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_values: Option<Value>,
    /// Hides the header row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_table_header: Option<Value>,
    /// Suppresses the inline edit status bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_bottom_bar: Option<Value>,
    /// Treatment of duplicate row keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_key_policy: Option<RowKeyPolicy>,
}

impl Options {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses an already decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, GridError> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_fields_keep_their_raw_input() {
        let options = Options::from_value(json!({
            "minColumnWidth": "-4",
            "maxRowSelection": "two",
            "rowKeyPolicy": "strict",
        }))
        .unwrap();
        assert_eq!(options.min_column_width, Some(json!("-4")));
        assert_eq!(options.max_row_selection, Some(json!("two")));
        assert_eq!(options.row_key_policy, Some(RowKeyPolicy::Strict));
        assert!(options.columns.is_none(), "absent properties stay unset");
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(matches!(Options::from_json("{"), Err(GridError::Options(_))));
        assert!(
            matches!(Options::from_json(r#"{ "columns": 3 }"#), Err(GridError::Options(_))),
            "column definitions are structural"
        );
    }

    #[test]
    fn serializes_only_what_was_set() {
        let options = Options {
            sorted_by: Some("name".into()),
            ..Options::default()
        };
        assert_eq!(serde_json::to_value(&options).unwrap(), json!({ "sortedBy": "name" }));
    }
}
