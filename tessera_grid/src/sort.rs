// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sort annotation of columns.
//!
//! The grid never sorts data itself. It records which field the application sorted by and in
//! which direction, and projects that onto every column for the header renderer.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::GridError;
use crate::columns::Column;
use crate::state::GridState;

/// Direction of a sort.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// `"asc"` or `"desc"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(GridError::InvalidSortDirection {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accessible sort label of a column header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortAriaLabel {
    /// Sorted ascending.
    Ascending,
    /// Sorted descending.
    Descending,
    /// Sortable but not the sorted column.
    None,
}

/// Sort slice of [`GridState`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortState {
    /// Field name the data is sorted by.
    pub sorted_by: Option<String>,
    /// Direction the data is sorted in.
    pub sorted_direction: Option<SortDirection>,
    /// Direction offered on sortable columns that are not currently sorted.
    pub default_sort_direction: SortDirection,
}

/// Records the sorted field.
pub fn set_sorted_by(state: &mut GridState, value: Option<&str>) {
    state.sort.sorted_by = value.map(str::to_owned);
}

/// Records the sorted direction. Anything but `"asc"` or `"desc"` is rejected.
pub fn set_sorted_direction(state: &mut GridState, value: &str) -> Result<(), GridError> {
    state.sort.sorted_direction = Some(value.parse()?);
    Ok(())
}

/// Records the default direction. Anything but `"asc"` or `"desc"` is rejected.
pub fn set_default_sort_direction(state: &mut GridState, value: &str) -> Result<(), GridError> {
    state.sort.default_sort_direction = value.parse()?;
    Ok(())
}

/// Re-annotates every column from the current sort slice.
pub fn update_sorting(state: &mut GridState) {
    let sort = &state.sort;
    for column in &mut state.columns {
        update_column_sorting_state(column, sort);
    }
}

/// Annotates one column.
///
/// A column is sorted iff it is sortable and its field name equals `sorted_by`.
pub fn update_column_sorting_state(column: &mut Column, sort: &SortState) {
    let is_sorted = column.sortable
        && column.field_name.is_some()
        && column.field_name == sort.sorted_by;
    if is_sorted {
        let direction = sort.sorted_direction;
        column.sorted = true;
        column.sort_aria_label = Some(if direction == Some(SortDirection::Desc) {
            SortAriaLabel::Descending
        } else {
            SortAriaLabel::Ascending
        });
        column.sorted_direction = direction;
    } else {
        column.sorted = false;
        column.sort_aria_label = column.sortable.then_some(SortAriaLabel::None);
        column.sorted_direction = Some(sort.default_sort_direction);
    }
}
