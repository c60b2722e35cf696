// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row and column identities.

use core::fmt;

use serde_json::{Map, Value};

use crate::utils::{is_truthy, value_to_key};

/// A data row as supplied by the embedding application.
pub type RowData = Map<String, Value>;

/// Identity of a row the keyboard can focus: the header row or a data row key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RowId {
    /// The header row.
    Header,
    /// A data row, by key.
    Row(String),
}

impl RowId {
    /// A data row id.
    pub fn row(key: impl Into<String>) -> Self {
        Self::Row(key.into())
    }

    /// The row key, or `None` for the header.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Header => None,
            Self::Row(key) => Some(key),
        }
    }

    /// Whether this is the header row.
    pub fn is_header(&self) -> bool {
        matches!(self, Self::Header)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("HEADER"),
            Self::Row(key) => f.write_str(key),
        }
    }
}

/// Positional counterpart of [`RowId`]: the header row or a data row index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RowPosition {
    /// The header row.
    Header,
    /// A data row, by index into the row list.
    Row(usize),
}

impl RowPosition {
    /// The data row index, or `None` for the header.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Header => None,
            Self::Row(index) => Some(index),
        }
    }
}

/// Produces row keys for one rebuild pass.
///
/// A row whose key field holds a truthy value is keyed by that value. Every other row gets
/// `row-<n>`, where `n` counts only the rows that took this path.
#[derive(Debug)]
pub struct RowKeyGenerator<'a> {
    key_field: Option<&'a str>,
    next_synthetic: usize,
}

impl<'a> RowKeyGenerator<'a> {
    /// A generator reading `key_field` from each row.
    pub fn new(key_field: Option<&'a str>) -> Self {
        Self {
            key_field,
            next_synthetic: 0,
        }
    }

    /// The key for `row`.
    pub fn compute(&mut self, row: &RowData) -> String {
        if let Some(value) = self
            .key_field
            .and_then(|field| row.get(field))
            .filter(|v| is_truthy(v))
        {
            return value_to_key(value);
        }
        let key = format!("row-{}", self.next_synthetic);
        self.next_synthetic += 1;
        key
    }
}

/// Column key: `<fieldName>-<type>`, or `<index>-<type>` for columns without a field name.
pub fn col_key_value(field_name: Option<&str>, type_name: &str, index: usize) -> String {
    match field_name.filter(|f| !f.is_empty()) {
        Some(field) => format!("{field}-{type_name}"),
        None => format!("{index}-{type_name}"),
    }
}
