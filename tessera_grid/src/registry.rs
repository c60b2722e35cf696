// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column type registry.
//!
//! Every column type declares an ordered list of type-attribute names. The row indexer resolves
//! those names against a column's `typeAttributes` to produce the positional attribute values of
//! each cell, so the order here is part of the cell layout.

use indexmap::IndexMap;
use tracing::warn;

use crate::GridError;

/// Upper bound on the number of attributes a custom type may declare.
pub const MAX_TYPE_ATTRIBUTES: usize = 21;

const NUMBER_ATTRIBUTES: &[&str] = &[
    "minimumIntegerDigits",
    "minimumFractionDigits",
    "maximumFractionDigits",
    "minimumSignificantDigits",
    "maximumSignificantDigits",
];

const CURRENCY_ATTRIBUTES: &[&str] = &[
    "currencyCode",
    "currencyDisplayAs",
    "minimumIntegerDigits",
    "minimumFractionDigits",
    "maximumFractionDigits",
    "minimumSignificantDigits",
    "maximumSignificantDigits",
];

const DATE_ATTRIBUTES: &[&str] = &[
    "day",
    "era",
    "hour",
    "hour12",
    "minute",
    "month",
    "second",
    "timeZone",
    "timeZoneName",
    "weekday",
    "year",
];

const TREE_ATTRIBUTES: &[&str] = &[
    "hasChildren",
    "isExpanded",
    "level",
    "setSize",
    "posInSet",
    "subType",
];

/// Built-in types and their ordered attribute names.
const STANDARD_TYPES: &[(&str, &[&str])] = &[
    ("text", &[]),
    ("boolean", &[]),
    ("number", NUMBER_ATTRIBUTES),
    ("currency", CURRENCY_ATTRIBUTES),
    ("percent", NUMBER_ATTRIBUTES),
    ("email", &[]),
    ("date", DATE_ATTRIBUTES),
    ("date-local", &["day", "month", "year"]),
    ("phone", &[]),
    ("url", &["label", "target", "tooltip"]),
    ("location", &[]),
    ("rowNumber", &["error"]),
    ("action", &["menuAlignment", "rowActions"]),
    (
        "button",
        &[
            "variant",
            "label",
            "iconName",
            "iconPosition",
            "disabled",
            "name",
            "class",
            "title",
        ],
    ),
    (
        "button-icon",
        &[
            "variant",
            "alternativeText",
            "iconName",
            "iconClass",
            "disabled",
            "name",
            "class",
            "title",
        ],
    ),
    ("tree", TREE_ATTRIBUTES),
];

const TREE_SUBTYPES: &[&str] = &["text", "url", "date", "number", "currency", "percent"];

/// Name of the tree column type.
pub const TREE_TYPE: &str = "tree";

/// Attribute names of a built-in type, in cell order.
pub fn standard_attribute_names(name: &str) -> Option<&'static [&'static str]> {
    STANDARD_TYPES
        .iter()
        .find(|(type_name, _)| *type_name == name)
        .map(|(_, attrs)| *attrs)
}

/// Whether `name` is the tree column type.
pub fn is_tree_type(name: &str) -> bool {
    name == TREE_TYPE
}

/// Whether `name` may be used as the `subType` of a tree column.
pub fn is_valid_type_for_tree(name: &str) -> bool {
    TREE_SUBTYPES.contains(&name)
}

/// Where a type came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// One of the built-in types.
    Standard,
    /// Registered through [`TypeRegistry::register`].
    Custom,
}

/// The standard types plus any custom types registered by the embedding application.
///
/// Custom types shadow standard types of the same name.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    custom: IndexMap<String, Vec<String>>,
}

impl TypeRegistry {
    /// A registry holding only the standard types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom type.
    ///
    /// Attribute lists longer than [`MAX_TYPE_ATTRIBUTES`] are truncated with a warning.
    pub fn register<I, S>(&mut self, name: impl Into<String>, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let mut attributes: Vec<String> = attributes.into_iter().map(Into::into).collect();
        if attributes.len() > MAX_TYPE_ATTRIBUTES {
            warn!(
                type_name = %name,
                declared = attributes.len(),
                cap = MAX_TYPE_ATTRIBUTES,
                "custom type declares too many attributes, extra ones are ignored"
            );
            attributes.truncate(MAX_TYPE_ATTRIBUTES);
        }
        self.custom.insert(name, attributes);
    }

    /// Where `name` is defined, if anywhere.
    pub fn kind(&self, name: &str) -> Option<TypeKind> {
        if self.custom.contains_key(name) {
            Some(TypeKind::Custom)
        } else if standard_attribute_names(name).is_some() {
            Some(TypeKind::Standard)
        } else {
            None
        }
    }

    /// Whether `name` is a standard or registered custom type.
    pub fn is_valid_type(&self, name: &str) -> bool {
        self.kind(name).is_some()
    }

    /// Whether `name` is a registered custom type.
    pub fn is_custom_type(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    /// Ordered attribute names of `name`.
    pub fn attribute_names(&self, name: &str) -> Result<Vec<&str>, GridError> {
        if let Some(custom) = self.custom.get(name) {
            return Ok(custom.iter().map(String::as_str).collect());
        }
        standard_attribute_names(name)
            .map(<[&str]>::to_vec)
            .ok_or_else(|| GridError::UnknownType {
                name: name.to_owned(),
            })
    }
}
