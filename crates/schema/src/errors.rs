// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Errors raised while turning dynamic objects into typed entities.

use std::fmt;

use thiserror::Error;

use crate::value::ValueKind;

/// A dotted path to a field, relative to the root entity being constructed.
///
/// An empty path designates the object itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The path of the object itself.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// A path made of a single field name.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// The path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether this path designates the object itself.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Prepend a parent field name to this path.
    #[must_use]
    pub fn prefixed(mut self, parent: &str) -> Self {
        self.0.insert(0, parent.to_owned());
        self
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }

        f.write_str(&self.0.join("."))
    }
}

impl PartialEq<&str> for FieldPath {
    fn eq(&self, other: &&str) -> bool {
        if self.0.is_empty() {
            return other.is_empty();
        }

        let mut remaining = *other;
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                let Some(rest) = remaining.strip_prefix('.') else {
                    return false;
                };
                remaining = rest;
            }

            let Some(rest) = remaining.strip_prefix(segment.as_str()) else {
                return false;
            };
            remaining = rest;
        }

        remaining.is_empty()
    }
}

/// What is wrong with a value at a given [`FieldPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// A required field is absent or null.
    Missing {
        /// The kind of value which was expected.
        expected: ValueKind,
    },

    /// A required field holds a value of the wrong type.
    WrongType {
        /// The kind of value which was expected.
        expected: ValueKind,

        /// The JSON type which was found instead.
        found: &'static str,
    },

    /// A field which must not be empty is empty.
    Empty,

    /// A duration is negative.
    Negative,

    /// The value given for an entity is not an object.
    NotAnObject {
        /// The JSON type which was found instead.
        found: &'static str,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { expected } => write!(f, "missing required {expected}"),
            Self::WrongType { expected, found } => write!(f, "expected {expected}, found {found}"),
            Self::Empty => f.write_str("value must not be empty"),
            Self::Negative => f.write_str("value must not be negative"),
            Self::NotAnObject { found } => write!(f, "expected an object, found {found}"),
        }
    }
}

/// An error raised while building an entity from a dynamic object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field is missing or holds an invalid value.
    #[error("invalid {entity} at `{path}`: {violation}")]
    SchemaViolation {
        /// The root entity being constructed.
        entity: &'static str,

        /// Where the violation occurred.
        path: FieldPath,

        /// What is wrong with the value.
        violation: Violation,
    },

    /// A closed enumeration got a value it does not know about.
    #[error("invalid {entity} at `{path}`: unknown value {value:?}, expected one of {expected:?}")]
    UnknownEnumValue {
        /// The root entity being constructed.
        entity: &'static str,

        /// Where the unknown value was found.
        path: FieldPath,

        /// The value which was given.
        value: String,

        /// The accepted values.
        expected: &'static [&'static str],
    },
}

impl SchemaError {
    /// A violation on a top-level field of an entity.
    #[must_use]
    pub fn violation(entity: &'static str, field: &str, violation: Violation) -> Self {
        Self::SchemaViolation {
            entity,
            path: FieldPath::field(field),
            violation,
        }
    }

    /// The root entity which was being constructed.
    #[must_use]
    pub fn entity(&self) -> &'static str {
        match self {
            Self::SchemaViolation { entity, .. } | Self::UnknownEnumValue { entity, .. } => entity,
        }
    }

    /// Where in the object the error occurred.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::SchemaViolation { path, .. } | Self::UnknownEnumValue { path, .. } => path,
        }
    }

    /// Re-root an error raised by a nested entity under its parent.
    #[must_use]
    pub(crate) fn nested_in(self, parent: &'static str, field: &str) -> Self {
        match self {
            Self::SchemaViolation {
                path, violation, ..
            } => Self::SchemaViolation {
                entity: parent,
                path: path.prefixed(field),
                violation,
            },
            Self::UnknownEnumValue {
                path,
                value,
                expected,
                ..
            } => Self::UnknownEnumValue {
                entity: parent,
                path: path.prefixed(field),
                value,
                expected,
            },
        }
    }
}
