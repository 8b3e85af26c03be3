// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Field tables and the reconciler which turns dynamic objects into entities.
//!
//! Each entity describes its fields with a table of [`FieldSpec`], recording
//! in which [`Generation`] of the upstream objects each field exists and
//! whether it is required there. The [`Reconciler`] validates a dynamic object
//! against that table, applies defaults, and moves unknown keys into an
//! extension map.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    errors::{FieldPath, SchemaError, Violation},
    value::{Conformance, Extensions, ValueKind},
};

/// A generation of the upstream object shapes.
///
/// Generations are ordered, the oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    /// The first generation.
    V1,

    /// The second generation.
    V2,

    /// The third generation.
    V3,
}

impl Generation {
    /// All generations, the oldest first.
    pub const ALL: [Self; 3] = [Self::V1, Self::V2, Self::V3];

    /// The most recent generation.
    pub const LATEST: Self = Self::V3;

    const fn index(self) -> usize {
        self as usize
    }

    /// Get the string representation of this generation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error when parsing a [`Generation`] from a string.
#[derive(Debug, Clone, Error)]
#[error("Invalid schema generation {0:?}")]
pub struct InvalidGenerationError(String);

impl FromStr for Generation {
    type Err = InvalidGenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            "v3" => Ok(Self::V3),
            s => Err(InvalidGenerationError(s.to_owned())),
        }
    }
}

/// Whether a field must be present in a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The field must be present.
    Required,

    /// The field may be absent.
    Optional,
}

/// How the reconciler treats an absent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Absence is an error.
    Required,

    /// Absence is allowed, the field stays unset.
    Optional,

    /// Absence is allowed, the default value is used.
    Defaulted,
}

/// The description of a single field of an entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    name: &'static str,
    kind: ValueKind,
    presence: [Option<Presence>; 3],
    default: Option<fn() -> Value>,
    non_empty: bool,
}

impl FieldSpec {
    const fn since(name: &'static str, kind: ValueKind, since: Generation, presence: Presence) -> Self {
        let mut generations = [None; 3];
        let mut index = since.index();
        while index < generations.len() {
            generations[index] = Some(presence);
            index += 1;
        }

        Self {
            name,
            kind,
            presence: generations,
            default: None,
            non_empty: false,
        }
    }

    /// A field which is required from the given generation onwards.
    #[must_use]
    pub const fn required(name: &'static str, kind: ValueKind, since: Generation) -> Self {
        Self::since(name, kind, since, Presence::Required)
    }

    /// A field which is optional from the given generation onwards.
    #[must_use]
    pub const fn optional(name: &'static str, kind: ValueKind, since: Generation) -> Self {
        Self::since(name, kind, since, Presence::Optional)
    }

    /// Override the presence of this field in one generation. `None` means
    /// the field does not exist in that generation.
    #[must_use]
    pub const fn in_generation(mut self, generation: Generation, presence: Option<Presence>) -> Self {
        self.presence[generation.index()] = presence;
        self
    }

    /// Use this value when the field is absent.
    #[must_use]
    pub const fn with_default(mut self, default: fn() -> Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Reject empty strings and empty lists.
    #[must_use]
    pub const fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    /// The name of the field in dynamic objects.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The kind of value this field accepts.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the field exists in a generation, and if it is required there.
    #[must_use]
    pub const fn presence_in(&self, generation: Generation) -> Option<Presence> {
        self.presence[generation.index()]
    }

    /// The first generation in which this field exists.
    #[must_use]
    pub fn introduced(&self) -> Option<Generation> {
        Generation::ALL
            .into_iter()
            .find(|generation| self.presence_in(*generation).is_some())
    }

    /// Whether this field was dropped before the latest generation.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.introduced().is_some() && self.presence_in(Generation::LATEST).is_none()
    }

    /// The default value of this field, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        self.default.map(|default| default())
    }

    /// The rule applied by the canonical reconciler.
    ///
    /// A field is required if the first generation requires it and no later
    /// generation relaxed it to optional. Fields which became required later
    /// stay optional, so that older objects remain valid.
    #[must_use]
    pub fn rule(&self) -> FieldRule {
        let required = matches!(
            (
                self.presence_in(Generation::V1),
                self.presence_in(Generation::V2),
                self.presence_in(Generation::V3),
            ),
            (
                Some(Presence::Required),
                Some(Presence::Required) | None,
                Some(Presence::Required) | None
            )
        );

        if required {
            FieldRule::Required
        } else {
            self.relaxed_rule()
        }
    }

    /// The rule applied by a reconciler pinned to a generation, or `None` if
    /// the field does not exist there.
    #[must_use]
    pub fn rule_in(&self, generation: Generation) -> Option<FieldRule> {
        self.presence_in(generation).map(|presence| match presence {
            Presence::Required => FieldRule::Required,
            Presence::Optional => self.relaxed_rule(),
        })
    }

    fn relaxed_rule(&self) -> FieldRule {
        if self.default.is_some() {
            FieldRule::Defaulted
        } else {
            FieldRule::Optional
        }
    }
}

/// The field table of an entity.
///
/// Tables are made of segments so that entities extending another one can
/// reuse its fields.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    name: &'static str,
    segments: &'static [&'static [FieldSpec]],
}

impl EntitySchema {
    /// Create a new entity table.
    #[must_use]
    pub const fn new(name: &'static str, segments: &'static [&'static [FieldSpec]]) -> Self {
        Self { name, segments }
    }

    /// The name of the entity, used in errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Iterate over all the fields of the entity.
    pub fn fields(&self) -> impl Iterator<Item = &'static FieldSpec> + use<> {
        self.segments.iter().flat_map(|segment| segment.iter())
    }

    /// Look up a field by its name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().find(|spec| spec.name == name)
    }
}

/// Validates dynamic objects against an [`EntitySchema`].
///
/// The canonical reconciler accepts objects of any generation. A strict
/// reconciler only knows the fields of one generation and applies its
/// presence rules, any other key ends up in the extensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciler {
    target: Option<Generation>,
}

impl Reconciler {
    /// A reconciler accepting objects of any generation.
    #[must_use]
    pub const fn canonical() -> Self {
        Self { target: None }
    }

    /// A reconciler pinned to a single generation.
    #[must_use]
    pub const fn strict(generation: Generation) -> Self {
        Self {
            target: Some(generation),
        }
    }

    /// The generation this reconciler is pinned to, if any.
    #[must_use]
    pub const fn target(&self) -> Option<Generation> {
        self.target
    }

    fn rule_for(self, spec: &FieldSpec) -> Option<FieldRule> {
        match self.target {
            None => Some(spec.rule()),
            Some(generation) => spec.rule_in(generation),
        }
    }

    /// Validate a dynamic object against a field table.
    ///
    /// Null values are treated as absent. Optional fields holding a value of
    /// the wrong type are treated as absent too: the raw value is kept in the
    /// extensions unless the field has a default.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object, if a required field is
    /// missing or holds a value of the wrong type, or if a closed enumeration
    /// got an unknown value.
    #[tracing::instrument(
        name = "schema.reconcile",
        skip_all,
        fields(entity = schema.name(), generation = self.target.map(Generation::as_str)),
    )]
    pub fn reconcile(&self, schema: &EntitySchema, value: Value) -> Result<Fields, SchemaError> {
        let entity = schema.name();
        let input = match value {
            Value::Object(input) => input,
            other => {
                return Err(SchemaError::SchemaViolation {
                    entity,
                    path: FieldPath::root(),
                    violation: Violation::NotAnObject {
                        found: ValueKind::describe(&other),
                    },
                });
            }
        };

        let mut known = Map::new();
        let mut extensions = Extensions::new();
        for (key, value) in input {
            let is_known = schema
                .field(&key)
                .is_some_and(|spec| self.rule_for(spec).is_some());

            if is_known {
                known.insert(key, value);
            } else {
                extensions.insert(key, value);
            }
        }

        let mut values = Map::new();
        let mut generation = None;
        for spec in schema.fields() {
            let Some(rule) = self.rule_for(spec) else {
                continue;
            };

            let raw = known.remove(spec.name).filter(|value| !value.is_null());
            let Some(raw) = raw else {
                match rule {
                    FieldRule::Required => {
                        return Err(SchemaError::violation(
                            entity,
                            spec.name,
                            Violation::Missing {
                                expected: spec.kind,
                            },
                        ));
                    }
                    FieldRule::Defaulted => {
                        if let Some(default) = spec.default_value() {
                            tracing::trace!(field = spec.name, "Applying default value");
                            values.insert(spec.name.to_owned(), default);
                        }
                    }
                    FieldRule::Optional => {}
                }
                continue;
            };

            let raw = spec.kind.normalize(raw);
            match spec.kind.conformance(&raw) {
                Conformance::Valid => {
                    if spec.non_empty && ValueKind::is_empty(&raw) {
                        return Err(SchemaError::violation(entity, spec.name, Violation::Empty));
                    }

                    generation = generation.max(spec.introduced());
                    values.insert(spec.name.to_owned(), raw);
                }

                Conformance::UnknownVariant { value, expected } => {
                    return Err(SchemaError::UnknownEnumValue {
                        entity,
                        path: FieldPath::field(spec.name),
                        value,
                        expected,
                    });
                }

                Conformance::Negative => {
                    return Err(SchemaError::violation(entity, spec.name, Violation::Negative));
                }

                Conformance::WrongType if rule == FieldRule::Required => {
                    return Err(SchemaError::violation(
                        entity,
                        spec.name,
                        Violation::WrongType {
                            expected: spec.kind,
                            found: ValueKind::describe(&raw),
                        },
                    ));
                }

                Conformance::WrongType => {
                    tracing::warn!(
                        field = spec.name,
                        expected = %spec.kind,
                        found = ValueKind::describe(&raw),
                        "Ignoring optional field with a value of the wrong type"
                    );

                    match spec.default_value() {
                        Some(default) => {
                            values.insert(spec.name.to_owned(), default);
                        }
                        None => {
                            extensions.insert(spec.name.to_owned(), raw);
                        }
                    }
                }
            }
        }

        tracing::debug!(
            detected_generation = generation.map(Generation::as_str),
            extensions = extensions.len(),
            "Reconciled dynamic object"
        );

        Ok(Fields {
            entity,
            reconciler: *self,
            generation,
            values,
            extensions,
        })
    }
}

/// The validated fields of a dynamic object, ready to be moved into an
/// entity.
#[derive(Debug, Clone)]
pub struct Fields {
    entity: &'static str,
    reconciler: Reconciler,
    generation: Option<Generation>,
    values: Map<String, Value>,
    extensions: Extensions,
}

impl Fields {
    /// The entity being constructed.
    #[must_use]
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// The most recent generation whose fields appeared in the object, if any
    /// known field was set.
    #[must_use]
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    fn decode<T: DeserializeOwned>(&self, name: &'static str, value: Value) -> Result<T, SchemaError> {
        let found = ValueKind::describe(&value);
        serde_json::from_value(value).map_err(|_| {
            SchemaError::violation(
                self.entity,
                name,
                Violation::WrongType {
                    expected: ValueKind::Any,
                    found,
                },
            )
        })
    }

    /// Take a field which is guaranteed to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is unset or cannot be decoded as `T`.
    pub fn required<T: DeserializeOwned>(&mut self, name: &'static str) -> Result<T, SchemaError> {
        let value = self.values.remove(name).ok_or_else(|| {
            SchemaError::violation(
                self.entity,
                name,
                Violation::Missing {
                    expected: ValueKind::Any,
                },
            )
        })?;

        self.decode(name, value)
    }

    /// Take an optional field.
    ///
    /// # Errors
    ///
    /// Returns an error if the field cannot be decoded as `T`.
    pub fn optional<T: DeserializeOwned>(&mut self, name: &'static str) -> Result<Option<T>, SchemaError> {
        self.values
            .remove(name)
            .map(|value| self.decode(name, value))
            .transpose()
    }

    /// Take a nested entity which is guaranteed to be set.
    ///
    /// Errors raised by the nested entity are re-rooted under this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is unset or the nested entity is invalid.
    pub fn required_entity<E: Entity>(&mut self, name: &'static str) -> Result<E, SchemaError> {
        self.optional_entity(name)?.ok_or_else(|| {
            SchemaError::violation(
                self.entity,
                name,
                Violation::Missing {
                    expected: ValueKind::Entity(E::SCHEMA.name()),
                },
            )
        })
    }

    /// Take an optional nested entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the nested entity is invalid.
    pub fn optional_entity<E: Entity>(&mut self, name: &'static str) -> Result<Option<E>, SchemaError> {
        let Some(value) = self.values.remove(name) else {
            return Ok(None);
        };

        E::from_dynamic_with(value, self.reconciler)
            .map(Some)
            .map_err(|error| error.nested_in(self.entity, name))
    }

    /// Finish the construction, returning the unknown keys.
    #[must_use]
    pub fn into_extensions(self) -> Extensions {
        self.extensions
    }
}

/// A typed object which can be built from a dynamic one.
pub trait Entity: Sized {
    /// The field table of this entity.
    const SCHEMA: EntitySchema;

    /// Build the entity out of validated fields.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be decoded.
    fn from_fields(fields: Fields) -> Result<Self, SchemaError>;

    /// Build the entity from a dynamic object of any generation.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not match the schema.
    fn from_dynamic(value: Value) -> Result<Self, SchemaError> {
        Self::from_dynamic_with(value, Reconciler::canonical())
    }

    /// Build the entity from a dynamic object using a specific reconciler.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not match the schema.
    fn from_dynamic_with(value: Value, reconciler: Reconciler) -> Result<Self, SchemaError> {
        let fields = reconciler.reconcile(&Self::SCHEMA, value)?;
        Self::from_fields(fields)
    }
}
