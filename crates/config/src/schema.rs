// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Useful JSON Schema definitions

use schemars::{
    JsonSchema,
    r#gen::SchemaGenerator,
    schema::{InstanceType, Schema, SchemaObject},
};

/// A network hostname
pub struct Hostname;

impl JsonSchema for Hostname {
    fn schema_name() -> String {
        "Hostname".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        string_with_format(generator, "hostname")
    }
}

/// An absolute URI
pub struct Uri;

impl JsonSchema for Uri {
    fn schema_name() -> String {
        "Uri".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        string_with_format(generator, "uri")
    }
}

fn string_with_format(_gen: &mut SchemaGenerator, format: &str) -> Schema {
    Schema::Object(SchemaObject {
        instance_type: Some(InstanceType::String.into()),
        format: Some(format.to_owned()),
        ..SchemaObject::default()
    })
}

/// A duration, as a number of milliseconds
pub struct Milliseconds;

impl JsonSchema for Milliseconds {
    fn schema_name() -> String {
        "Milliseconds".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        let mut schema = <u64 as JsonSchema>::json_schema(generator).into_object();
        schema.metadata().description = Some("A duration in milliseconds".to_owned());
        Schema::Object(schema)
    }
}
