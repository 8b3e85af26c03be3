// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use msal_schema::{
    Entity, EntitySchema, Extensions, FieldSpec, Fields, Generation, LogLevel, Logger,
    LoggerCallback, SchemaError, ValueKind,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;

fn default_pii_logging_enabled() -> Value {
    Value::Bool(false)
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("loggerCallback", ValueKind::Callback, Generation::V2),
    FieldSpec::optional("piiLoggingEnabled", ValueKind::Bool, Generation::V2)
        .with_default(default_pii_logging_enabled),
    FieldSpec::optional("logLevel", ValueKind::Enum(LogLevel::NAMES), Generation::V2),
];

/// Options controlling how the identity client reports log events
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(default)]
pub struct LoggerOptions {
    /// The function receiving log events. It can only be set from code.
    #[serde(skip)]
    pub callback: Option<LoggerCallback>,

    /// Whether events containing personally identifiable information reach
    /// the callback. Defaults to `false`, and unset when read with a
    /// generation which does not know this option
    pub pii_logging_enabled: Option<bool>,

    /// The most detailed level the identity client should emit. Every event
    /// given to the logger is dispatched regardless of this value
    pub log_level: Option<LogLevel>,

    /// Options not covered by the schema
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            callback: None,
            pii_logging_enabled: Some(false),
            log_level: None,
            extensions: Extensions::new(),
        }
    }
}

impl LoggerOptions {
    /// Whether events containing personally identifiable information reach
    /// the callback
    #[must_use]
    pub fn pii_logging_enabled(&self) -> bool {
        self.pii_logging_enabled.unwrap_or_default()
    }

    /// Set the function receiving log events
    #[must_use]
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(LogLevel, &str, bool) + Send + Sync + 'static,
    {
        self.callback = Some(LoggerCallback::new(callback));
        self
    }

    /// Set whether events containing personally identifiable information
    /// reach the callback
    #[must_use]
    pub fn with_pii_logging_enabled(mut self, enabled: bool) -> Self {
        self.pii_logging_enabled = Some(enabled);
        self
    }

    /// Set the most detailed level the identity client should emit
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Build the dispatcher for these options
    #[must_use]
    pub fn logger(&self) -> Logger {
        Logger::new(self.callback.clone(), self.pii_logging_enabled())
    }
}

impl Entity for LoggerOptions {
    const SCHEMA: EntitySchema = EntitySchema::new("LoggerOptions", &[FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            // Functions never cross the dynamic boundary
            callback: None,
            pii_logging_enabled: fields.optional("piiLoggingEnabled")?,
            log_level: fields.optional("logLevel")?,
            extensions: fields.into_extensions(),
        })
    }
}

msal_schema::impl_dynamic_conversions!(LoggerOptions);
