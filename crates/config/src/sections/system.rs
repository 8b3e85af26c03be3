// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{sync::LazyLock, time::Duration};

use msal_schema::{
    Entity, EntitySchema, Extensions, FieldSpec, Fields, Generation, SchemaError, ValueKind,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use serde_with::{serde_as, skip_serializing_none};

use super::LoggerOptions;
use crate::{ConfigurationSection, schema::Milliseconds};

const DEFAULT_WINDOW_HASH_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_IFRAME_HASH_TIMEOUT_MS: u64 = 6_000;
const DEFAULT_LOAD_FRAME_TIMEOUT_MS: u64 = 0;
const DEFAULT_TOKEN_RENEWAL_OFFSET_SECONDS: u64 = 300;

const fn default_window_hash_timeout() -> Duration {
    Duration::from_millis(DEFAULT_WINDOW_HASH_TIMEOUT_MS)
}

const fn default_iframe_hash_timeout() -> Duration {
    Duration::from_millis(DEFAULT_IFRAME_HASH_TIMEOUT_MS)
}

const fn default_load_frame_timeout() -> Duration {
    Duration::from_millis(DEFAULT_LOAD_FRAME_TIMEOUT_MS)
}

const fn default_token_renewal_offset() -> Duration {
    Duration::from_secs(DEFAULT_TOKEN_RENEWAL_OFFSET_SECONDS)
}

fn default_logger_options_value() -> Value {
    Value::Object(Map::new())
}

fn default_window_hash_timeout_value() -> Value {
    Value::from(DEFAULT_WINDOW_HASH_TIMEOUT_MS)
}

fn default_iframe_hash_timeout_value() -> Value {
    Value::from(DEFAULT_IFRAME_HASH_TIMEOUT_MS)
}

fn default_load_frame_timeout_value() -> Value {
    Value::from(DEFAULT_LOAD_FRAME_TIMEOUT_MS)
}

fn default_token_renewal_offset_value() -> Value {
    Value::from(DEFAULT_TOKEN_RENEWAL_OFFSET_SECONDS)
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::optional(
        "loggerOptions",
        ValueKind::Entity("LoggerOptions"),
        Generation::V2,
    )
    .with_default(default_logger_options_value),
    FieldSpec::optional("windowHashTimeout", ValueKind::Duration, Generation::V2)
        .with_default(default_window_hash_timeout_value),
    FieldSpec::optional("iframeHashTimeout", ValueKind::Duration, Generation::V2)
        .with_default(default_iframe_hash_timeout_value),
    FieldSpec::optional("loadFrameTimeout", ValueKind::Duration, Generation::V2)
        .with_default(default_load_frame_timeout_value),
    FieldSpec::optional(
        "tokenRenewalOffsetSeconds",
        ValueKind::Duration,
        Generation::V2,
    )
    .with_default(default_token_renewal_offset_value),
];

static DEFAULT_LOGGER_OPTIONS: LazyLock<LoggerOptions> = LazyLock::new(LoggerOptions::default);

/// Options tuning the behaviour of the identity client
///
/// Every option is unset when read with a generation which does not know it.
/// The accessors apply the defaults.
#[skip_serializing_none]
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(default)]
pub struct SystemOptions {
    /// How log events are reported
    pub logger_options: Option<LoggerOptions>,

    /// How long to wait for a popup window to send the response back, in
    /// milliseconds. Defaults to 60000
    #[schemars(with = "Option<Milliseconds>")]
    #[serde_as(as = "Option<serde_with::DurationMilliSeconds<u64>>")]
    pub window_hash_timeout: Option<Duration>,

    /// How long to wait for a hidden iframe to send the response back, in
    /// milliseconds. Defaults to 6000
    #[schemars(with = "Option<Milliseconds>")]
    #[serde_as(as = "Option<serde_with::DurationMilliSeconds<u64>>")]
    pub iframe_hash_timeout: Option<Duration>,

    /// How long to wait for a hidden iframe to load, in milliseconds.
    /// Defaults to 0
    #[schemars(with = "Option<Milliseconds>")]
    #[serde_as(as = "Option<serde_with::DurationMilliSeconds<u64>>")]
    pub load_frame_timeout: Option<Duration>,

    /// How long before their expiry tokens are renewed, in seconds. Defaults
    /// to 300
    #[schemars(with = "Option<u64>")]
    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    pub token_renewal_offset_seconds: Option<Duration>,

    /// Options not covered by the schema
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Default for SystemOptions {
    fn default() -> Self {
        Self {
            logger_options: Some(LoggerOptions::default()),
            window_hash_timeout: Some(default_window_hash_timeout()),
            iframe_hash_timeout: Some(default_iframe_hash_timeout()),
            load_frame_timeout: Some(default_load_frame_timeout()),
            token_renewal_offset_seconds: Some(default_token_renewal_offset()),
            extensions: Extensions::new(),
        }
    }
}

impl SystemOptions {
    /// How log events are reported
    #[must_use]
    pub fn logger_options(&self) -> &LoggerOptions {
        self.logger_options.as_ref().unwrap_or(&DEFAULT_LOGGER_OPTIONS)
    }

    /// How long to wait for a popup window
    #[must_use]
    pub fn window_hash_timeout(&self) -> Duration {
        self.window_hash_timeout
            .unwrap_or_else(default_window_hash_timeout)
    }

    /// How long to wait for a hidden iframe to respond
    #[must_use]
    pub fn iframe_hash_timeout(&self) -> Duration {
        self.iframe_hash_timeout
            .unwrap_or_else(default_iframe_hash_timeout)
    }

    /// How long to wait for a hidden iframe to load
    #[must_use]
    pub fn load_frame_timeout(&self) -> Duration {
        self.load_frame_timeout
            .unwrap_or_else(default_load_frame_timeout)
    }

    /// How long before their expiry tokens are renewed
    #[must_use]
    pub fn token_renewal_offset(&self) -> Duration {
        self.token_renewal_offset_seconds
            .unwrap_or_else(default_token_renewal_offset)
    }

    /// Set how log events are reported
    #[must_use]
    pub fn with_logger_options(mut self, logger_options: LoggerOptions) -> Self {
        self.logger_options = Some(logger_options);
        self
    }

    /// Set how long to wait for a popup window
    #[must_use]
    pub fn with_window_hash_timeout(mut self, timeout: Duration) -> Self {
        self.window_hash_timeout = Some(timeout);
        self
    }

    /// Set how long to wait for a hidden iframe to respond
    #[must_use]
    pub fn with_iframe_hash_timeout(mut self, timeout: Duration) -> Self {
        self.iframe_hash_timeout = Some(timeout);
        self
    }

    /// Set how long to wait for a hidden iframe to load
    #[must_use]
    pub fn with_load_frame_timeout(mut self, timeout: Duration) -> Self {
        self.load_frame_timeout = Some(timeout);
        self
    }

    /// Set how long before their expiry tokens are renewed
    #[must_use]
    pub fn with_token_renewal_offset(mut self, offset: Duration) -> Self {
        self.token_renewal_offset_seconds = Some(offset);
        self
    }
}

impl Entity for SystemOptions {
    const SCHEMA: EntitySchema = EntitySchema::new("SystemOptions", &[FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            logger_options: fields.optional_entity("loggerOptions")?,
            window_hash_timeout: fields
                .optional("windowHashTimeout")?
                .map(Duration::from_millis),
            iframe_hash_timeout: fields
                .optional("iframeHashTimeout")?
                .map(Duration::from_millis),
            load_frame_timeout: fields
                .optional("loadFrameTimeout")?
                .map(Duration::from_millis),
            token_renewal_offset_seconds: fields
                .optional("tokenRenewalOffsetSeconds")?
                .map(Duration::from_secs),
            extensions: fields.into_extensions(),
        })
    }
}

msal_schema::impl_dynamic_conversions!(SystemOptions);

impl ConfigurationSection for SystemOptions {
    const PATH: Option<&'static str> = Some("system");
}
