// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{fmt, str::FromStr};

use msal_schema::{
    Entity, EntitySchema, Extensions, FieldSpec, Fields, Generation, SchemaError, ValueKind,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::ConfigurationSection;

/// Where the identity client keeps its token cache
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum CacheLocation {
    /// In the session storage of the browser, scoped to the tab
    #[default]
    SessionStorage,

    /// In the local storage of the browser, shared by every tab
    LocalStorage,
}

impl CacheLocation {
    /// The names used in dynamic objects
    pub const NAMES: &'static [&'static str] = &["sessionStorage", "localStorage"];

    /// Get the string representation of this location
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionStorage => "sessionStorage",
            Self::LocalStorage => "localStorage",
        }
    }
}

impl fmt::Display for CacheLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error when parsing a [`CacheLocation`] from a string
#[derive(Debug, Clone, Error)]
#[error("Invalid cache location {0:?}")]
pub struct InvalidCacheLocationError(String);

impl FromStr for CacheLocation {
    type Err = InvalidCacheLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sessionStorage" => Ok(Self::SessionStorage),
            "localStorage" => Ok(Self::LocalStorage),
            s => Err(InvalidCacheLocationError(s.to_owned())),
        }
    }
}

fn default_cache_location() -> Value {
    Value::String(CacheLocation::default().as_str().to_owned())
}

fn default_store_auth_state_in_cookie() -> Value {
    Value::Bool(false)
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::optional(
        "cacheLocation",
        ValueKind::Enum(CacheLocation::NAMES),
        Generation::V2,
    )
    .with_default(default_cache_location),
    FieldSpec::optional("storeAuthStateInCookie", ValueKind::Bool, Generation::V2)
        .with_default(default_store_auth_state_in_cookie),
];

/// Options controlling the token cache
///
/// Both options are unset when read with a generation which does not know
/// them. The accessors apply the defaults.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(default)]
pub struct CacheOptions {
    /// Where to keep the token cache. Defaults to `sessionStorage`
    pub cache_location: Option<CacheLocation>,

    /// Whether to keep the authentication state in a cookie, for browsers
    /// which lose the storage during redirects
    pub store_auth_state_in_cookie: Option<bool>,

    /// Options not covered by the schema
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            cache_location: Some(CacheLocation::default()),
            store_auth_state_in_cookie: Some(false),
            extensions: Extensions::new(),
        }
    }
}

impl CacheOptions {
    /// Where to keep the token cache
    #[must_use]
    pub fn cache_location(&self) -> CacheLocation {
        self.cache_location.unwrap_or_default()
    }

    /// Whether to keep the authentication state in a cookie
    #[must_use]
    pub fn store_auth_state_in_cookie(&self) -> bool {
        self.store_auth_state_in_cookie.unwrap_or_default()
    }

    /// Set where to keep the token cache
    #[must_use]
    pub fn with_cache_location(mut self, cache_location: CacheLocation) -> Self {
        self.cache_location = Some(cache_location);
        self
    }

    /// Set whether to keep the authentication state in a cookie
    #[must_use]
    pub fn with_store_auth_state_in_cookie(mut self, store: bool) -> Self {
        self.store_auth_state_in_cookie = Some(store);
        self
    }
}

impl Entity for CacheOptions {
    const SCHEMA: EntitySchema = EntitySchema::new("CacheOptions", &[FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            cache_location: fields.optional("cacheLocation")?,
            store_auth_state_in_cookie: fields.optional("storeAuthStateInCookie")?,
            extensions: fields.into_extensions(),
        })
    }
}

msal_schema::impl_dynamic_conversions!(CacheOptions);

impl ConfigurationSection for CacheOptions {
    const PATH: Option<&'static str> = Some("cache");
}
