// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::LazyLock;

use figment::Figment;
use msal_schema::{
    Entity, EntitySchema, Extensions, FieldSpec, Fields, Generation, Logger, SchemaError,
    ValueKind,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

mod auth;
mod cache;
mod logger;
mod system;

pub use self::{
    auth::{AuthOptions, DEFAULT_AUTHORITY},
    cache::{CacheLocation, CacheOptions, InvalidCacheLocationError},
    logger::LoggerOptions,
    system::SystemOptions,
};
use crate::util::ConfigurationSection;

fn empty_object() -> Value {
    Value::Object(Map::new())
}

static DEFAULT_CACHE: LazyLock<CacheOptions> = LazyLock::new(CacheOptions::default);
static DEFAULT_SYSTEM: LazyLock<SystemOptions> = LazyLock::new(SystemOptions::default);

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("auth", ValueKind::Entity("AuthOptions"), Generation::V1),
    FieldSpec::optional("cache", ValueKind::Entity("CacheOptions"), Generation::V2)
        .with_default(empty_object),
    FieldSpec::optional("system", ValueKind::Entity("SystemOptions"), Generation::V2)
        .with_default(empty_object),
];

/// Configuration of a browser identity client
///
/// It is built once per client and never changes afterwards. The `cache`
/// and `system` sections are unset when read with a generation which does
/// not know them.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Configuration {
    /// Options identifying the application
    pub auth: AuthOptions,

    /// Options controlling the token cache
    pub cache: Option<CacheOptions>,

    /// Options tuning the behaviour of the client
    pub system: Option<SystemOptions>,

    /// Options not covered by the schema
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Configuration {
    /// Create a configuration for the given application, with every other
    /// option defaulted
    #[must_use]
    pub fn new(auth: impl Into<AuthOptions>) -> Self {
        Self {
            auth: auth.into(),
            cache: Some(CacheOptions::default()),
            system: Some(SystemOptions::default()),
            extensions: Extensions::new(),
        }
    }

    /// Set the cache options
    #[must_use]
    pub fn with_cache(mut self, cache: CacheOptions) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the system options
    #[must_use]
    pub fn with_system(mut self, system: SystemOptions) -> Self {
        self.system = Some(system);
        self
    }

    /// The cache options, defaulted if unset
    #[must_use]
    pub fn cache(&self) -> &CacheOptions {
        self.cache.as_ref().unwrap_or(&DEFAULT_CACHE)
    }

    /// The system options, defaulted if unset
    #[must_use]
    pub fn system(&self) -> &SystemOptions {
        self.system.as_ref().unwrap_or(&DEFAULT_SYSTEM)
    }

    /// The ID of the application
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.auth.client_id
    }

    /// Build the log dispatcher described by the logger options
    #[must_use]
    pub fn logger(&self) -> Logger {
        self.system().logger_options().logger()
    }

    /// Load and validate the configuration from a [`Figment`]
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    #[tracing::instrument(name = "config.load", skip_all)]
    pub fn load(
        figment: &Figment,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        let config = <Self as ConfigurationSection>::extract(figment)?;
        tracing::debug!(client_id = config.client_id(), "Loaded configuration");
        Ok(config)
    }
}

impl From<&str> for Configuration {
    fn from(client_id: &str) -> Self {
        Self::new(client_id)
    }
}

impl From<String> for Configuration {
    fn from(client_id: String) -> Self {
        Self::new(client_id)
    }
}

impl From<AuthOptions> for Configuration {
    fn from(auth: AuthOptions) -> Self {
        Self::new(auth)
    }
}

impl Entity for Configuration {
    const SCHEMA: EntitySchema = EntitySchema::new("Configuration", &[FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            auth: fields.required_entity("auth")?,
            cache: fields.optional_entity("cache")?,
            system: fields.optional_entity("system")?,
            extensions: fields.into_extensions(),
        })
    }
}

msal_schema::impl_dynamic_conversions!(Configuration);

impl ConfigurationSection for Configuration {
    fn validate(
        &self,
        figment: &Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        self.auth.validate(figment)?;
        self.cache().validate(figment)?;
        self.system().validate(figment)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use figment::{
        Jail,
        providers::{Format, Json, Yaml},
    };
    use msal_schema::{Reconciler, Violation};
    use serde_json::json;

    use super::*;

    #[test]
    fn minimal() {
        let config = Configuration::from_dynamic(json!({
            "auth": { "clientId": "enter_client_id_here" },
        }))
        .unwrap();

        assert_eq!(config, Configuration::from("enter_client_id_here"));
        assert_eq!(config.client_id(), "enter_client_id_here");
        assert_eq!(config.auth.authority, DEFAULT_AUTHORITY);
        assert_eq!(config.cache().cache_location(), CacheLocation::SessionStorage);
        assert!(!config.system().logger_options().pii_logging_enabled());
        assert!(!config.logger().pii_logging_enabled());
    }

    #[test]
    fn strict_v1() {
        let config = Configuration::from_dynamic_with(
            json!({
                "auth": { "clientId": "client" },
                "cache": { "cacheLocation": "localStorage" },
            }),
            Reconciler::strict(Generation::V1),
        )
        .unwrap();

        assert_eq!(config.cache, None);
        assert_eq!(config.system, None);
        assert_eq!(config.cache(), &CacheOptions::default());
        assert_eq!(config.system(), &SystemOptions::default());
        assert_eq!(
            config.extensions.get("cache"),
            Some(&json!({ "cacheLocation": "localStorage" }))
        );
    }

    #[test]
    fn strict_v1_serializes_sections_once() {
        let input = json!({
            "auth": { "clientId": "client", "knownAuthorities": ["login.contoso.com"] },
            "cache": { "cacheLocation": "localStorage" },
            "system": { "windowHashTimeout": 1000 },
        });
        let config =
            Configuration::from_dynamic_with(input, Reconciler::strict(Generation::V1)).unwrap();

        let serialized = serde_json::to_string(&config).unwrap();
        for key in ["\"cache\"", "\"system\"", "\"knownAuthorities\""] {
            assert_eq!(serialized.matches(key).count(), 1, "{key} in {serialized}");
        }

        // Reading it back under the same generation gives the same value
        let reparsed: Value = serde_json::from_str(&serialized).unwrap();
        let again =
            Configuration::from_dynamic_with(reparsed, Reconciler::strict(Generation::V1))
                .unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn missing_client_id() {
        let error = Configuration::from_dynamic(json!({ "auth": {} })).unwrap_err();
        assert_eq!(error.entity(), "Configuration");
        assert_eq!(error.path(), &"auth.clientId");

        let error = Configuration::from_dynamic(json!({})).unwrap_err();
        assert_matches!(
            error,
            SchemaError::SchemaViolation {
                violation: Violation::Missing { .. },
                ..
            }
        );
        assert_eq!(error.path(), &"auth");
    }

    #[test]
    fn serialize() {
        let config = Configuration::new(
            AuthOptions::new("enter_client_id_here").with_redirect_uri("http://localhost:3000"),
        )
        .with_cache(CacheOptions::default().with_cache_location(CacheLocation::LocalStorage));

        insta::assert_json_snapshot!(config, @r###"
        {
          "auth": {
            "clientId": "enter_client_id_here",
            "authority": "https://login.microsoftonline.com/common",
            "knownAuthorities": [],
            "redirectUri": "http://localhost:3000",
            "navigateToLoginRequestUrl": true
          },
          "cache": {
            "cacheLocation": "localStorage",
            "storeAuthStateInCookie": false
          },
          "system": {
            "loggerOptions": {
              "piiLoggingEnabled": false
            },
            "windowHashTimeout": 60000,
            "iframeHashTimeout": 6000,
            "loadFrameTimeout": 0,
            "tokenRenewalOffsetSeconds": 300
          }
        }
        "###);
    }

    #[test]
    fn json_schema() {
        let schema = schemars::schema_for!(Configuration);
        let object = schema.schema.object.as_ref().unwrap();
        assert!(object.required.contains("auth"));
        assert!(!object.required.contains("cache"));
        assert!(!object.required.contains("system"));
        assert!(schema.definitions.contains_key("AuthOptions"));
    }

    #[test]
    fn load_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    auth:
                      clientId: enter_client_id_here
                      authority: https://login.microsoftonline.com/common
                      knownAuthorities: []
                      cloudDiscoveryMetadata: ''
                      redirectUri: enter_redirect_uri_here
                      postLogoutRedirectUri: enter_postlogout_uri_here
                      navigateToLoginRequestUrl: true
                    cache:
                      cacheLocation: sessionStorage
                      storeAuthStateInCookie: false
                    system:
                      loggerOptions:
                        piiLoggingEnabled: false
                      windowHashTimeout: 60000
                      iframeHashTimeout: 6000
                      loadFrameTimeout: 0
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config = Configuration::load(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config.client_id(), "enter_client_id_here");
            assert_eq!(config.auth.cloud_discovery_metadata.as_deref(), Some(""));
            assert_eq!(
                config.auth.post_logout_redirect_uri.as_deref(),
                Some("enter_postlogout_uri_here")
            );
            assert_eq!(config.system().window_hash_timeout(), Duration::from_secs(60));
            assert!(config.extensions.is_empty());

            Ok(())
        });
    }

    #[test]
    fn load_merged_files() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "base.yaml",
                r"
                    auth:
                      clientId: base
                    cache:
                      storeAuthStateInCookie: true
                ",
            )?;
            jail.create_file("override.json", r#"{ "auth": { "clientId": "override" } }"#)?;

            let figment = Figment::new()
                .merge(Yaml::file("base.yaml"))
                .merge(Json::file("override.json"));
            let config = Configuration::load(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config.client_id(), "override");
            assert!(config.cache().store_auth_state_in_cookie());

            Ok(())
        });
    }

    #[test]
    fn load_invalid() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    auth:
                      clientId: client
                    system:
                      windowHashTimeout: -5
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let error = Configuration::load(&figment).unwrap_err();
            assert!(error.to_string().contains("system.windowHashTimeout"));

            Ok(())
        });
    }
}
