// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use msal_schema::{
    Entity, EntitySchema, Extensions, FieldSpec, Fields, Generation, SchemaError, ValueKind,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;

use crate::{
    ConfigurationSection,
    schema::{Hostname, Uri},
};

/// The authority used when none is configured
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/common";

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_owned()
}

fn default_authority_value() -> Value {
    Value::String(default_authority())
}

fn default_known_authorities() -> Value {
    Value::Array(Vec::new())
}

const fn default_navigate_to_login_request_url() -> bool {
    true
}

fn default_navigate_to_login_request_url_value() -> Value {
    Value::Bool(default_navigate_to_login_request_url())
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("clientId", ValueKind::String, Generation::V1).non_empty(),
    FieldSpec::optional("authority", ValueKind::String, Generation::V1)
        .with_default(default_authority_value),
    FieldSpec::optional("knownAuthorities", ValueKind::StringSeq, Generation::V2)
        .with_default(default_known_authorities),
    FieldSpec::optional("cloudDiscoveryMetadata", ValueKind::String, Generation::V2),
    FieldSpec::optional("redirectUri", ValueKind::String, Generation::V1),
    FieldSpec::optional("postLogoutRedirectUri", ValueKind::String, Generation::V2),
    FieldSpec::optional("navigateToLoginRequestUrl", ValueKind::Bool, Generation::V2)
        .with_default(default_navigate_to_login_request_url_value),
];

/// Options identifying the application and where it signs users in
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthOptions {
    /// The ID of the application, as registered with the identity provider
    pub client_id: String,

    /// The authority to request tokens from. Defaults to
    /// `https://login.microsoftonline.com/common`
    #[schemars(with = "Uri", default = "default_authority")]
    pub authority: String,

    /// Hosts trusted as authorities without going through discovery.
    /// Defaults to none
    ///
    /// Unset when the options were read with a generation which does not
    /// know this option.
    #[schemars(with = "Option<Vec<Hostname>>")]
    pub known_authorities: Option<Vec<String>>,

    /// Cloud discovery metadata, as a JSON string, to skip the discovery
    /// request
    pub cloud_discovery_metadata: Option<String>,

    /// Where the authorization server sends the user back to
    #[schemars(with = "Option<Uri>")]
    pub redirect_uri: Option<String>,

    /// Where the user lands after signing out
    #[schemars(with = "Option<Uri>")]
    pub post_logout_redirect_uri: Option<String>,

    /// Whether to navigate back to the page which started the login after a
    /// redirect. Defaults to `true`
    pub navigate_to_login_request_url: Option<bool>,

    /// Options not covered by the schema
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl AuthOptions {
    /// Create options for the given application, with every other option
    /// defaulted
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            authority: default_authority(),
            known_authorities: Some(Vec::new()),
            cloud_discovery_metadata: None,
            redirect_uri: None,
            post_logout_redirect_uri: None,
            navigate_to_login_request_url: Some(default_navigate_to_login_request_url()),
            extensions: Extensions::new(),
        }
    }

    /// Set the authority
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// The hosts trusted as authorities
    #[must_use]
    pub fn known_authorities(&self) -> &[String] {
        self.known_authorities.as_deref().unwrap_or_default()
    }

    /// Whether to navigate back to the page which started the login
    #[must_use]
    pub fn navigate_to_login_request_url(&self) -> bool {
        self.navigate_to_login_request_url
            .unwrap_or_else(default_navigate_to_login_request_url)
    }

    /// Set the hosts trusted as authorities
    #[must_use]
    pub fn with_known_authorities<I, S>(mut self, known_authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_authorities = Some(known_authorities.into_iter().map(Into::into).collect());
        self
    }

    /// Set the cloud discovery metadata
    #[must_use]
    pub fn with_cloud_discovery_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.cloud_discovery_metadata = Some(metadata.into());
        self
    }

    /// Set the redirect URI
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Set the URI the user lands on after signing out
    #[must_use]
    pub fn with_post_logout_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.post_logout_redirect_uri = Some(uri.into());
        self
    }

    /// Set whether to navigate back to the page which started the login
    #[must_use]
    pub fn with_navigate_to_login_request_url(mut self, navigate: bool) -> Self {
        self.navigate_to_login_request_url = Some(navigate);
        self
    }
}

impl From<&str> for AuthOptions {
    fn from(client_id: &str) -> Self {
        Self::new(client_id)
    }
}

impl From<String> for AuthOptions {
    fn from(client_id: String) -> Self {
        Self::new(client_id)
    }
}

impl Entity for AuthOptions {
    const SCHEMA: EntitySchema = EntitySchema::new("AuthOptions", &[FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            client_id: fields.required("clientId")?,
            authority: fields
                .optional("authority")?
                .unwrap_or_else(default_authority),
            known_authorities: fields.optional("knownAuthorities")?,
            cloud_discovery_metadata: fields.optional("cloudDiscoveryMetadata")?,
            redirect_uri: fields.optional("redirectUri")?,
            post_logout_redirect_uri: fields.optional("postLogoutRedirectUri")?,
            navigate_to_login_request_url: fields.optional("navigateToLoginRequestUrl")?,
            extensions: fields.into_extensions(),
        })
    }
}

msal_schema::impl_dynamic_conversions!(AuthOptions);

impl ConfigurationSection for AuthOptions {
    const PATH: Option<&'static str> = Some("auth");

    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        let metadata = figment.find_metadata("auth");

        if !self.authority.starts_with("https://") {
            let mut error = figment::error::Error::from(format!(
                "authority {:?} must be an https URL",
                self.authority
            ));
            error.metadata = metadata.cloned();
            error.profile = Some(figment::Profile::Default);
            error.path = vec!["auth".to_owned(), "authority".to_owned()];
            return Err(error.into());
        }

        Ok(())
    }
}
