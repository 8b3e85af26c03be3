// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Requests handed to the identity client.
//!
//! Each request variant is its own type, so that a request of one shape
//! cannot be passed where another is expected. [`Request`] gathers them for
//! callers which only know the kind of request at runtime.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::{
    account::AccountInfo,
    errors::{SchemaError, Violation},
    schema::{Entity, EntitySchema, FieldSpec, Fields, Generation, Reconciler},
    value::{Extensions, ValueKind},
};

/// How the authorization server returns the result of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// In the query string of the redirect URI.
    Query,

    /// In the fragment of the redirect URI.
    Fragment,

    /// In a form posted to the redirect URI.
    FormPost,
}

impl ResponseMode {
    /// The names used in dynamic objects.
    pub const NAMES: &'static [&'static str] = &["query", "fragment", "form_post"];

    /// Get the string representation of this response mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Fragment => "fragment",
            Self::FormPost => "form_post",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error when parsing a [`ResponseMode`] from a string.
#[derive(Debug, Clone, Error)]
#[error("Invalid response mode {0:?}")]
pub struct InvalidResponseModeError(String);

impl FromStr for ResponseMode {
    type Err = InvalidResponseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "fragment" => Ok(Self::Fragment),
            "form_post" => Ok(Self::FormPost),
            s => Err(InvalidResponseModeError(s.to_owned())),
        }
    }
}

const BASE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("scopes", ValueKind::StringSeq, Generation::V1).non_empty(),
    FieldSpec::optional("authority", ValueKind::String, Generation::V1),
    FieldSpec::optional("correlationId", ValueKind::String, Generation::V1),
];

/// The fields shared by all the token requests.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseAuthRequest {
    /// The scopes requested, never empty.
    pub scopes: Vec<String>,

    /// The authority to request tokens from, overriding the configured one.
    pub authority: Option<String>,

    /// An identifier used to correlate the request with server logs.
    pub correlation_id: Option<String>,
}

impl BaseAuthRequest {
    pub(crate) fn new<I, S>(entity: &'static str, scopes: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes: Vec<String> = scopes.into_iter().map(Into::into).collect();
        if scopes.is_empty() {
            return Err(SchemaError::violation(entity, "scopes", Violation::Empty));
        }

        Ok(Self {
            scopes,
            authority: None,
            correlation_id: None,
        })
    }

    fn take(fields: &mut Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            scopes: fields.required("scopes")?,
            authority: fields.optional("authority")?,
            correlation_id: fields.optional("correlationId")?,
        })
    }
}

const AUTHORIZATION_URL_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("redirectUri", ValueKind::String, Generation::V1),
    FieldSpec::optional("extraScopesToConsent", ValueKind::StringSeq, Generation::V2),
    FieldSpec::optional(
        "responseMode",
        ValueKind::Enum(ResponseMode::NAMES),
        Generation::V2,
    ),
    FieldSpec::optional("codeChallenge", ValueKind::String, Generation::V2),
    FieldSpec::optional("codeChallengeMethod", ValueKind::String, Generation::V2),
    FieldSpec::optional("state", ValueKind::String, Generation::V2),
    FieldSpec::optional("prompt", ValueKind::String, Generation::V2),
    FieldSpec::optional("loginHint", ValueKind::String, Generation::V1),
    FieldSpec::optional("sid", ValueKind::String, Generation::V2),
    FieldSpec::optional("domainHint", ValueKind::String, Generation::V2),
    FieldSpec::optional("extraQueryParameters", ValueKind::StringMap, Generation::V2),
    FieldSpec::optional("claims", ValueKind::String, Generation::V2),
    FieldSpec::optional("nonce", ValueKind::String, Generation::V2),
];

/// A request which results in a navigation to the authorization endpoint.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationUrlRequest {
    /// The fields shared by all the token requests.
    #[serde(flatten)]
    pub base: BaseAuthRequest,

    /// Where the authorization server redirects after the request.
    pub redirect_uri: Option<String>,

    /// Scopes to consent to, without getting a token for them.
    pub extra_scopes_to_consent: Option<Vec<String>>,

    /// How the result is returned.
    pub response_mode: Option<ResponseMode>,

    /// The PKCE code challenge.
    pub code_challenge: Option<String>,

    /// The method used to derive the code challenge.
    pub code_challenge_method: Option<String>,

    /// An opaque value returned in the response.
    pub state: Option<String>,

    /// The kind of user interaction required.
    pub prompt: Option<String>,

    /// A hint about the account to sign in with.
    pub login_hint: Option<String>,

    /// The session ID to reuse.
    pub sid: Option<String>,

    /// A hint about the tenant of the account.
    pub domain_hint: Option<String>,

    /// Additional parameters appended to the authorization URL.
    pub extra_query_parameters: Option<IndexMap<String, String>>,

    /// The claims requested, as a JSON string.
    pub claims: Option<String>,

    /// A value bound to the ID token.
    pub nonce: Option<String>,

    /// Fields not covered by the schema.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl AuthorizationUrlRequest {
    /// Create a new request for the given scopes.
    ///
    /// # Errors
    ///
    /// Returns an error if no scope is given.
    pub fn new<I, S>(scopes: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BaseAuthRequest::new(Self::SCHEMA.name(), scopes).map(Self::with_base)
    }

    fn with_base(base: BaseAuthRequest) -> Self {
        Self {
            base,
            redirect_uri: None,
            extra_scopes_to_consent: None,
            response_mode: None,
            code_challenge: None,
            code_challenge_method: None,
            state: None,
            prompt: None,
            login_hint: None,
            sid: None,
            domain_hint: None,
            extra_query_parameters: None,
            claims: None,
            nonce: None,
            extensions: Extensions::new(),
        }
    }

    /// Set the authority.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.base.authority = Some(authority.into());
        self
    }

    /// Set the correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.base.correlation_id = Some(correlation_id.into());
        self
    }

    /// Set the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Set the scopes to consent to.
    #[must_use]
    pub fn with_extra_scopes_to_consent<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_scopes_to_consent = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Set the response mode.
    #[must_use]
    pub fn with_response_mode(mut self, response_mode: ResponseMode) -> Self {
        self.response_mode = Some(response_mode);
        self
    }

    /// Set the PKCE code challenge and its method.
    #[must_use]
    pub fn with_code_challenge(
        mut self,
        code_challenge: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        self.code_challenge = Some(code_challenge.into());
        self.code_challenge_method = Some(method.into());
        self
    }

    /// Set the state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Set the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the login hint.
    #[must_use]
    pub fn with_login_hint(mut self, login_hint: impl Into<String>) -> Self {
        self.login_hint = Some(login_hint.into());
        self
    }

    /// Set the session ID.
    #[must_use]
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Set the domain hint.
    #[must_use]
    pub fn with_domain_hint(mut self, domain_hint: impl Into<String>) -> Self {
        self.domain_hint = Some(domain_hint.into());
        self
    }

    /// Add a parameter to the authorization URL.
    #[must_use]
    pub fn with_extra_query_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.extra_query_parameters
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the claims requested.
    #[must_use]
    pub fn with_claims(mut self, claims: impl Into<String>) -> Self {
        self.claims = Some(claims.into());
        self
    }

    /// Set the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

impl Entity for AuthorizationUrlRequest {
    const SCHEMA: EntitySchema =
        EntitySchema::new("AuthorizationUrlRequest", &[BASE_FIELDS, AUTHORIZATION_URL_FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            base: BaseAuthRequest::take(&mut fields)?,
            redirect_uri: fields.optional("redirectUri")?,
            extra_scopes_to_consent: fields.optional("extraScopesToConsent")?,
            response_mode: fields.optional("responseMode")?,
            code_challenge: fields.optional("codeChallenge")?,
            code_challenge_method: fields.optional("codeChallengeMethod")?,
            state: fields.optional("state")?,
            prompt: fields.optional("prompt")?,
            login_hint: fields.optional("loginHint")?,
            sid: fields.optional("sid")?,
            domain_hint: fields.optional("domainHint")?,
            extra_query_parameters: fields.optional("extraQueryParameters")?,
            claims: fields.optional("claims")?,
            nonce: fields.optional("nonce")?,
            extensions: fields.into_extensions(),
        })
    }
}

/// Requests made through a popup window have the same shape.
pub type PopupRequest = AuthorizationUrlRequest;

const REDIRECT_FIELDS: &[FieldSpec] = &[FieldSpec::optional(
    "redirectStartPage",
    ValueKind::String,
    Generation::V2,
)];

/// A request made by navigating the whole page to the authorization server.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRequest {
    /// The fields of the authorization URL.
    #[serde(flatten)]
    pub authorization: AuthorizationUrlRequest,

    /// The page to navigate back to once the redirect is handled.
    pub redirect_start_page: Option<String>,
}

impl RedirectRequest {
    /// Create a new request for the given scopes.
    ///
    /// # Errors
    ///
    /// Returns an error if no scope is given.
    pub fn new<I, S>(scopes: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let base = BaseAuthRequest::new(Self::SCHEMA.name(), scopes)?;
        Ok(Self {
            authorization: AuthorizationUrlRequest::with_base(base),
            redirect_start_page: None,
        })
    }

    /// Set the page to navigate back to.
    #[must_use]
    pub fn with_redirect_start_page(mut self, redirect_start_page: impl Into<String>) -> Self {
        self.redirect_start_page = Some(redirect_start_page.into());
        self
    }

    /// Change the fields of the authorization URL.
    #[must_use]
    pub fn map_authorization(
        mut self,
        f: impl FnOnce(AuthorizationUrlRequest) -> AuthorizationUrlRequest,
    ) -> Self {
        self.authorization = f(self.authorization);
        self
    }
}

impl From<AuthorizationUrlRequest> for RedirectRequest {
    fn from(authorization: AuthorizationUrlRequest) -> Self {
        Self {
            authorization,
            redirect_start_page: None,
        }
    }
}

impl Entity for RedirectRequest {
    const SCHEMA: EntitySchema = EntitySchema::new(
        "RedirectRequest",
        &[BASE_FIELDS, AUTHORIZATION_URL_FIELDS, REDIRECT_FIELDS],
    );

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        let redirect_start_page = fields.optional("redirectStartPage")?;
        Ok(Self {
            authorization: AuthorizationUrlRequest::from_fields(fields)?,
            redirect_start_page,
        })
    }
}

const SILENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("account", ValueKind::Entity("AccountInfo"), Generation::V1),
    FieldSpec::optional("forceRefresh", ValueKind::Bool, Generation::V1),
    FieldSpec::optional("redirectUri", ValueKind::String, Generation::V1),
    FieldSpec::optional("extraQueryParameters", ValueKind::StringMap, Generation::V2),
    FieldSpec::optional("claims", ValueKind::String, Generation::V2),
];

/// A request for a token from the cache, or refreshed without interaction.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SilentRequest {
    /// The fields shared by all the token requests.
    #[serde(flatten)]
    pub base: BaseAuthRequest,

    /// The account to get a token for.
    pub account: AccountInfo,

    /// Skip the cache and always refresh the token.
    pub force_refresh: Option<bool>,

    /// The redirect URI used by the hidden frame.
    pub redirect_uri: Option<String>,

    /// Additional parameters appended to the authorization URL.
    pub extra_query_parameters: Option<IndexMap<String, String>>,

    /// The claims requested, as a JSON string.
    pub claims: Option<String>,

    /// Fields not covered by the schema.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl SilentRequest {
    /// Create a new request for the given scopes, on behalf of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if no scope is given.
    pub fn new<I, S>(scopes: I, account: AccountInfo) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            base: BaseAuthRequest::new(Self::SCHEMA.name(), scopes)?,
            account,
            force_refresh: None,
            redirect_uri: None,
            extra_query_parameters: None,
            claims: None,
            extensions: Extensions::new(),
        })
    }

    /// Set the authority.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.base.authority = Some(authority.into());
        self
    }

    /// Set the correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.base.correlation_id = Some(correlation_id.into());
        self
    }

    /// Skip the cache.
    #[must_use]
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = Some(force_refresh);
        self
    }

    /// Set the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Add a parameter to the authorization URL.
    #[must_use]
    pub fn with_extra_query_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.extra_query_parameters
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the claims requested.
    #[must_use]
    pub fn with_claims(mut self, claims: impl Into<String>) -> Self {
        self.claims = Some(claims.into());
        self
    }
}

impl Entity for SilentRequest {
    const SCHEMA: EntitySchema = EntitySchema::new("SilentRequest", &[BASE_FIELDS, SILENT_FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            base: BaseAuthRequest::take(&mut fields)?,
            account: fields.required_entity("account")?,
            force_refresh: fields.optional("forceRefresh")?,
            redirect_uri: fields.optional("redirectUri")?,
            extra_query_parameters: fields.optional("extraQueryParameters")?,
            claims: fields.optional("claims")?,
            extensions: fields.into_extensions(),
        })
    }
}

const END_SESSION_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("account", ValueKind::Entity("AccountInfo"), Generation::V1),
    FieldSpec::optional("postLogoutRedirectUri", ValueKind::String, Generation::V1),
    FieldSpec::optional("authority", ValueKind::String, Generation::V1),
    FieldSpec::optional("correlationId", ValueKind::String, Generation::V1),
];

/// A request to sign out.
///
/// Without an account, all the accounts are signed out.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    /// The account to sign out.
    pub account: Option<AccountInfo>,

    /// Where to navigate after signing out.
    pub post_logout_redirect_uri: Option<String>,

    /// The authority to sign out from.
    pub authority: Option<String>,

    /// An identifier used to correlate the request with server logs.
    pub correlation_id: Option<String>,

    /// Fields not covered by the schema.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl EndSessionRequest {
    /// Create a request signing out all the accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign out a single account.
    #[must_use]
    pub fn with_account(mut self, account: AccountInfo) -> Self {
        self.account = Some(account);
        self
    }

    /// Set where to navigate after signing out.
    #[must_use]
    pub fn with_post_logout_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.post_logout_redirect_uri = Some(uri.into());
        self
    }

    /// Set the authority.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    /// Set the correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

impl Entity for EndSessionRequest {
    const SCHEMA: EntitySchema = EntitySchema::new("EndSessionRequest", &[END_SESSION_FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            account: fields.optional_entity("account")?,
            post_logout_redirect_uri: fields.optional("postLogoutRedirectUri")?,
            authority: fields.optional("authority")?,
            correlation_id: fields.optional("correlationId")?,
            extensions: fields.into_extensions(),
        })
    }
}

crate::impl_dynamic_conversions!(
    AuthorizationUrlRequest,
    RedirectRequest,
    SilentRequest,
    EndSessionRequest,
);

/// The kind of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    /// An [`AuthorizationUrlRequest`].
    AuthorizationUrl,

    /// A [`RedirectRequest`].
    Redirect,

    /// A [`SilentRequest`].
    Silent,

    /// An [`EndSessionRequest`].
    EndSession,
}

impl RequestKind {
    /// Get the string representation of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationUrl => "authorization-url",
            Self::Redirect => "redirect",
            Self::Silent => "silent",
            Self::EndSession => "end-session",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error when parsing a [`RequestKind`] from a string.
#[derive(Debug, Clone, Error)]
#[error("Invalid request kind {0:?}")]
pub struct InvalidRequestKindError(String);

impl FromStr for RequestKind {
    type Err = InvalidRequestKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization-url" => Ok(Self::AuthorizationUrl),
            "redirect" => Ok(Self::Redirect),
            "silent" => Ok(Self::Silent),
            "end-session" => Ok(Self::EndSession),
            s => Err(InvalidRequestKindError(s.to_owned())),
        }
    }
}

/// Any of the request variants.
///
/// Serialized with its kind next to the request, like
/// `{"kind": "silent", "request": {...}}`, so that it can be read back as the
/// same variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "request", rename_all = "kebab-case")]
pub enum Request {
    /// An [`AuthorizationUrlRequest`].
    AuthorizationUrl(AuthorizationUrlRequest),

    /// A [`RedirectRequest`].
    Redirect(RedirectRequest),

    /// A [`SilentRequest`].
    Silent(SilentRequest),

    /// An [`EndSessionRequest`].
    EndSession(EndSessionRequest),
}

impl Request {
    /// Build a request of the given kind from a dynamic object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not match the schema of that kind.
    pub fn from_dynamic(kind: RequestKind, value: Value) -> Result<Self, SchemaError> {
        Self::from_dynamic_with(kind, value, Reconciler::canonical())
    }

    /// Build a request of the given kind from a dynamic object, using a
    /// specific reconciler.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not match the schema of that kind.
    pub fn from_dynamic_with(
        kind: RequestKind,
        value: Value,
        reconciler: Reconciler,
    ) -> Result<Self, SchemaError> {
        Ok(match kind {
            RequestKind::AuthorizationUrl => {
                Self::AuthorizationUrl(AuthorizationUrlRequest::from_dynamic_with(value, reconciler)?)
            }
            RequestKind::Redirect => {
                Self::Redirect(RedirectRequest::from_dynamic_with(value, reconciler)?)
            }
            RequestKind::Silent => Self::Silent(SilentRequest::from_dynamic_with(value, reconciler)?),
            RequestKind::EndSession => {
                Self::EndSession(EndSessionRequest::from_dynamic_with(value, reconciler)?)
            }
        })
    }

    /// The kind of this request.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::AuthorizationUrl(_) => RequestKind::AuthorizationUrl,
            Self::Redirect(_) => RequestKind::Redirect,
            Self::Silent(_) => RequestKind::Silent,
            Self::EndSession(_) => RequestKind::EndSession,
        }
    }

    /// The account this request is made on behalf of, if any.
    #[must_use]
    pub fn account(&self) -> Option<&AccountInfo> {
        match self {
            Self::Silent(request) => Some(&request.account),
            Self::EndSession(request) => request.account.as_ref(),
            Self::AuthorizationUrl(_) | Self::Redirect(_) => None,
        }
    }

    /// The scopes requested, empty for sign-out requests.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        match self {
            Self::AuthorizationUrl(request) => &request.base.scopes,
            Self::Redirect(request) => &request.authorization.base.scopes,
            Self::Silent(request) => &request.base.scopes,
            Self::EndSession(_) => &[],
        }
    }

    /// The correlation ID of this request, if any.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Self::AuthorizationUrl(request) => request.base.correlation_id.as_deref(),
            Self::Redirect(request) => request.authorization.base.correlation_id.as_deref(),
            Self::Silent(request) => request.base.correlation_id.as_deref(),
            Self::EndSession(request) => request.correlation_id.as_deref(),
        }
    }
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Tagged {
            kind: RequestKind,
            request: Value,
        }

        let Tagged { kind, request } = Tagged::deserialize(deserializer)?;
        Self::from_dynamic(kind, request).map_err(serde::de::Error::custom)
    }
}

impl From<AuthorizationUrlRequest> for Request {
    fn from(request: AuthorizationUrlRequest) -> Self {
        Self::AuthorizationUrl(request)
    }
}

impl From<RedirectRequest> for Request {
    fn from(request: RedirectRequest) -> Self {
        Self::Redirect(request)
    }
}

impl From<SilentRequest> for Request {
    fn from(request: SilentRequest) -> Self {
        Self::Silent(request)
    }
}

impl From<EndSessionRequest> for Request {
    fn from(request: EndSessionRequest) -> Self {
        Self::EndSession(request)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::test_utils::{account_value, assert_serde_json};

    fn account() -> AccountInfo {
        AccountInfo::new("homeAccountId", "environment", "tenantId", "username").unwrap()
    }

    #[test]
    fn serde_authorization_url_request() {
        let request = AuthorizationUrlRequest::new(["openid", "profile"])
            .unwrap()
            .with_login_hint("alice@contoso.com")
            .with_response_mode(ResponseMode::FormPost)
            .with_extra_query_parameter("dc", "ESTS-PUB-WUS2-AZ1-FD000-TEST1")
            .with_correlation_id("c0ffee");

        assert_serde_json(
            &request,
            json!({
                "scopes": ["openid", "profile"],
                "correlationId": "c0ffee",
                "responseMode": "form_post",
                "loginHint": "alice@contoso.com",
                "extraQueryParameters": { "dc": "ESTS-PUB-WUS2-AZ1-FD000-TEST1" },
            }),
        );
    }

    #[test]
    fn serde_redirect_request() {
        let request = RedirectRequest::new(["User.Read"])
            .unwrap()
            .with_redirect_start_page("https://app.example.com/start")
            .map_authorization(|request| request.with_state("xyz"));

        insta::assert_json_snapshot!(request, @r###"
        {
          "scopes": [
            "User.Read"
          ],
          "state": "xyz",
          "redirectStartPage": "https://app.example.com/start"
        }
        "###);

        assert_serde_json(
            &request,
            json!({
                "scopes": ["User.Read"],
                "state": "xyz",
                "redirectStartPage": "https://app.example.com/start",
            }),
        );
    }

    #[test]
    fn serde_silent_request() {
        let request = SilentRequest::new(["User.Read"], account())
            .unwrap()
            .with_force_refresh(true);

        assert_serde_json(
            &request,
            json!({
                "scopes": ["User.Read"],
                "account": account_value(),
                "forceRefresh": true,
            }),
        );
    }

    #[test]
    fn serde_end_session_request() {
        assert_serde_json(&EndSessionRequest::new(), json!({}));

        let request = EndSessionRequest::new()
            .with_account(account())
            .with_post_logout_redirect_uri("https://app.example.com/");
        assert_serde_json(
            &request,
            json!({
                "account": account_value(),
                "postLogoutRedirectUri": "https://app.example.com/",
            }),
        );
    }

    #[test]
    fn scopes_must_not_be_empty() {
        let error = AuthorizationUrlRequest::new(Vec::<String>::new()).unwrap_err();
        assert_matches!(
            error,
            SchemaError::SchemaViolation {
                entity: "AuthorizationUrlRequest",
                violation: Violation::Empty,
                ..
            }
        );

        let error = RedirectRequest::from_dynamic(json!({ "scopes": [] })).unwrap_err();
        assert_eq!(error.entity(), "RedirectRequest");
        assert_eq!(error.path(), &"scopes");
    }

    #[test]
    fn unknown_response_mode() {
        let error = AuthorizationUrlRequest::from_dynamic(json!({
            "scopes": ["openid"],
            "responseMode": "web_message",
        }))
        .unwrap_err();

        assert_matches!(
            error,
            SchemaError::UnknownEnumValue { ref value, expected, .. }
                if value == "web_message" && expected == ResponseMode::NAMES
        );
    }

    #[test]
    fn silent_request_requires_an_account() {
        let error = SilentRequest::from_dynamic(json!({ "scopes": ["User.Read"] })).unwrap_err();
        assert_eq!(error.path(), &"account");

        let error = SilentRequest::from_dynamic(json!({
            "scopes": ["User.Read"],
            "account": { "homeAccountId": "homeAccountId", "environment": "environment", "tenantId": "tenantId" },
        }))
        .unwrap_err();
        assert_eq!(error.entity(), "SilentRequest");
        assert_eq!(error.path(), &"account.username");
    }

    #[test]
    fn silent_request_requires_scopes() {
        let error = SilentRequest::from_dynamic(json!({ "account": account_value() })).unwrap_err();
        assert_eq!(error.entity(), "SilentRequest");
        assert_eq!(error.path(), &"scopes");
        assert_matches!(
            error,
            SchemaError::SchemaViolation {
                violation: Violation::Missing { .. },
                ..
            }
        );
    }

    #[test]
    fn v1_shaped_requests() {
        let request = SilentRequest::from_dynamic_with(
            json!({ "scopes": ["User.Read"], "account": account_value(), "claims": "{}" }),
            Reconciler::strict(Generation::V1),
        )
        .unwrap();

        // Claims were only introduced later
        assert_eq!(request.claims, None);
        assert_eq!(request.extensions["claims"], json!("{}"));
    }

    #[test]
    fn dynamic_request() {
        let request = Request::from_dynamic(
            RequestKind::EndSession,
            json!({ "account": account_value(), "correlationId": "c0ffee" }),
        )
        .unwrap();

        assert_eq!(request.kind(), RequestKind::EndSession);
        assert_eq!(request.account(), Some(&account()));
        assert_eq!(request.correlation_id(), Some("c0ffee"));
        assert!(request.scopes().is_empty());

        let request: Request = RedirectRequest::new(["User.Read"]).unwrap().into();
        assert_eq!(request.scopes(), ["User.Read".to_owned()]);

        assert_eq!("silent".parse::<RequestKind>().unwrap(), RequestKind::Silent);
        assert!("popup".parse::<RequestKind>().is_err());
    }

    #[test]
    fn request_keeps_its_kind() {
        // Both requests serialize to the same object on their own
        let authorization: Request = AuthorizationUrlRequest::new(["User.Read"]).unwrap().into();
        let redirect: Request = RedirectRequest::new(["User.Read"]).unwrap().into();

        assert_serde_json(
            &authorization,
            json!({ "kind": "authorization-url", "request": { "scopes": ["User.Read"] } }),
        );
        assert_serde_json(
            &redirect,
            json!({ "kind": "redirect", "request": { "scopes": ["User.Read"] } }),
        );

        let silent: Request = SilentRequest::new(["User.Read"], account()).unwrap().into();
        assert_serde_json(
            &silent,
            json!({
                "kind": "silent",
                "request": { "scopes": ["User.Read"], "account": account_value() },
            }),
        );
    }

    #[test]
    fn request_rejects_invalid_payloads() {
        let error = serde_json::from_value::<Request>(json!({
            "kind": "silent",
            "request": { "scopes": ["User.Read"] },
        }))
        .unwrap_err();
        assert!(error.to_string().contains("account"));

        assert!(
            serde_json::from_value::<Request>(json!({ "kind": "popup", "request": {} })).is_err()
        );
        assert!(serde_json::from_value::<Request>(json!({ "scopes": ["User.Read"] })).is_err());
    }
}
