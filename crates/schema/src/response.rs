// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The result of a successful token request.

use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    account::AccountInfo,
    claims::{CompleteTokenClaims, IdTokenClaims},
    errors::SchemaError,
    schema::{Entity, EntitySchema, FieldSpec, Fields, Generation},
    value::{Extensions, Timestamp, ValueKind},
};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("uniqueId", ValueKind::String, Generation::V1),
    FieldSpec::required("tenantId", ValueKind::String, Generation::V1),
    FieldSpec::required("scopes", ValueKind::StringSeq, Generation::V1),
    FieldSpec::required("account", ValueKind::Entity("AccountInfo"), Generation::V1),
    FieldSpec::required("idToken", ValueKind::String, Generation::V1),
    FieldSpec::required(
        "idTokenClaims",
        ValueKind::Entity("CompleteTokenClaims"),
        Generation::V1,
    ),
    FieldSpec::required("accessToken", ValueKind::String, Generation::V1),
    FieldSpec::required("fromCache", ValueKind::Bool, Generation::V1),
    FieldSpec::required("expiresOn", ValueKind::Timestamp, Generation::V1),
    FieldSpec::optional("extExpiresOn", ValueKind::Timestamp, Generation::V1),
    FieldSpec::optional("state", ValueKind::String, Generation::V1),
    FieldSpec::optional("familyId", ValueKind::String, Generation::V1),
];

/// The tokens and account returned by the identity client.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResult {
    /// The identifier of the user within the tenant.
    pub unique_id: String,

    /// The tenant the tokens were issued by.
    pub tenant_id: String,

    /// The scopes granted.
    pub scopes: Vec<String>,

    /// The signed-in account.
    pub account: AccountInfo,

    /// The raw ID token.
    pub id_token: String,

    /// The claims of the ID token.
    pub id_token_claims: CompleteTokenClaims,

    /// The raw access token.
    pub access_token: String,

    /// Whether the result was served without a network round trip.
    pub from_cache: bool,

    /// When the access token expires.
    pub expires_on: Timestamp,

    /// When the access token expires if the identity provider is unavailable.
    pub ext_expires_on: Option<Timestamp>,

    /// The state sent in the request.
    pub state: Option<String>,

    /// The family of clients sharing refresh tokens.
    pub family_id: Option<String>,

    /// Fields not covered by the schema.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl AuthenticationResult {
    /// The claims of the ID token, seen as ID token claims.
    #[must_use]
    pub fn id_token_view(&self) -> IdTokenClaims {
        IdTokenClaims::from(self.id_token_claims.clone())
    }

    /// Whether the access token is expired at the given time.
    #[must_use]
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        self.expires_on.as_datetime() <= now.as_datetime()
    }
}

impl Entity for AuthenticationResult {
    const SCHEMA: EntitySchema = EntitySchema::new("AuthenticationResult", &[FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            unique_id: fields.required("uniqueId")?,
            tenant_id: fields.required("tenantId")?,
            scopes: fields.required("scopes")?,
            account: fields.required_entity("account")?,
            id_token: fields.required("idToken")?,
            id_token_claims: fields.required_entity("idTokenClaims")?,
            access_token: fields.required("accessToken")?,
            from_cache: fields.required("fromCache")?,
            expires_on: fields.required("expiresOn")?,
            ext_expires_on: fields.optional("extExpiresOn")?,
            state: fields.optional("state")?,
            family_id: fields.optional("familyId")?,
            extensions: fields.into_extensions(),
        })
    }
}

crate::impl_dynamic_conversions!(AuthenticationResult);

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::{
        errors::Violation,
        value::TimestampFormat,
        test_utils::{account_value, assert_serde_json},
    };

    fn response_value() -> serde_json::Value {
        json!({
            "uniqueId": "uniqueId",
            "tenantId": "tenantId",
            "scopes": ["scopes"],
            "account": account_value(),
            "idToken": "idToken",
            "idTokenClaims": { "typ": "JWT" },
            "accessToken": "accessToken",
            "fromCache": true,
            "expiresOn": "Thu Aug 06 2020 10:35:12 GMT+1000 (Australian Eastern Standard Time)",
            "extExpiresOn": "Thu Aug 06 2020 10:35:12 GMT+1000 (Australian Eastern Standard Time)",
            "state": "state",
            "familyId": "familyId",
        })
    }

    #[test]
    fn parse_response() {
        let result = AuthenticationResult::from_dynamic(response_value()).unwrap();

        assert!(result.from_cache);
        assert_eq!(result.account.username, "username");
        assert_eq!(result.id_token_claims.typ.as_deref(), Some("JWT"));
        assert_eq!(result.expires_on.unix_seconds(), 1_596_674_112);
        assert_eq!(result.ext_expires_on.as_ref(), Some(&result.expires_on));
        assert_eq!(result.id_token_view().typ.as_deref(), Some("JWT"));

        insta::assert_json_snapshot!(result, @r###"
        {
          "uniqueId": "uniqueId",
          "tenantId": "tenantId",
          "scopes": [
            "scopes"
          ],
          "account": {
            "homeAccountId": "homeAccountId",
            "environment": "environment",
            "tenantId": "tenantId",
            "username": "username"
          },
          "idToken": "idToken",
          "idTokenClaims": {
            "typ": "JWT"
          },
          "accessToken": "accessToken",
          "fromCache": true,
          "expiresOn": "Thu Aug 06 2020 10:35:12 GMT+1000 (Australian Eastern Standard Time)",
          "extExpiresOn": "Thu Aug 06 2020 10:35:12 GMT+1000 (Australian Eastern Standard Time)",
          "state": "state",
          "familyId": "familyId"
        }
        "###);
    }

    #[test]
    fn serde() {
        let result = AuthenticationResult::from_dynamic(response_value()).unwrap();
        assert_serde_json(&result, response_value());
    }

    #[test]
    fn timestamps_keep_their_shape() {
        let mut value = response_value();
        value["expiresOn"] = json!(1_596_674_112);
        value["extExpiresOn"] = json!("2020-08-06T00:35:12.000Z");

        let result = AuthenticationResult::from_dynamic(value.clone()).unwrap();
        assert_eq!(result.expires_on.format(), TimestampFormat::UnixSeconds);
        assert_eq!(
            result.ext_expires_on.as_ref().map(Timestamp::format),
            Some(TimestampFormat::Rfc3339)
        );
        assert_eq!(
            result.ext_expires_on.as_ref().map(Timestamp::as_datetime),
            Some(result.expires_on.as_datetime())
        );
        assert_serde_json(&result, value);

        let again = AuthenticationResult::from_dynamic(serde_json::to_value(&result).unwrap())
            .unwrap();
        assert_eq!(again, result);
    }

    #[test]
    fn expiry() {
        let result = AuthenticationResult::from_dynamic(response_value()).unwrap();
        let before = Timestamp::from_unix_seconds(1_596_674_000).unwrap();
        let after = Timestamp::from_unix_seconds(1_596_674_200).unwrap();

        assert!(!result.is_expired_at(&before));
        assert!(result.is_expired_at(&after));

        // The shape does not matter
        let at = Timestamp::parse_str("2020-08-06T00:35:12Z").unwrap();
        assert!(result.is_expired_at(&at));
    }

    #[test]
    fn invalid_nested_entities() {
        let mut value = response_value();
        value["account"]["homeAccountId"] = json!(42);

        let error = AuthenticationResult::from_dynamic(value).unwrap_err();
        assert_eq!(error.entity(), "AuthenticationResult");
        assert_eq!(error.path(), &"account.homeAccountId");
        assert_matches!(
            error,
            SchemaError::SchemaViolation {
                violation: Violation::WrongType { found: "number", .. },
                ..
            }
        );

        let mut value = response_value();
        value["expiresOn"] = json!("tomorrow");
        let error = AuthenticationResult::from_dynamic(value).unwrap_err();
        assert_eq!(error.path(), &"expiresOn");

        let mut value = response_value();
        value.as_object_mut().unwrap().remove("extExpiresOn");
        value.as_object_mut().unwrap().remove("familyId");
        let result = AuthenticationResult::from_dynamic(value).unwrap();
        assert_eq!(result.ext_expires_on, None);
        assert_eq!(result.family_id, None);
    }
}
