// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Claims carried by access and ID tokens.
//!
//! All the claims are normalized into [`CompleteTokenClaims`], the union of
//! every claim name known to the identity provider. [`AccessTokenClaims`] and
//! [`IdTokenClaims`] are views over it, exposing the subset relevant to each
//! token. Claim values are not interpreted: signatures and expiry are not
//! checked.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::{
    errors::SchemaError,
    schema::{Entity, EntitySchema, FieldSpec, Fields, Generation},
    value::{Extensions, ValueKind},
};

/// The audience of a token, either a single value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience.
    Single(String),

    /// Multiple audiences.
    Multiple(Vec<String>),
}

impl Audience {
    /// Iterate over the audiences.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice = match self {
            Self::Single(audience) => std::slice::from_ref(audience),
            Self::Multiple(audiences) => audiences.as_slice(),
        };

        slice.iter().map(String::as_str)
    }

    /// Whether the given client is part of the audience.
    #[must_use]
    pub fn contains(&self, client_id: &str) -> bool {
        self.iter().any(|audience| audience == client_id)
    }
}

macro_rules! token_claims {
    ($( $(#[$meta:meta])* $field:ident: $ty:ty => $kind:expr, $since:ident; )+) => {
        /// Every claim known to the identity provider.
        ///
        /// Absent claims are unset. Claims with an unknown name, or with a
        /// value of an unexpected type, end up in the extensions.
        #[skip_serializing_none]
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
        pub struct CompleteTokenClaims {
            $(
                $(#[$meta])*
                pub $field: Option<$ty>,
            )+

            /// Claims not covered by the schema.
            #[serde(flatten)]
            pub extensions: Extensions,
        }

        const CLAIM_FIELDS: &[FieldSpec] = &[
            $( FieldSpec::optional(stringify!($field), $kind, Generation::$since), )+
        ];

        impl CompleteTokenClaims {
            /// The names of all the known claims.
            pub const NAMES: &'static [&'static str] = &[ $( stringify!($field), )+ ];

            fn take(fields: &mut Fields) -> Result<Self, SchemaError> {
                Ok(Self {
                    $( $field: fields.optional(stringify!($field))?, )+
                    extensions: Extensions::new(),
                })
            }

            /// Get the value of a claim by its name, whether it is known or
            /// not.
            #[must_use]
            pub fn get(&self, name: &str) -> Option<Value> {
                let known = match name {
                    $(
                        stringify!($field) => self
                            .$field
                            .as_ref()
                            .and_then(|value| serde_json::to_value(value).ok()),
                    )+
                    _ => None,
                };

                known.or_else(|| self.extensions.get(name).cloned())
            }
        }
    };
}

token_claims! {
    /// The type of the token, always `JWT`.
    typ: String => ValueKind::String, V1;
    /// The nonce sent in the authorization request.
    nonce: String => ValueKind::String, V1;
    /// The signing algorithm.
    alg: String => ValueKind::String, V1;
    /// The identifier of the signing key.
    kid: String => ValueKind::String, V1;
    /// The thumbprint of the signing certificate.
    x5t: String => ValueKind::String, V2;
    /// The issuer.
    iss: String => ValueKind::String, V1;
    /// The subject.
    sub: String => ValueKind::String, V1;
    /// The audience.
    aud: Audience => ValueKind::StringOrSeq, V1;
    /// The expiration time, in Unix seconds.
    exp: i64 => ValueKind::Integer, V1;
    /// The time before which the token is not valid, in Unix seconds.
    nbf: i64 => ValueKind::Integer, V1;
    /// The issuance time, in Unix seconds.
    iat: i64 => ValueKind::Integer, V1;
    /// The unique identifier of the token.
    jti: String => ValueKind::String, V2;
    /// The full name of the user.
    name: String => ValueKind::String, V1;
    /// The given name of the user.
    given_name: String => ValueKind::String, V2;
    /// The family name of the user.
    family_name: String => ValueKind::String, V2;
    /// The middle name of the user.
    middle_name: String => ValueKind::String, V2;
    /// The casual name of the user.
    nickname: String => ValueKind::String, V2;
    /// The primary username of the user.
    preferred_username: String => ValueKind::String, V1;
    /// The URL of the profile page of the user.
    profile: String => ValueKind::String, V2;
    /// The URL of the picture of the user.
    picture: String => ValueKind::String, V2;
    /// The URL of the web page of the user.
    website: String => ValueKind::String, V2;
    /// The email address of the user.
    email: String => ValueKind::String, V2;
    /// Whether the email address was verified.
    email_verified: bool => ValueKind::Bool, V2;
    /// The gender of the user.
    gender: String => ValueKind::String, V2;
    /// The birthday of the user.
    birthdate: String => ValueKind::String, V2;
    /// The time zone of the user.
    zoneinfo: String => ValueKind::String, V2;
    /// The locale of the user.
    locale: String => ValueKind::String, V2;
    /// The phone number of the user.
    phone_number: String => ValueKind::String, V2;
    /// Whether the phone number was verified.
    phone_number_verified: bool => ValueKind::Bool, V2;
    /// The postal address of the user.
    address: Map<String, Value> => ValueKind::Object, V2;
    /// When the user information was last updated, in Unix seconds.
    updated_at: i64 => ValueKind::Integer, V2;
    /// Proof-of-possession confirmation.
    cnf: Map<String, Value> => ValueKind::Object, V2;
    /// The SIP From tag header field parameter value.
    sip_from_tag: String => ValueKind::String, V2;
    /// The SIP Date header field value, in Unix seconds.
    sip_date: i64 => ValueKind::Integer, V2;
    /// The SIP Call-Id header field value.
    sip_callid: String => ValueKind::String, V2;
    /// The SIP CSeq numeric header field parameter value.
    sip_cseq_num: String => ValueKind::String, V2;
    /// The SIP Via branch header field parameter value.
    sip_via_branch: String => ValueKind::String, V2;
    /// The originating identity.
    orig: Map<String, Value> => ValueKind::Object, V2;
    /// The destination identity.
    dest: Map<String, Value> => ValueKind::Object, V2;
    /// The media key fingerprint.
    mky: Map<String, Value> => ValueKind::Object, V2;
    /// The security events.
    events: Map<String, Value> => ValueKind::Object, V2;
    /// The time of the event, in Unix seconds.
    toe: i64 => ValueKind::Integer, V2;
    /// The transaction identifier.
    txn: String => ValueKind::String, V2;
    /// The resource priority header authorization.
    rph: Map<String, Value> => ValueKind::Object, V2;
    /// The session ID.
    sid: String => ValueKind::String, V2;
    /// The vector of trust value.
    vot: String => ValueKind::String, V2;
    /// The vector of trust trustmark URL.
    vtm: String => ValueKind::String, V2;
    /// The attestation level.
    attest: String => ValueKind::String, V2;
    /// The originating identifier.
    origid: String => ValueKind::String, V2;
    /// The acting party.
    act: Map<String, Value> => ValueKind::Object, V2;
    /// The scopes, separated by spaces.
    scope: String => ValueKind::String, V2;
    /// The client the token was issued to.
    client_id: String => ValueKind::String, V2;
    /// The parties authorized to act on behalf of the subject.
    may_act: Map<String, Value> => ValueKind::Object, V2;
    /// The contact information of the subject.
    jcard: Map<String, Value> => ValueKind::Object, V2;
    /// The number of API requests the token may be used for.
    at_use_nbr: i64 => ValueKind::Integer, V2;
    /// The diverted target of a call.
    div: Map<String, Value> => ValueKind::Object, V2;
    /// The original passport of a diverted call.
    opt: String => ValueKind::String, V2;
    /// The identity provider which authenticated the user.
    idp: String => ValueKind::String, V3;
    /// The version of the token.
    ver: String => ValueKind::String, V1;
    /// The immutable identifier of the user.
    oid: String => ValueKind::String, V1;
    /// The tenant of the user.
    tid: String => ValueKind::String, V1;
    /// An opaque value used by the provider to reuse tokens.
    aio: String => ValueKind::String, V1;
    /// The application which requested the token.
    azp: String => ValueKind::String, V1;
    /// How the client was authenticated.
    azpacr: String => ValueKind::String, V1;
    /// An opaque value used by the provider to revalidate tokens.
    rh: String => ValueKind::String, V1;
    /// The scopes granted, separated by spaces.
    scp: String => ValueKind::String, V1;
    /// The unique identifier of the token, used by the provider.
    uti: String => ValueKind::String, V1;
    /// The application which requested the token, in older tokens.
    appid: String => ValueKind::String, V3;
    /// The application roles granted to the user.
    roles: Vec<String> => ValueKind::StringSeq, V3;
    /// The directory roles of the user.
    wids: Vec<String> => ValueKind::StringSeq, V3;
    /// The groups of the user.
    groups: Vec<String> => ValueKind::StringSeq, V3;
    /// Whether the user is in too many groups to list them.
    hasgroups: bool => ValueKind::Bool, V3;
}

/// The reason why a set of claims is not consistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsInvariantError {
    /// A claim needed for the check is absent.
    #[error("missing `{0}` claim")]
    Missing(&'static str),

    /// The issuance time is not positive.
    #[error("`iat` must be positive, got {0}")]
    NonPositiveIssuedAt(i64),

    /// The token expires before it was issued.
    #[error("token expires at {exp}, before it was issued at {iat}")]
    ExpiresBeforeIssued {
        /// The issuance time.
        iat: i64,

        /// The expiration time.
        exp: i64,
    },

    /// The client is not part of the audience.
    #[error("audience does not contain the client {client_id:?}")]
    AudienceMismatch {
        /// The client ID which was expected.
        client_id: String,
    },
}

impl CompleteTokenClaims {
    /// Check that the token was issued before it expires, and that it is
    /// meant for the given client.
    ///
    /// # Errors
    ///
    /// Returns an error if `iat`, `exp` or `aud` are missing or inconsistent.
    pub fn check_invariants(&self, client_id: &str) -> Result<(), ClaimsInvariantError> {
        let iat = self.iat.ok_or(ClaimsInvariantError::Missing("iat"))?;
        let exp = self.exp.ok_or(ClaimsInvariantError::Missing("exp"))?;
        let aud = self
            .aud
            .as_ref()
            .ok_or(ClaimsInvariantError::Missing("aud"))?;

        if iat <= 0 {
            return Err(ClaimsInvariantError::NonPositiveIssuedAt(iat));
        }

        if exp <= iat {
            return Err(ClaimsInvariantError::ExpiresBeforeIssued { iat, exp });
        }

        if !aud.contains(client_id) {
            return Err(ClaimsInvariantError::AudienceMismatch {
                client_id: client_id.to_owned(),
            });
        }

        Ok(())
    }

    /// The known claims among the given names which are set, followed by
    /// all the extension claims.
    #[must_use]
    pub fn subset(&self, names: &[&str]) -> Map<String, Value> {
        let known = names
            .iter()
            .filter_map(|name| Some(((*name).to_owned(), self.get(name)?)));
        let extensions = self
            .extensions
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()));

        known.chain(extensions).collect()
    }

    /// Whether no claim is set at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Entity for CompleteTokenClaims {
    const SCHEMA: EntitySchema = EntitySchema::new("CompleteTokenClaims", &[CLAIM_FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        let mut claims = Self::take(&mut fields)?;
        claims.extensions = fields.into_extensions();
        Ok(claims)
    }
}

macro_rules! claims_view {
    ($(#[$meta:meta])* $name:ident, [$($claim:literal),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
        #[serde(transparent)]
        pub struct $name(CompleteTokenClaims);

        impl $name {
            /// The claims relevant to this token.
            pub const CLAIMS: &'static [&'static str] = &[$($claim),+];

            /// The relevant claims which are set, followed by the extension
            /// claims.
            #[must_use]
            pub fn subset(&self) -> Map<String, Value> {
                self.0.subset(Self::CLAIMS)
            }

            /// Get the full set of claims.
            #[must_use]
            pub fn into_complete(self) -> CompleteTokenClaims {
                self.0
            }
        }

        impl Deref for $name {
            type Target = CompleteTokenClaims;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<CompleteTokenClaims> for $name {
            fn from(claims: CompleteTokenClaims) -> Self {
                Self(claims)
            }
        }

        impl From<$name> for CompleteTokenClaims {
            fn from(view: $name) -> Self {
                view.0
            }
        }

        impl Entity for $name {
            const SCHEMA: EntitySchema = EntitySchema::new(stringify!($name), &[CLAIM_FIELDS]);

            fn from_fields(fields: Fields) -> Result<Self, SchemaError> {
                CompleteTokenClaims::from_fields(fields).map(Self)
            }
        }
    };
}

claims_view!(
    /// The claims of an access token.
    AccessTokenClaims,
    [
        "typ", "alg", "kid", "x5t", "iss", "sub", "aud", "exp", "nbf", "iat", "jti", "nonce",
        "name", "preferred_username", "idp", "ver", "oid", "tid", "aio", "azp", "azpacr", "rh",
        "scp", "uti", "appid", "roles", "wids", "groups", "hasgroups", "cnf", "act", "may_act",
        "scope", "client_id",
    ]
);

claims_view!(
    /// The claims of an ID token.
    IdTokenClaims,
    [
        "typ", "alg", "kid", "x5t", "iss", "sub", "aud", "exp", "nbf", "iat", "nonce", "sid",
        "name", "given_name", "family_name", "middle_name", "nickname", "preferred_username",
        "profile", "picture", "website", "email", "email_verified", "gender", "birthdate",
        "zoneinfo", "locale", "phone_number", "phone_number_verified", "address", "updated_at",
        "idp", "ver", "oid", "tid", "aio", "azp", "rh", "uti", "roles", "wids", "groups",
        "hasgroups",
    ]
);

crate::impl_dynamic_conversions!(CompleteTokenClaims, AccessTokenClaims, IdTokenClaims);

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::{
        schema::Reconciler,
        test_utils::{access_token_value, assert_serde_json, id_token_value},
    };

    #[test]
    fn access_token_has_no_unknown_claims() {
        let claims = AccessTokenClaims::from_dynamic(access_token_value()).unwrap();
        assert!(claims.extensions.is_empty());
        assert_eq!(claims.alg.as_deref(), Some("RS256"));
        assert_eq!(claims.iat, Some(1_537_231_048));
        assert_eq!(
            claims.aud,
            Some(Audience::Single("6e74172b-be56-4843-9ff4-e66a39bb12e3".to_owned()))
        );

        // Claims introduced later are unset
        assert_eq!(claims.idp, None);
        assert_eq!(claims.appid, None);
        assert_eq!(claims.roles, None);

        assert_serde_json(&claims, access_token_value());
    }

    #[test]
    fn id_token_has_no_unknown_claims() {
        let claims = IdTokenClaims::from_dynamic(id_token_value()).unwrap();
        assert!(claims.extensions.is_empty());
        assert_eq!(claims.nonce.as_deref(), Some("123523"));
        assert_eq!(claims.get("exp"), Some(json!(1_536_361_411)));

        assert_serde_json(&claims, id_token_value());
    }

    #[test]
    fn v1_and_v3_shapes_agree() {
        let mut v3 = access_token_value();
        v3["idp"] = json!("https://sts.windows.net/72f988bf-86f1-41af-91ab-2d7cd011db47/");
        v3["roles"] = json!(["Reader"]);
        v3["hasgroups"] = json!(true);

        let v1 = CompleteTokenClaims::from_dynamic_with(
            access_token_value(),
            Reconciler::strict(Generation::V1),
        )
        .unwrap();
        let v3 = CompleteTokenClaims::from_dynamic(v3).unwrap();

        assert_eq!(v1.roles, None);
        assert_eq!(v3.roles, Some(vec!["Reader".to_owned()]));
        assert_eq!(v3.hasgroups, Some(true));
        assert_eq!(v1.oid, v3.oid);
        assert_eq!(v1.scp, v3.scp);
    }

    #[test]
    fn unknown_claims_are_preserved() {
        let mut value = id_token_value();
        value["xms_pl"] = json!("en");
        value["ctry"] = json!("NZ");

        let claims = CompleteTokenClaims::from_dynamic(value.clone()).unwrap();
        assert_eq!(claims.get("xms_pl"), Some(json!("en")));
        assert_eq!(
            claims.extensions.keys().collect::<Vec<_>>(),
            vec!["xms_pl", "ctry"]
        );
        assert_eq!(serde_json::to_value(&claims).unwrap(), value);
    }

    #[test]
    fn wrong_typed_claims_are_kept_as_extensions() {
        let claims = CompleteTokenClaims::from_dynamic(json!({
            "typ": "JWT",
            "email_verified": "yes",
            "exp": 1_536_361_411.0,
        }))
        .unwrap();

        assert_eq!(claims.email_verified, None);
        assert_eq!(claims.exp, Some(1_536_361_411));
        assert_eq!(claims.get("email_verified"), Some(json!("yes")));
    }

    #[test]
    fn opaque_claims_pass_through() {
        let claims = CompleteTokenClaims::from_dynamic(json!({
            "rph": { "namespace": "ets", "priority": 0 },
            "aud": ["client-a", "client-b"],
        }))
        .unwrap();

        assert_eq!(claims.rph.as_ref().unwrap()["namespace"], json!("ets"));
        assert!(claims.aud.as_ref().unwrap().contains("client-b"));
        assert_eq!(
            claims.aud.as_ref().unwrap().iter().collect::<Vec<_>>(),
            vec!["client-a", "client-b"]
        );
    }

    #[test]
    fn views_expose_a_subset() {
        let mut value = access_token_value();
        value["email"] = json!("abeli@microsoft.com");
        value["custom"] = json!(1);

        let claims = AccessTokenClaims::from_dynamic(value).unwrap();
        let subset = claims.subset();
        assert!(!subset.contains_key("email"));
        assert_eq!(subset["custom"], json!(1));
        assert_eq!(subset["scp"], json!("access_as_user"));

        // The underlying claims keep everything
        let complete = claims.into_complete();
        assert_eq!(complete.email.as_deref(), Some("abeli@microsoft.com"));

        let id = IdTokenClaims::from(complete);
        assert!(id.subset().contains_key("email"));
        assert!(!id.subset().contains_key("scp"));
    }

    #[test]
    fn invariants() {
        let claims = CompleteTokenClaims::from_dynamic(access_token_value()).unwrap();
        assert_eq!(
            claims.check_invariants("6e74172b-be56-4843-9ff4-e66a39bb12e3"),
            Ok(())
        );
        assert_matches!(
            claims.check_invariants("someone-else"),
            Err(ClaimsInvariantError::AudienceMismatch { .. })
        );

        let mut expired = claims.clone();
        expired.exp = expired.iat;
        assert_matches!(
            expired.check_invariants("6e74172b-be56-4843-9ff4-e66a39bb12e3"),
            Err(ClaimsInvariantError::ExpiresBeforeIssued { .. })
        );

        assert_eq!(
            CompleteTokenClaims::default().check_invariants("client"),
            Err(ClaimsInvariantError::Missing("iat"))
        );
        assert!(CompleteTokenClaims::default().is_empty());
        assert!(!claims.is_empty());
    }

    #[test]
    fn every_view_claim_is_known() {
        for name in AccessTokenClaims::CLAIMS.iter().chain(IdTokenClaims::CLAIMS) {
            assert!(CompleteTokenClaims::NAMES.contains(name), "{name}");
        }

        assert_eq!(CompleteTokenClaims::NAMES.len(), CLAIM_FIELDS.len());
    }
}
