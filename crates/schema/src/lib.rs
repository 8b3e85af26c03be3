// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Strongly-typed objects exchanged with a browser identity client.
//!
//! Every entity can be built from a dynamic [`serde_json::Value`] through the
//! [`Reconciler`], which accepts any of the supported schema generations and
//! preserves unknown keys in an extension map.

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod account;
pub mod claims;
pub mod client;
pub mod errors;
pub mod log;
pub mod requests;
pub mod response;
pub mod schema;
pub mod value;

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}

#[cfg(test)]
mod test_utils;

pub use self::{
    account::AccountInfo,
    claims::{AccessTokenClaims, Audience, ClaimsInvariantError, CompleteTokenClaims, IdTokenClaims},
    client::{ClientError, PublicClientApplication},
    errors::{FieldPath, SchemaError, Violation},
    log::{InvalidLogLevelError, LogLevel, Logger, LoggerCallback},
    requests::{
        AuthorizationUrlRequest, BaseAuthRequest, EndSessionRequest, InvalidRequestKindError,
        InvalidResponseModeError, PopupRequest, RedirectRequest, Request, RequestKind,
        ResponseMode, SilentRequest,
    },
    response::AuthenticationResult,
    schema::{
        Entity, EntitySchema, FieldRule, FieldSpec, Fields, Generation, InvalidGenerationError,
        Presence, Reconciler,
    },
    value::{Extensions, Timestamp, TimestampFormat, ValueKind},
};

/// Implements [`serde::Deserialize`] and `TryFrom<serde_json::Value>` for an
/// [`Entity`], routing both through the canonical [`Reconciler`].
#[macro_export]
macro_rules! impl_dynamic_conversions {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl<'de> $crate::__private::serde::Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                where
                    D: $crate::__private::serde::Deserializer<'de>,
                {
                    let value =
                        <$crate::__private::serde_json::Value as $crate::__private::serde::Deserialize>::deserialize(deserializer)?;
                    <Self as $crate::Entity>::from_dynamic(value)
                        .map_err(<D::Error as $crate::__private::serde::de::Error>::custom)
                }
            }

            impl ::std::convert::TryFrom<$crate::__private::serde_json::Value> for $ty {
                type Error = $crate::SchemaError;

                fn try_from(
                    value: $crate::__private::serde_json::Value,
                ) -> ::std::result::Result<Self, Self::Error> {
                    <Self as $crate::Entity>::from_dynamic(value)
                }
            }
        )+
    };
}
