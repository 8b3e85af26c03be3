// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The signed-in account.

use serde::Serialize;

use crate::{
    errors::{SchemaError, Violation},
    schema::{Entity, EntitySchema, FieldSpec, Fields, Generation},
    value::{Extensions, ValueKind},
};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("homeAccountId", ValueKind::String, Generation::V1).non_empty(),
    FieldSpec::required("environment", ValueKind::String, Generation::V1).non_empty(),
    FieldSpec::required("tenantId", ValueKind::String, Generation::V1).non_empty(),
    FieldSpec::required("username", ValueKind::String, Generation::V1).non_empty(),
];

/// An account known to the identity client.
///
/// Two accounts are the same if they share their home account ID and
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// The stable identifier of the account across tenants.
    pub home_account_id: String,

    /// The host of the identity provider which issued the account.
    pub environment: String,

    /// The tenant in which the account was signed in.
    pub tenant_id: String,

    /// The username, usually an email address.
    pub username: String,

    /// Fields not covered by the schema.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl AccountInfo {
    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fields is empty.
    pub fn new(
        home_account_id: impl Into<String>,
        environment: impl Into<String>,
        tenant_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let account = Self {
            home_account_id: home_account_id.into(),
            environment: environment.into(),
            tenant_id: tenant_id.into(),
            username: username.into(),
            extensions: Extensions::new(),
        };

        let fields = [
            ("homeAccountId", &account.home_account_id),
            ("environment", &account.environment),
            ("tenantId", &account.tenant_id),
            ("username", &account.username),
        ];

        if let Some((name, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(SchemaError::violation(
                Self::SCHEMA.name(),
                name,
                Violation::Empty,
            ));
        }

        Ok(account)
    }

    /// The pair identifying this account.
    #[must_use]
    pub fn identity_key(&self) -> (&str, &str) {
        (&self.home_account_id, &self.environment)
    }

    /// Whether both accounts designate the same identity.
    #[must_use]
    pub fn is_same_account(&self, other: &Self) -> bool {
        self.identity_key() == other.identity_key()
    }

    /// Find an account by its username, ignoring case.
    #[must_use]
    pub fn find_by_username<'a>(accounts: &'a [Self], username: &str) -> Option<&'a Self> {
        let username = username.to_lowercase();
        accounts
            .iter()
            .find(|account| account.username.to_lowercase() == username)
    }

    /// Find an account by its home account ID.
    #[must_use]
    pub fn find_by_home_account_id<'a>(
        accounts: &'a [Self],
        home_account_id: &str,
    ) -> Option<&'a Self> {
        accounts
            .iter()
            .find(|account| account.home_account_id == home_account_id)
    }
}

impl Entity for AccountInfo {
    const SCHEMA: EntitySchema = EntitySchema::new("AccountInfo", &[FIELDS]);

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        Ok(Self {
            home_account_id: fields.required("homeAccountId")?,
            environment: fields.required("environment")?,
            tenant_id: fields.required("tenantId")?,
            username: fields.required("username")?,
            extensions: fields.into_extensions(),
        })
    }
}

crate::impl_dynamic_conversions!(AccountInfo);
