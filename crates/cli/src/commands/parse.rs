// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use msal_config::Configuration;
use msal_schema::{
    AccessTokenClaims, AccountInfo, AuthenticationResult, AuthorizationUrlRequest,
    CompleteTokenClaims, EndSessionRequest, Entity, Generation, IdTokenClaims, RedirectRequest,
    Reconciler, SchemaError, SilentRequest,
};
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::info_span;

/// The kinds of objects which can be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EntityKind {
    /// An account
    Account,

    /// A client configuration
    Configuration,

    /// A request building an authorization URL
    AuthorizationUrlRequest,

    /// A request going through a redirect
    RedirectRequest,

    /// A request acquiring a token without interaction
    SilentRequest,

    /// A request signing the user out
    EndSessionRequest,

    /// The claims of an access token
    AccessTokenClaims,

    /// The claims of an ID token
    IdTokenClaims,

    /// Every known claim
    CompleteTokenClaims,

    /// The result of a token request
    AuthenticationResult,
}

impl EntityKind {
    /// Build the entity and return its canonical form
    fn canonicalize(self, value: Value, reconciler: Reconciler) -> anyhow::Result<Value> {
        match self {
            Self::Account => canonicalize::<AccountInfo>(value, reconciler),
            Self::Configuration => canonicalize::<Configuration>(value, reconciler),
            Self::AuthorizationUrlRequest => {
                canonicalize::<AuthorizationUrlRequest>(value, reconciler)
            }
            Self::RedirectRequest => canonicalize::<RedirectRequest>(value, reconciler),
            Self::SilentRequest => canonicalize::<SilentRequest>(value, reconciler),
            Self::EndSessionRequest => canonicalize::<EndSessionRequest>(value, reconciler),
            Self::AccessTokenClaims => canonicalize::<AccessTokenClaims>(value, reconciler),
            Self::IdTokenClaims => canonicalize::<IdTokenClaims>(value, reconciler),
            Self::CompleteTokenClaims => canonicalize::<CompleteTokenClaims>(value, reconciler),
            Self::AuthenticationResult => {
                canonicalize::<AuthenticationResult>(value, reconciler)
            }
        }
    }
}

fn canonicalize<E>(value: Value, reconciler: Reconciler) -> anyhow::Result<Value>
where
    E: Entity + Serialize,
{
    let entity = E::from_dynamic_with(value, reconciler)?;
    let value = serde_json::to_value(entity).context("Failed to serialize the object")?;
    Ok(value)
}

#[derive(Parser, Debug)]
pub(super) struct Options {
    /// The kind of object contained in the file
    #[arg(value_enum)]
    entity: EntityKind,

    /// The path to a JSON file containing the object
    file: Utf8PathBuf,

    /// Only accept objects of this schema generation (v1, v2 or v3)
    ///
    /// If not specified, objects of any generation are accepted
    #[arg(short, long)]
    generation: Option<Generation>,
}

impl Options {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let _span = info_span!("cli.parse", entity = ?self.entity, file = %self.file).entered();

        let reconciler = self
            .generation
            .map_or_else(Reconciler::canonical, Reconciler::strict);

        let raw = tokio::fs::read(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file))?;
        let value: Value = serde_json::from_slice(&raw)
            .with_context(|| format!("{} does not contain valid JSON", self.file))?;

        let canonical = match self.entity.canonicalize(value, reconciler) {
            Ok(canonical) => canonical,
            Err(e) => {
                if let Some(error) = e.downcast_ref::<SchemaError>() {
                    tracing::error!(
                        entity = error.entity(),
                        path = %error.path(),
                        "{error}"
                    );
                    return Ok(ExitCode::FAILURE);
                }

                return Err(e);
            }
        };

        let mut output = serde_json::to_string_pretty(&canonical)?;
        output.push('\n');
        tokio::io::stdout().write_all(output.as_bytes()).await?;

        Ok(ExitCode::SUCCESS)
    }
}
