// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The interface of the identity client consuming these objects.
//!
//! This crate does not talk to any identity provider. The trait only pins
//! down which object each operation takes and returns.

use async_trait::async_trait;

use crate::{
    account::AccountInfo,
    requests::{EndSessionRequest, PopupRequest, RedirectRequest, Request, SilentRequest},
    response::AuthenticationResult,
};

/// An error raised by the identity client, opaque to this crate.
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A browser identity client for public applications.
#[async_trait]
pub trait PublicClientApplication: Send + Sync {
    /// The ID of the application.
    fn client_id(&self) -> &str;

    /// The authority tokens are requested from.
    fn authority(&self) -> &str;

    /// All the accounts currently signed in.
    fn all_accounts(&self) -> Vec<AccountInfo>;

    /// Find a signed-in account by its username, ignoring case.
    fn account_by_username(&self, username: &str) -> Option<AccountInfo> {
        AccountInfo::find_by_username(&self.all_accounts(), username).cloned()
    }

    /// Find a signed-in account by its home account ID.
    fn account_by_home_account_id(&self, home_account_id: &str) -> Option<AccountInfo> {
        AccountInfo::find_by_home_account_id(&self.all_accounts(), home_account_id).cloned()
    }

    /// Sign in through a popup window.
    async fn login_popup(&self, request: PopupRequest) -> Result<AuthenticationResult, ClientError>;

    /// Sign in by navigating the page to the authorization server.
    async fn login_redirect(&self, request: RedirectRequest) -> Result<(), ClientError>;

    /// Process the response of a redirect, if the page was loaded from one.
    async fn handle_redirect(&self) -> Result<Option<AuthenticationResult>, ClientError>;

    /// Sign in without interaction, reusing an existing session.
    async fn sso_silent(&self, request: PopupRequest) -> Result<AuthenticationResult, ClientError>;

    /// Get a token from the cache, or refresh it without interaction.
    async fn acquire_token_silent(
        &self,
        request: SilentRequest,
    ) -> Result<AuthenticationResult, ClientError>;

    /// Get a token through a popup window.
    async fn acquire_token_popup(
        &self,
        request: PopupRequest,
    ) -> Result<AuthenticationResult, ClientError>;

    /// Get a token by navigating the page to the authorization server.
    async fn acquire_token_redirect(&self, request: RedirectRequest) -> Result<(), ClientError>;

    /// Sign out.
    async fn logout(&self, request: EndSessionRequest) -> Result<(), ClientError>;

    /// Run a request whose kind is only known at runtime.
    ///
    /// Authorization URL requests go through a popup. Requests which navigate
    /// away or sign out return no result.
    #[tracing::instrument(name = "client.execute", skip_all, fields(request.kind = %request.kind()))]
    async fn execute(&self, request: Request) -> Result<Option<AuthenticationResult>, ClientError> {
        match request {
            Request::AuthorizationUrl(request) => self.acquire_token_popup(request).await.map(Some),
            Request::Redirect(request) => self.acquire_token_redirect(request).await.map(|()| None),
            Request::Silent(request) => self.acquire_token_silent(request).await.map(Some),
            Request::EndSession(request) => self.logout(request).await.map(|()| None),
        }
    }
}
