// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Protected routes sit behind [`require_session`]:
//!
//! ```text
//! NoToken      → Unauthenticated (401, no parsing, no network)
//! TokenPresent → Validating ─┬─ Invalid → Rejected (401)
//!                            └─ Valid   → ResolvingIdentity ─┬─ Rejected (401)
//!                                                            └─ Authenticated
//! ```
//!
//! On success an [`AuthenticatedIdentity`] is inserted into the request
//! extensions, where the [`Authenticated`](super::Authenticated) extractor
//! picks it up. There are no retries: a transient upstream failure rejects
//! the request and the client retries it as a whole.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::claims::AuthenticatedIdentity;
use super::error::AuthError;
use super::identity::IdentityResolver;
use super::session::session_token;
use super::validator::TokenValidator;
use crate::state::AppState;

/// Runs the full per-request authentication: local validation, then the
/// upstream identity lookup.
#[derive(Clone)]
pub struct Authenticator {
    validator: TokenValidator,
    identity: IdentityResolver,
}

impl Authenticator {
    pub fn new(validator: TokenValidator, identity: IdentityResolver) -> Self {
        Self {
            validator,
            identity,
        }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Authenticate a session token.
    ///
    /// # Errors
    ///
    /// Any validation or identity failure, unchanged, so the caller can log
    /// the precise cause before collapsing it to a 401.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AuthenticatedIdentity, AuthError> {
        let token = token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingSession)?;

        let claims = self.validator.validate(token).await?;

        // The upstream lookup is also the revocation check; never skip it.
        let email = self.identity.resolve_email(token).await?;

        Ok(AuthenticatedIdentity::new(claims, email))
    }

    /// Revoke `token` at the identity provider.
    ///
    /// # Errors
    ///
    /// [`AuthError::IdentityUpstream`] when the provider refuses or cannot
    /// be reached.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.identity.sign_out(token).await?;
        Ok(())
    }

    /// Report whether a session token is currently valid.
    ///
    /// Local checks only (signature, key, expiry): no identity lookup. Never
    /// fails, so callers without a session can use it.
    pub async fn check_session(&self, token: Option<&str>) -> bool {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return false;
        };

        match self.validator.validate(token).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(reason = e.error_code(), "Session check failed");
                false
            }
        }
    }
}

/// Middleware guarding protected routes with the session cookie.
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/accounts", get(get_account))
///     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_session));
/// ```
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());

    match state.auth.authenticate(session_token(&jar)).await {
        Ok(identity) => {
            tracing::debug!(subject = %identity.subject_id, "Request authenticated");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            log_rejection(&e);
            e.into_response()
        }
    }
}

/// Log the precise cause of an authentication failure.
///
/// Upstream trouble is a warning; a bad or missing token is routine.
pub(crate) fn log_rejection(error: &AuthError) {
    match error {
        AuthError::MissingSession => {
            tracing::debug!(reason = error.error_code(), "Rejected request without session")
        }
        AuthError::FetchError(_) | AuthError::IdentityUpstream(_) => {
            tracing::warn!(reason = error.error_code(), error = %error, "Rejected request")
        }
        _ => tracing::info!(reason = error.error_code(), "Rejected request"),
    }
}
