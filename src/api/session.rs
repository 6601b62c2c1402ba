// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints.
//!
//! The frontend signs in with Cognito directly and hands the resulting
//! tokens to `POST /session`; from then on the browser only carries
//! `HttpOnly` cookies.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    auth::{
        middleware::log_rejection,
        session::{clear_session_cookies, issue_session_cookies, session_token},
        AuthError, Authenticated, AuthenticatedIdentity,
    },
    models::{MessageResponse, SessionStatus, SessionTokens},
    state::AppState,
};

/// Report whether the caller holds a valid session.
///
/// Checks the token locally (signature, key, expiry) without asking the
/// identity provider, so it never fails.
#[utoipa::path(
    get,
    path = "/is-auth",
    tag = "Session",
    responses(
        (status = 200, description = "Session status", body = SessionStatus)
    )
)]
pub async fn is_auth(State(state): State<AppState>, jar: CookieJar) -> Json<SessionStatus> {
    let is_authenticated = state.auth.check_session(session_token(&jar)).await;
    Json(SessionStatus { is_authenticated })
}

/// Establish a cookie session from identity provider tokens.
///
/// The access token goes through the same checks as any protected request
/// before any cookie is set.
#[utoipa::path(
    post,
    path = "/session",
    tag = "Session",
    request_body = SessionTokens,
    responses(
        (status = 200, description = "Session cookies set", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(tokens): Json<SessionTokens>,
) -> Result<(CookieJar, Json<MessageResponse>), AuthError> {
    let identity = state
        .auth
        .authenticate(Some(&tokens.access_token))
        .await
        .inspect_err(log_rejection)?;

    tracing::info!(subject = %identity.subject_id, "Session established");

    let jar = issue_session_cookies(jar, &tokens, state.cookies);
    Ok((
        jar,
        Json(MessageResponse {
            message: "Signed in".to_string(),
        }),
    ))
}

/// End the session.
///
/// Revokes the access token at the identity provider, then expires every
/// session cookie. Cookies are cleared even when revocation fails.
#[utoipa::path(
    post,
    path = "/signout",
    tag = "Session",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Session cookies cleared", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn sign_out(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(token) = session_token(&jar) {
        match state.auth.sign_out(token).await {
            Ok(()) => tracing::info!(subject = %identity.subject_id, "Signed out"),
            Err(e) => tracing::warn!(
                subject = %identity.subject_id,
                reason = e.error_code(),
                error = %e,
                "Token revocation failed; clearing cookies anyway"
            ),
        }
    }

    (
        clear_session_cookies(jar, state.cookies),
        Json(MessageResponse {
            message: "Signed out".to_string(),
        }),
    )
}

/// The identity attached to this request.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Session",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Authenticated identity", body = AuthenticatedIdentity),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn me(Authenticated(identity): Authenticated) -> Json<AuthenticatedIdentity> {
    Json(identity)
}
