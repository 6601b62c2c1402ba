// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authenticated identity.
//!
//! Use the `Authenticated` extractor in handlers mounted behind
//! [`require_session`](super::middleware::require_session):
//!
//! ```rust,ignore
//! async fn my_handler(Authenticated(identity): Authenticated) -> impl IntoResponse {
//!     // identity is AuthenticatedIdentity
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedIdentity};

/// Extractor for the identity the middleware attached to the request.
///
/// A handler accidentally mounted without the middleware gets a 401, not a
/// panic: the identity is looked up by type, never assumed.
pub struct Authenticated(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .map(Authenticated)
            .ok_or(AuthError::MissingSession)
    }
}
