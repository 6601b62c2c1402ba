// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cookie-session authentication against AWS Cognito.
//!
//! ## Auth Flow
//!
//! 1. Frontend signs the user in with Cognito and posts the tokens to
//!    `POST /session`, which validates them and sets `HttpOnly` cookies
//! 2. Each protected request carries the `access_token` cookie
//! 3. The server:
//!    - Verifies the JWT against the pool's JWKS (signature, `kid`, expiry)
//!    - Calls Cognito `GetUser` with the token to resolve the email
//!      (and to catch tokens revoked upstream)
//!    - Attaches `{subject_id, email}` to the request
//!
//! ## Security
//!
//! - Every failure is a bare 401; the precise cause is only logged
//! - JWKS is cached for 10 minutes and never served stale
//! - Outbound calls carry timeouts; a timeout rejects the request

pub mod claims;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod jwks;
pub mod middleware;
pub mod session;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::{AuthenticatedIdentity, Claims};
pub use error::{AuthError, IdentityError};
pub use extractor::Authenticated;
pub use identity::IdentityResolver;
pub use jwks::{JwksCache, KeySet, SigningKey};
pub use middleware::{require_session, Authenticator};
pub use session::CookieSettings;
pub use validator::TokenValidator;
