// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the authenticated identity.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raw claims of a Cognito access token.
///
/// `sub` and `exp` are optional here so that a token missing them fails in
/// validation with a precise error rather than as a generic decode failure.
/// See: https://docs.aws.amazon.com/cognito/latest/developerguide/amazon-cognito-user-pools-using-the-access-token.html
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (Cognito user UUID)
    #[serde(default)]
    pub sub: Option<String>,

    /// Expiration timestamp (epoch seconds)
    #[serde(default)]
    pub exp: Option<u64>,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: Option<u64>,

    /// Issuer (`https://cognito-idp.<region>.amazonaws.com/<pool-id>`)
    #[serde(default)]
    pub iss: Option<String>,

    /// `access` for access tokens, `id` for ID tokens
    #[serde(default)]
    pub token_use: Option<String>,

    /// App client that requested the token
    #[serde(default)]
    pub client_id: Option<String>,

    /// Cognito username
    #[serde(default)]
    pub username: Option<String>,
}

/// Claims of a token that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject identifier
    pub sub: String,
    /// Expiry instant, epoch seconds
    pub exp: u64,
    /// Key identifier from the token header
    pub kid: String,
    /// Cognito username, when present
    pub username: Option<String>,
}

/// Identity attached to a request after full authentication.
///
/// Lives for one request only: it is never stored or cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedIdentity {
    /// Identity provider subject (`sub` claim)
    pub subject_id: String,
    /// Email resolved through the identity provider
    pub email: String,
}

impl AuthenticatedIdentity {
    pub fn new(claims: Claims, email: impl Into<String>) -> Self {
        Self {
            subject_id: claims.sub,
            email: email.into(),
        }
    }
}
