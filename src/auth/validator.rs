// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local JWT verification against the cached key set.
//!
//! Order of checks:
//!
//! 1. Header decodes, carries a `kid` and an asymmetric `alg` → else `Malformed`
//! 2. Key set is available (may refresh) → else `FetchError`
//! 3. `kid` is in the key set → else `UnknownKey`
//! 4. Signature verifies with the key's own algorithm → else `SignatureInvalid`
//! 5. `exp` is present and not in the past → else `Expired`

use std::sync::Arc;

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::claims::{AccessTokenClaims, Claims};
use super::error::AuthError;
use super::jwks::JwksCache;

/// Cognito marks access tokens with `token_use = "access"`.
const ACCESS_TOKEN_USE: &str = "access";

/// Verifies bearer tokens issued by the identity provider.
#[derive(Clone)]
pub struct TokenValidator {
    jwks: Arc<JwksCache>,
    /// Expected `iss`, when configured
    issuer: Option<String>,
    /// Clock skew tolerance in seconds
    leeway: u64,
}

impl TokenValidator {
    pub fn new(jwks: Arc<JwksCache>) -> Self {
        Self {
            jwks,
            issuer: None,
            leeway: 0,
        }
    }

    /// Require the `iss` claim to equal `issuer`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway = leeway_secs;
        self
    }

    pub fn jwks(&self) -> &Arc<JwksCache> {
        &self.jwks
    }

    /// Validate `token` and return its claims.
    ///
    /// # Errors
    ///
    /// One [`AuthError`] per failed check; see the module docs for the order.
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::Malformed)?;
        let kid = header.kid.ok_or(AuthError::Malformed)?;

        if matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::Malformed);
        }

        let keys = self.jwks.get().await?;
        let key = keys.get(&kid).ok_or(AuthError::UnknownKey)?;

        if header.alg != key.algorithm {
            return Err(AuthError::SignatureInvalid);
        }

        let mut validation = Validation::new(key.algorithm);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        // Cognito access tokens carry `client_id`, not `aud`.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let token_data = decode::<AccessTokenClaims>(token, key.decoding_key(), &validation)
            .map_err(classify)?;
        let claims = token_data.claims;

        if claims
            .token_use
            .as_deref()
            .is_some_and(|token_use| token_use != ACCESS_TOKEN_USE)
        {
            return Err(AuthError::Malformed);
        }

        let sub = claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(AuthError::Malformed)?;
        let exp = claims.exp.ok_or(AuthError::Expired)?;

        Ok(Claims {
            sub,
            exp,
            kid,
            username: claims.username,
        })
    }
}

fn classify(e: JwtError) -> AuthError {
    match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::SignatureInvalid,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => AuthError::Expired,
        ErrorKind::ImmatureSignature => AuthError::NotYetValid,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        _ => AuthError::Malformed,
    }
}
