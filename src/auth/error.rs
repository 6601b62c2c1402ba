// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every variant is kept distinct so it can be logged with its own code, but
//! the HTTP response is identical for all of them: a bare 401. Clients never
//! learn which check rejected their token.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Generic message returned for every rejected request.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Token validation and session errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session cookie, or an empty one
    #[error("session cookie is missing")]
    MissingSession,
    /// Token is structurally invalid (header, claims or encoding)
    #[error("token is malformed")]
    Malformed,
    /// The `kid` in the token header is not in the current key set
    #[error("no signing key matches the token kid")]
    UnknownKey,
    /// Signature does not verify against the matched key
    #[error("token signature is invalid")]
    SignatureInvalid,
    /// `exp` is in the past, or absent
    #[error("token has expired")]
    Expired,
    /// `nbf` is in the future
    #[error("token is not yet valid")]
    NotYetValid,
    /// `iss` does not match the configured issuer
    #[error("token issuer is invalid")]
    InvalidIssuer,
    /// The key set could not be retrieved
    #[error("failed to fetch JWKS: {0}")]
    FetchError(String),
    /// The identity provider rejected the token or could not be reached
    #[error("identity lookup failed: {0}")]
    IdentityUpstream(#[from] IdentityError),
}

/// Identity provider lookup errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// User is gone, or has no email attribute
    #[error("user or email attribute not found")]
    NotFound,
    /// Token was rejected upstream (revoked, signed out, expired)
    #[error("token rejected by identity provider")]
    Unauthorized,
    /// Transport failure, timeout or unexpected response
    #[error("identity provider error: {0}")]
    Upstream(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
}

impl AuthError {
    /// Stable error code, for logs only.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingSession => "missing_session",
            AuthError::Malformed => "malformed_token",
            AuthError::UnknownKey => "unknown_key",
            AuthError::SignatureInvalid => "invalid_signature",
            AuthError::Expired => "token_expired",
            AuthError::NotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::FetchError(_) => "jwks_fetch_error",
            AuthError::IdentityUpstream(IdentityError::NotFound) => "identity_not_found",
            AuthError::IdentityUpstream(IdentityError::Unauthorized) => "identity_unauthorized",
            AuthError::IdentityUpstream(IdentityError::Upstream(_)) => "identity_upstream_error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: UNAUTHORIZED_MESSAGE,
        });
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: AuthError) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn every_variant_collapses_to_the_same_401() {
        let errors = vec![
            AuthError::MissingSession,
            AuthError::Malformed,
            AuthError::UnknownKey,
            AuthError::SignatureInvalid,
            AuthError::Expired,
            AuthError::NotYetValid,
            AuthError::InvalidIssuer,
            AuthError::FetchError("connection refused".to_string()),
            AuthError::IdentityUpstream(IdentityError::Unauthorized),
            AuthError::IdentityUpstream(IdentityError::Upstream("timeout".to_string())),
        ];

        for error in errors {
            let (status, body) = body_of(error).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, r#"{"error":"Unauthorized"}"#);
        }
    }

    #[test]
    fn error_codes_stay_distinct() {
        assert_eq!(AuthError::UnknownKey.error_code(), "unknown_key");
        assert_eq!(AuthError::SignatureInvalid.error_code(), "invalid_signature");
        assert_eq!(AuthError::Expired.error_code(), "token_expired");
        assert_eq!(AuthError::Malformed.error_code(), "malformed_token");
        assert_eq!(
            AuthError::from(IdentityError::NotFound).error_code(),
            "identity_not_found"
        );
    }
}
