// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token-authenticated calls to the identity provider.
//!
//! Uses Cognito's `GetUser` operation, which authenticates with the access
//! token itself. A token that verifies locally can still be revoked upstream
//! (global sign-out, disabled user), so this call runs on every protected
//! request and doubles as the revocation check. `GlobalSignOut` is what
//! revokes a token on sign-out.
//!
//! Wire format (AWS JSON 1.1):
//!
//! ```text
//! POST /
//! X-Amz-Target: AWSCognitoIdentityProviderService.<Operation>
//! Content-Type: application/x-amz-json-1.1
//!
//! {"AccessToken": "<token>"}
//! ```

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use super::error::IdentityError;

pub const GET_USER_TARGET: &str = "AWSCognitoIdentityProviderService.GetUser";
pub const GLOBAL_SIGN_OUT_TARGET: &str = "AWSCognitoIdentityProviderService.GlobalSignOut";

const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// Default timeout for one identity provider call.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

const EMAIL_ATTRIBUTE: &str = "email";

#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    #[serde(rename = "AccessToken")]
    access_token: &'a str,
}

#[derive(Deserialize)]
struct GetUserResponse {
    #[serde(rename = "UserAttributes", default)]
    user_attributes: Vec<UserAttribute>,
}

#[derive(Deserialize)]
struct UserAttribute {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Value", default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type", default)]
    error_type: String,
}

/// Resolves the email bound to an access token, and revokes tokens.
#[derive(Clone)]
pub struct IdentityResolver {
    /// Cognito endpoint (`https://cognito-idp.<region>.amazonaws.com/`)
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl IdentityResolver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a shared HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the identity provider who `access_token` belongs to.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Unauthorized`] if the provider rejects the token
    /// - [`IdentityError::NotFound`] if the user is gone or has no email
    /// - [`IdentityError::Upstream`] on transport errors, timeouts and
    ///   unexpected responses
    pub async fn resolve_email(&self, access_token: &str) -> Result<String, IdentityError> {
        let bytes = self.call(GET_USER_TARGET, access_token).await?;

        let user: GetUserResponse = serde_json::from_slice(&bytes)
            .map_err(|e| IdentityError::Upstream(format!("invalid GetUser response: {e}")))?;

        user.user_attributes
            .into_iter()
            .find(|attribute| attribute.name == EMAIL_ATTRIBUTE)
            .and_then(|attribute| attribute.value)
            .filter(|email| !email.is_empty())
            .ok_or(IdentityError::NotFound)
    }

    /// Revoke every token issued for the session `access_token` belongs to.
    ///
    /// Afterwards `GetUser` rejects the token, so it stops authenticating
    /// requests even before it expires.
    ///
    /// # Errors
    ///
    /// Same mapping as [`resolve_email`](Self::resolve_email); a token that
    /// is already revoked comes back as [`IdentityError::Unauthorized`].
    pub async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        self.call(GLOBAL_SIGN_OUT_TARGET, access_token).await.map(|_| ())
    }

    /// POST one AWS JSON 1.1 operation and return the success body.
    async fn call(&self, target: &str, access_token: &str) -> Result<Vec<u8>, IdentityError> {
        let body = serde_json::to_vec(&AccessTokenRequest { access_token })
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header("X-Amz-Target", target)
            .header(CONTENT_TYPE, AMZ_JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_error(status, &bytes));
        }

        Ok(bytes.to_vec())
    }
}

/// Map an AWS JSON error body to an [`IdentityError`].
///
/// `__type` may be namespaced (`com.amazonaws...#NotAuthorizedException`).
fn classify_error(status: reqwest::StatusCode, body: &[u8]) -> IdentityError {
    let error_type = serde_json::from_slice::<ErrorResponse>(body)
        .map(|e| e.error_type)
        .unwrap_or_default();
    let short = error_type.rsplit('#').next().unwrap_or_default();

    match short {
        "NotAuthorizedException" | "PasswordResetRequiredException" => IdentityError::Unauthorized,
        "UserNotFoundException" => IdentityError::NotFound,
        "" => IdentityError::Upstream(format!("HTTP {status} from identity provider")),
        other => IdentityError::Upstream(format!("HTTP {status}: {other}")),
    }
}
