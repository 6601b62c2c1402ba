// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for auth tests: Ed25519 and RSA signing keys, token
//! minting and wiremock responders for the JWKS, get-user and global
//! sign-out endpoints.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::identity::{GET_USER_TARGET, GLOBAL_SIGN_OUT_TARGET};
use super::{Authenticator, IdentityResolver, JwksCache, TokenValidator};
use crate::auth::session::CookieSettings;
use crate::state::AppState;
use crate::store::InMemoryStore;

pub const JWKS_PATH: &str = "/ap-northeast-1_test/.well-known/jwks.json";

/// An Ed25519 key pair standing in for an identity provider signing key.
pub struct TestKey {
    pub kid: String,
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl TestKey {
    pub fn generate(kid: &str) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).expect("generate key");
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).expect("parse key");

        Self {
            kid: kid.to_string(),
            pkcs8: pkcs8.as_ref().to_vec(),
            public_key: pair.public_key().as_ref().to_vec(),
        }
    }

    pub fn jwk(&self) -> Value {
        json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "kid": self.kid,
            "x": URL_SAFE_NO_PAD.encode(&self.public_key),
            "alg": "EdDSA",
            "use": "sig"
        })
    }

    /// Sign `claims` with a header carrying this key's `kid`.
    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(self.kid.clone());
        self.sign_with_header(&header, claims)
    }

    pub fn sign_with_header(&self, header: &Header, claims: &Value) -> String {
        encode(header, claims, &EncodingKey::from_ed_der(&self.pkcs8)).expect("sign token")
    }
}

const RSA_SIGNING_KEY_PEM: &str = include_str!("testdata/rsa_signing_key.pem");

/// Base64url modulus of `testdata/rsa_signing_key.pem`.
const RSA_MODULUS: &str = "iJSmmHERw7sQM_s5hq7tWgA3zwzfB7MoBYC4jtv1cB-3w0FJ6F5tDHnoo6-FdpAQcT-HTqOU9QjMCoWpUOoVn7K3NeTzbBQncQp-5ZTJ3QrOhQzCrU2kRtJ9zSN-1b58xk-_MDUCK7XBGLYZXZG4rsog5UvGDjlFuHEpwbPA3rN26vSAYarPqCLZrFbtiJKF-LOMZlj2cBHRJAOaCvAjPs6FU9KOO-nDo8IuNFX85_nGx1cKgwy8q1yEUtcT86JfMn9ipjoLKoLg1xipuu3Lh66mebEEdF2Ybl8c0N4gI_7fq-wUoQ6LbGs0d7M4c75zcLokVMsvA8VMaN-gpX5vtw";

/// A fixed 2048-bit RSA key, the kind Cognito publishes.
pub struct RsaTestKey {
    pub kid: String,
    /// `alg` declared in the published JWK
    pub declared_alg: &'static str,
}

impl RsaTestKey {
    pub fn new(kid: &str, declared_alg: &'static str) -> Self {
        Self {
            kid: kid.to_string(),
            declared_alg,
        }
    }

    pub fn jwk(&self) -> Value {
        json!({
            "kty": "RSA",
            "kid": self.kid,
            "n": RSA_MODULUS,
            "e": "AQAB",
            "alg": self.declared_alg,
            "use": "sig"
        })
    }

    /// Sign `claims` with `alg` and this key's `kid`.
    pub fn sign(&self, alg: Algorithm, claims: &Value) -> String {
        let mut header = Header::new(alg);
        header.kid = Some(self.kid.clone());
        let key = EncodingKey::from_rsa_pem(RSA_SIGNING_KEY_PEM.as_bytes()).expect("parse RSA key");
        encode(&header, claims, &key).expect("sign token")
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}

/// Access token claims for `sub`, expiring `exp_offset` seconds from now.
pub fn claims_for(sub: &str, exp_offset: i64) -> Value {
    let exp = now_secs() as i64 + exp_offset;
    json!({
        "sub": sub,
        "exp": exp,
        "iat": now_secs(),
        "token_use": "access",
        "client_id": "test-client",
        "username": sub
    })
}

pub fn jwks_body(keys: &[&TestKey]) -> Value {
    json!({ "keys": keys.iter().map(|key| key.jwk()).collect::<Vec<_>>() })
}

pub fn jwks_mock(keys: &[&TestKey]) -> Mock {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(keys)))
}

pub fn jwks_mock_with(jwks: Vec<Value>) -> Mock {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": jwks })))
}

pub fn get_user_mock(email: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", GET_USER_TARGET))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Username": "u-1",
            "UserAttributes": [
                { "Name": "sub", "Value": "u-1" },
                { "Name": "email_verified", "Value": "true" },
                { "Name": "email", "Value": email }
            ]
        })))
}

pub fn get_user_error_mock(status: u16, error_type: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", GET_USER_TARGET))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "__type": error_type,
            "message": "Access Token has been revoked"
        })))
}

pub fn global_sign_out_mock() -> Mock {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", GLOBAL_SIGN_OUT_TARGET))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
}

pub fn global_sign_out_error_mock(status: u16, error_type: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", GLOBAL_SIGN_OUT_TARGET))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "__type": error_type,
            "message": "sign-out failed"
        })))
}

/// `x-amz-target` of every request the mock server received, in order.
pub async fn received_targets(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| request.headers.get("x-amz-target"))
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub fn jwks_cache_for(server: &MockServer) -> Arc<JwksCache> {
    Arc::new(JwksCache::new(format!("{}{}", server.uri(), JWKS_PATH)))
}

pub fn authenticator_for(server: &MockServer) -> Authenticator {
    let validator = TokenValidator::new(jwks_cache_for(server));
    let identity = IdentityResolver::new(server.uri());
    Authenticator::new(validator, identity)
}

/// Application state wired to a mock identity provider, with non-`Secure`
/// cookies so plain-HTTP test requests round-trip.
pub fn state_for(server: &MockServer) -> AppState {
    AppState::new(InMemoryStore::new(), authenticator_for(server))
        .with_cookie_settings(CookieSettings::default().with_secure(false))
}
