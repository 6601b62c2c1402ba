// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - Keys are cached for a fixed TTL (10 minutes by default)
//! - A stale set is never served: it is refreshed before use
//! - A failed refresh is an error, the stale set is not a fallback (fail closed)
//!
//! ## Concurrency
//!
//! The cache slot holds an immutable snapshot. Readers clone an `Arc` to it,
//! so a request sees either the old set or the new one, never a mix.
//! Refreshes are single-flight: concurrent callers that find the slot stale
//! queue on one refresh lock, and all but the first reuse its result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;

/// Default JWKS cache TTL (10 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Default timeout for one JWKS fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A public verification key from the identity provider.
#[derive(Clone)]
pub struct SigningKey {
    pub kid: String,
    pub algorithm: Algorithm,
    key: DecodingKey,
}

impl SigningKey {
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Keys from one provider fetch, indexed by `kid`.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, SigningKey>,
}

impl KeySet {
    /// Build a key set from a JWKS document.
    ///
    /// Keys without a `kid`, encryption keys (`"use": "enc"`), symmetric
    /// keys and keys that fail to parse are skipped.
    pub fn from_jwk_set(jwks: &JwkSet) -> Self {
        let mut keys = HashMap::with_capacity(jwks.keys.len());

        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                tracing::warn!("Skipping JWK without kid");
                continue;
            };

            if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
                tracing::warn!(kid = %kid, "Skipping encryption JWK");
                continue;
            }

            match jwk_to_decoding_key(jwk) {
                Ok((key, algorithm)) => {
                    keys.insert(
                        kid.clone(),
                        SigningKey {
                            kid,
                            algorithm,
                            key,
                        },
                    );
                }
                Err(e) => tracing::warn!(kid = %kid, error = %e, "Skipping unusable JWK"),
            }
        }

        Self { keys }
    }

    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A key set and the instant it was fetched.
#[derive(Clone)]
struct CachedKeySet {
    keys: Arc<KeySet>,
    fetched_at: Instant,
}

/// Process-wide cache of the identity provider's signing keys.
///
/// Share it behind an `Arc`; every clone of the `Arc` sees the same slot.
pub struct JwksCache {
    /// JWKS URL (`https://cognito-idp.<region>.amazonaws.com/<pool>/.well-known/jwks.json`)
    jwks_url: String,
    cache_ttl: Duration,
    fetch_timeout: Duration,
    client: reqwest::Client,
    slot: RwLock<Option<CachedKeySet>>,
    refresh_lock: Mutex<()>,
}

impl JwksCache {
    /// Create a new JWKS cache for `jwks_url`.
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            client: reqwest::Client::new(),
            slot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Use a shared HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Return the current key set, fetching it first if missing or stale.
    ///
    /// # Errors
    ///
    /// [`AuthError::FetchError`] when a refresh was needed and failed.
    pub async fn get(&self) -> Result<Arc<KeySet>, AuthError> {
        if let Some(keys) = self.fresh_keys().await {
            return Ok(keys);
        }

        let _refresh = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited for the lock.
        if let Some(keys) = self.fresh_keys().await {
            return Ok(keys);
        }

        self.fetch_and_store().await
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _refresh = self.refresh_lock.lock().await;
        self.fetch_and_store().await.map(|_| ())
    }

    /// Check if a fresh key set is cached.
    pub async fn is_fresh(&self) -> bool {
        self.fresh_keys().await.is_some()
    }

    async fn fresh_keys(&self) -> Option<Arc<KeySet>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| Arc::clone(&entry.keys))
    }

    async fn fetch_and_store(&self) -> Result<Arc<KeySet>, AuthError> {
        let keys = Arc::new(self.fetch().await?);

        *self.slot.write().await = Some(CachedKeySet {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });

        tracing::debug!(keys = keys.len(), url = %self.jwks_url, "JWKS refreshed");
        Ok(keys)
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch(&self) -> Result<KeySet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| AuthError::FetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::FetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::FetchError(e.to_string()))?;

        Ok(KeySet::from_jwk_set(&jwks))
    }
}

/// Convert a JWK to a DecodingKey and the algorithm it verifies.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), String> {
    let declared = jwk.common.key_algorithm.as_ref();

    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| format!("invalid RSA key: {e}"))?;

            let alg = match declared {
                None | Some(KeyAlgorithm::RS256) => Algorithm::RS256,
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                Some(other) => return Err(format!("algorithm {other:?} does not fit an RSA key")),
            };

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| format!("invalid EC key: {e}"))?;

            let alg = match declared {
                None | Some(KeyAlgorithm::ES256) => Algorithm::ES256,
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                Some(other) => return Err(format!("algorithm {other:?} does not fit an EC key")),
            };

            Ok((key, alg))
        }
        AlgorithmParameters::OctetKeyPair(okp) => {
            let key = DecodingKey::from_ed_components(&okp.x)
                .map_err(|e| format!("invalid OKP key: {e}"))?;

            match declared {
                None | Some(KeyAlgorithm::EdDSA) => Ok((key, Algorithm::EdDSA)),
                Some(other) => Err(format!("algorithm {other:?} does not fit an OKP key")),
            }
        }
        AlgorithmParameters::OctetKey(_) => Err("symmetric keys are not accepted".to_string()),
        #[allow(unreachable_patterns)]
        _ => Err("unsupported key type".to_string()),
    }
}
