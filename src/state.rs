// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::http::HeaderValue;
use tokio::sync::RwLock;

use crate::auth::{Authenticator, CookieSettings, IdentityResolver, JwksCache, TokenValidator};
use crate::config::{AppConfig, ConfigError, DEFAULT_FRONTEND_ORIGIN, FRONTEND_ORIGIN_ENV};
use crate::store::InMemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub auth: Authenticator,
    pub cookies: CookieSettings,
    pub frontend_origin: HeaderValue,
}

impl AppState {
    pub fn new(store: InMemoryStore, auth: Authenticator) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            auth,
            cookies: CookieSettings::default(),
            frontend_origin: HeaderValue::from_static(DEFAULT_FRONTEND_ORIGIN),
        }
    }

    pub fn with_cookie_settings(mut self, cookies: CookieSettings) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_frontend_origin(mut self, origin: HeaderValue) -> Self {
        self.frontend_origin = origin;
        self
    }

    /// Wire the key cache, validator and identity resolver from `config`.
    ///
    /// Both outbound clients share one connection pool.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::new();

        let jwks = JwksCache::new(&config.jwks_url)
            .with_cache_ttl(config.jwks_cache_ttl)
            .with_fetch_timeout(config.jwks_timeout)
            .with_client(client.clone());

        let validator = TokenValidator::new(Arc::new(jwks))
            .with_issuer(&config.issuer)
            .with_leeway(config.jwt_leeway_secs);

        let identity = IdentityResolver::new(&config.identity_endpoint)
            .with_timeout(config.identity_timeout)
            .with_client(client);

        let origin = HeaderValue::from_str(&config.frontend_origin).map_err(|_| {
            ConfigError::Invalid {
                var: FRONTEND_ORIGIN_ENV,
                value: config.frontend_origin.clone(),
            }
        })?;

        Ok(
            Self::new(InMemoryStore::new(), Authenticator::new(validator, identity))
                .with_cookie_settings(CookieSettings::default().with_secure(config.cookie_secure))
                .with_frontend_origin(origin),
        )
    }
}
