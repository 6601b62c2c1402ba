// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, their defaults, and the
//! [`AppConfig`] loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `COGNITO_REGION` | Cognito region | `ap-northeast-1` |
//! | `COGNITO_USER_POOL_ID` | Cognito user pool id | Required |
//! | `COGNITO_CLIENT_ID` | App client id (logged at startup) | Optional |
//! | `JWKS_URL` | JWKS endpoint override | Derived from region and pool |
//! | `IDENTITY_ENDPOINT` | Cognito API endpoint override | Derived from region |
//! | `JWT_ISSUER` | Expected `iss` claim | Derived from region and pool |
//! | `JWKS_CACHE_TTL_SECS` | Signing key cache TTL | `600` |
//! | `JWKS_TIMEOUT_SECS` | JWKS fetch timeout | `10` |
//! | `IDENTITY_TIMEOUT_SECS` | `GetUser` call timeout | `5` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance | `0` |
//! | `FRONTEND_ORIGIN` | Allowed CORS origin | `http://localhost:5173` |
//! | `COOKIE_SECURE` | `Secure` attribute on session cookies | `true` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const COGNITO_REGION_ENV: &str = "COGNITO_REGION";
pub const COGNITO_USER_POOL_ID_ENV: &str = "COGNITO_USER_POOL_ID";
pub const COGNITO_CLIENT_ID_ENV: &str = "COGNITO_CLIENT_ID";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const IDENTITY_ENDPOINT_ENV: &str = "IDENTITY_ENDPOINT";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_TIMEOUT_ENV: &str = "JWKS_TIMEOUT_SECS";
pub const IDENTITY_TIMEOUT_ENV: &str = "IDENTITY_TIMEOUT_SECS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const FRONTEND_ORIGIN_ENV: &str = "FRONTEND_ORIGIN";
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REGION: &str = "ap-northeast-1";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Settings for one server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub client_id: Option<String>,
    pub jwks_url: String,
    pub identity_endpoint: String,
    pub issuer: String,
    pub jwks_cache_ttl: Duration,
    pub jwks_timeout: Duration,
    pub identity_timeout: Duration,
    pub jwt_leeway_secs: u64,
    pub frontend_origin: String,
    pub cookie_secure: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&var, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var: HOST_ENV,
                value: host.clone(),
            })?;

        let region = var(COGNITO_REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string());
        let pool_id = var(COGNITO_USER_POOL_ID_ENV).ok_or(ConfigError::Missing(COGNITO_USER_POOL_ID_ENV))?;
        let cognito_host = format!("https://cognito-idp.{region}.amazonaws.com");

        let jwks_url = var(JWKS_URL_ENV)
            .unwrap_or_else(|| format!("{cognito_host}/{pool_id}/.well-known/jwks.json"));
        let identity_endpoint = var(IDENTITY_ENDPOINT_ENV).unwrap_or_else(|| format!("{cognito_host}/"));
        let issuer = var(JWT_ISSUER_ENV).unwrap_or_else(|| format!("{cognito_host}/{pool_id}"));
        let frontend_origin =
            var(FRONTEND_ORIGIN_ENV).unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string());

        for (name, value) in [
            (JWKS_URL_ENV, &jwks_url),
            (IDENTITY_ENDPOINT_ENV, &identity_endpoint),
            (FRONTEND_ORIGIN_ENV, &frontend_origin),
        ] {
            Url::parse(value).map_err(|_| ConfigError::Invalid {
                var: name,
                value: value.clone(),
            })?;
        }

        let log_format = match var(LOG_FORMAT_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: LOG_FORMAT_ENV,
                value,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            client_id: var(COGNITO_CLIENT_ID_ENV),
            jwks_url,
            identity_endpoint,
            issuer,
            jwks_cache_ttl: Duration::from_secs(parse_or(&var, JWKS_CACHE_TTL_ENV, 600)?),
            jwks_timeout: Duration::from_secs(parse_or(&var, JWKS_TIMEOUT_ENV, 10)?),
            identity_timeout: Duration::from_secs(parse_or(&var, IDENTITY_TIMEOUT_ENV, 5)?),
            jwt_leeway_secs: parse_or(&var, JWT_LEEWAY_ENV, 0)?,
            frontend_origin,
            cookie_secure: parse_or(&var, COOKIE_SECURE_ENV, true)?,
            log_format,
        })
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var: key, value }),
        None => Ok(default),
    }
}
