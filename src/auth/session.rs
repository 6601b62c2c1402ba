// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session cookies.
//!
//! The browser session is nothing but cookies: there is no server-side
//! session store. Cookie names are bound to token fields through the
//! explicit [`SESSION_COOKIES`] table; issuing and clearing both walk it.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use crate::models::SessionTokens;

/// Cookie carrying the bearer access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const ID_TOKEN_COOKIE: &str = "id_token";
/// Issued and cleared alongside the others for the frontend's own use.
/// The server never reads it; there is no refresh endpoint.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Fixed session horizon.
pub const SESSION_LIFETIME: Duration = Duration::hours(24);

type TokenSelector = fn(&SessionTokens) -> &str;

fn access_token(tokens: &SessionTokens) -> &str {
    &tokens.access_token
}

fn id_token(tokens: &SessionTokens) -> &str {
    &tokens.id_token
}

fn refresh_token(tokens: &SessionTokens) -> &str {
    &tokens.refresh_token
}

/// Cookie name → token field.
pub const SESSION_COOKIES: [(&str, TokenSelector); 3] = [
    (ACCESS_TOKEN_COOKIE, access_token),
    (ID_TOKEN_COOKIE, id_token),
    (REFRESH_TOKEN_COOKIE, refresh_token),
];

/// Attributes shared by every session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSettings {
    /// Emit the `Secure` attribute. Browsers only honour `SameSite=None`
    /// on secure cookies, so this stays on outside local development.
    pub secure: bool,
    pub lifetime: Duration,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            lifetime: SESSION_LIFETIME,
        }
    }
}

impl CookieSettings {
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

/// The session token from the request, if present and non-empty.
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
}

/// Add one cookie per [`SESSION_COOKIES`] entry.
pub fn issue_session_cookies(
    jar: CookieJar,
    tokens: &SessionTokens,
    settings: CookieSettings,
) -> CookieJar {
    let expires = OffsetDateTime::now_utc() + settings.lifetime;

    SESSION_COOKIES
        .iter()
        .fold(jar, |jar, (name, select)| {
            let cookie = Cookie::build((*name, select(tokens).to_owned()))
                .http_only(true)
                .secure(settings.secure)
                .same_site(SameSite::None)
                .path("/")
                .max_age(settings.lifetime)
                .expires(expires);
            jar.add(cookie)
        })
}

/// Overwrite every session cookie with an expired, empty one.
pub fn clear_session_cookies(jar: CookieJar, settings: CookieSettings) -> CookieJar {
    SESSION_COOKIES.iter().fold(jar, |jar, (name, _)| {
        let cookie = Cookie::build((*name, ""))
            .http_only(true)
            .secure(settings.secure)
            .same_site(SameSite::None)
            .path("/")
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH);
        jar.add(cookie)
    })
}
