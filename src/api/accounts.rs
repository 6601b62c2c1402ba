// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints.
//!
//! The account is always the caller's own, found by the email the identity
//! provider resolved for this request.

use axum::{extract::State, Json};

use crate::{
    auth::Authenticated,
    error::ApiError,
    models::{AccountResponse, UpdateAccountRequest},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/accounts",
    tag = "Accounts",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "The caller's account", body = AccountResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No account yet")
    )
)]
pub async fn get_account(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
) -> Result<Json<AccountResponse>, ApiError> {
    let store = state.store.read().await;
    let account = store.account_by_email(&identity.email)?;
    Ok(Json(account.into()))
}

/// Update the caller's account, creating it on first use.
#[utoipa::path(
    put,
    path = "/accounts",
    tag = "Accounts",
    security(("session_cookie" = [])),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account saved", body = AccountResponse),
        (status = 400, description = "Invalid account data"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_account(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let mut store = state.store.write().await;
    let account = store.upsert_account(&identity, request)?;

    tracing::info!(account_id = %account.id, "Account saved");
    Ok(Json(account.into()))
}
