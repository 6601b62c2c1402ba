// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Focus time endpoints.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::Authenticated,
    error::ApiError,
    models::{CreateTimeRequest, FocusTime},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/times",
    tag = "Times",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "The caller's focus times, oldest first", body = [FocusTime]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No account yet")
    )
)]
pub async fn list_times(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
) -> Result<Json<Vec<FocusTime>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list_times(&identity.email)?))
}

/// Log a focus session for the caller.
#[utoipa::path(
    post,
    path = "/times",
    tag = "Times",
    security(("session_cookie" = [])),
    request_body = CreateTimeRequest,
    responses(
        (status = 201, description = "Focus time logged", body = FocusTime),
        (status = 400, description = "Focus time must be positive"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No account yet")
    )
)]
pub async fn create_time(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Json(request): Json<CreateTimeRequest>,
) -> Result<(StatusCode, Json<FocusTime>), ApiError> {
    let mut store = state.store.write().await;
    let time = store.create_time(&identity.email, request)?;
    Ok((StatusCode::CREATED, Json(time)))
}
