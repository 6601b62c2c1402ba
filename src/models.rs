// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the domain records and the request/response
//! structures used by the REST API. Wire types derive `Serialize`,
//! `Deserialize` and `ToSchema` for JSON handling and OpenAPI docs; field
//! names are camelCase on the wire.
//!
//! ## Model Categories
//!
//! - **Session**: tokens posted by the frontend, session status
//! - **Accounts**: profile bound to an identity provider subject
//! - **Focus times**: logged pomodoro sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Domain rule violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("focus time must be greater than zero")]
    NonPositiveFocusTime,
}

// =============================================================================
// Session Models
// =============================================================================

/// Tokens the frontend obtained from the identity provider.
#[derive(Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionTokens { .. }")
    }
}

/// Response of the session status check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_authenticated: bool,
}

/// Plain message response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Account Models
// =============================================================================

/// A user profile, owned by one identity provider subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    /// Identity provider subject (`sub`)
    pub subject_id: String,
    pub email: String,
    pub name: String,
    pub image: String,
}

impl Account {
    pub fn new(
        subject_id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let (subject_id, email, name) = (subject_id.into(), email.into(), name.into());

        if subject_id.is_empty() {
            return Err(DomainError::Required("subject id"));
        }
        if email.is_empty() {
            return Err(DomainError::Required("email"));
        }
        if name.is_empty() {
            return Err(DomainError::Required("name"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            subject_id,
            email,
            name,
            image: image.into(),
        })
    }

    pub fn update_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::Required("name"));
        }
        self.name = name;
        Ok(())
    }

    pub fn update_image(&mut self, image: impl Into<String>) {
        self.image = image.into();
    }
}

/// Account as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccountResponse {
    pub email: String,
    pub name: String,
    pub image: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            email: account.email,
            name: account.name,
            image: account.image,
        }
    }
}

/// Request to create or update the caller's account.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub name: String,
    #[serde(default)]
    pub image: String,
}

// =============================================================================
// Focus Time Models
// =============================================================================

/// One logged focus session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FocusTime {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Focused minutes, strictly positive
    pub focus_time: f64,
    pub executed_at: DateTime<Utc>,
}

impl FocusTime {
    pub fn new(account_id: Uuid, focus_time: f64) -> Result<Self, DomainError> {
        // Also rejects NaN.
        if !(focus_time > 0.0) {
            return Err(DomainError::NonPositiveFocusTime);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            focus_time,
            executed_at: Utc::now(),
        })
    }
}

/// Request to log a focus session.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeRequest {
    pub focus_time: f64,
}
