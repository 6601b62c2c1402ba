// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pomodoro RPG - Backend API
//!
//! Cookie-session REST backend for the Pomodoro RPG frontend, authenticating
//! every protected request against AWS Cognito.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session authentication (Cognito JWT + identity lookup)
//! - `config` - Environment configuration
//! - `store` - In-memory accounts and focus times

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
