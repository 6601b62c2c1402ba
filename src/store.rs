// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory account and focus-time store.
//!
//! Accounts are looked up by the email the identity provider resolved for
//! the current request, never by anything the client sends.

use std::collections::HashMap;

use uuid::Uuid;

use crate::auth::AuthenticatedIdentity;
use crate::error::ApiError;
use crate::models::{Account, CreateTimeRequest, FocusTime, UpdateAccountRequest};

#[derive(Default)]
pub struct InMemoryStore {
    accounts: HashMap<Uuid, Account>,
    times: HashMap<Uuid, FocusTime>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_by_email(&self, email: &str) -> Result<Account, ApiError> {
        self.accounts
            .values()
            .find(|account| account.email == email)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Account not found"))
    }

    /// Update the caller's account, creating it on first use.
    pub fn upsert_account(
        &mut self,
        identity: &AuthenticatedIdentity,
        request: UpdateAccountRequest,
    ) -> Result<Account, ApiError> {
        let existing = self
            .accounts
            .values_mut()
            .find(|account| account.email == identity.email);

        let account = match existing {
            Some(account) => {
                account.update_name(request.name)?;
                account.update_image(request.image);
                account.clone()
            }
            None => {
                let account = Account::new(
                    identity.subject_id.clone(),
                    identity.email.clone(),
                    request.name,
                    request.image,
                )?;
                self.accounts.insert(account.id, account.clone());
                account
            }
        };

        Ok(account)
    }

    pub fn create_time(
        &mut self,
        email: &str,
        request: CreateTimeRequest,
    ) -> Result<FocusTime, ApiError> {
        let account = self.account_by_email(email)?;
        let time = FocusTime::new(account.id, request.focus_time)?;
        self.times.insert(time.id, time.clone());
        Ok(time)
    }

    /// The caller's focus times, oldest first.
    pub fn list_times(&self, email: &str) -> Result<Vec<FocusTime>, ApiError> {
        let account = self.account_by_email(email)?;
        let mut times: Vec<FocusTime> = self
            .times
            .values()
            .filter(|time| time.account_id == account.id)
            .cloned()
            .collect();
        times.sort_by_key(|time| time.executed_at);
        Ok(times)
    }
}
