//! In-process identity provider for local development and tests.

use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::time::Instant;
use uuid::Uuid;

use super::{IdentityProvider, ProviderFailure, MIN_SECRET_LEN};
use crate::models::{IdentityToken, Session};

/// Lifetime of an issued id token; refresh tokens live until invalidated.
const ID_TOKEN_TTL_MINUTES: i64 = 60;

struct Account {
    uid: Uuid,
    email: String,
    password_hash: String,
}

/// Consecutive wrong secrets for one account, counted from the first.
struct FailedAttempts {
    count: u32,
    since: Instant,
}

pub struct MemoryProvider {
    hash_cost: u32,
    max_failed_attempts: u32,
    lockout: std::time::Duration,
    accounts: DashMap<String, Account>,
    failed_attempts: DashMap<String, FailedAttempts>,
    // refresh token -> account key
    refresh_tokens: DashMap<String, String>,
}

impl MemoryProvider {
    /// After `max_failed_attempts` wrong secrets an account is locked until
    /// `lockout` has passed since the first of them.
    pub fn new(hash_cost: u32, max_failed_attempts: u32, lockout: std::time::Duration) -> Self {
        MemoryProvider {
            hash_cost,
            max_failed_attempts,
            lockout,
            accounts: DashMap::new(),
            failed_attempts: DashMap::new(),
            refresh_tokens: DashMap::new(),
        }
    }

    /// Create an account up front. Existing accounts are left as they are.
    pub fn seed(&self, email: &str, password: &str) -> Result<(), ProviderFailure> {
        match self.insert_account(email, password) {
            Ok(_) | Err(ProviderFailure::DuplicateIdentity) => Ok(()),
            Err(failure) => Err(failure),
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn insert_account(&self, email: &str, password: &str) -> Result<String, ProviderFailure> {
        let key = account_key(email).ok_or(ProviderFailure::InvalidIdentifier)?;
        if password.chars().count() < MIN_SECRET_LEN {
            return Err(ProviderFailure::WeakSecret);
        }

        let password_hash = hash(password, self.hash_cost)
            .map_err(|e| ProviderFailure::Unknown(format!("hashing failed: {}", e)))?;

        match self.accounts.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ProviderFailure::DuplicateIdentity),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Account {
                    uid: Uuid::now_v7(),
                    email: email.trim().to_string(),
                    password_hash,
                });
                Ok(key)
            }
        }
    }

    /// Expired windows are forgotten, so counting starts over.
    fn is_locked(&self, key: &str) -> bool {
        match self.failed_attempts.get(key) {
            None => return false,
            Some(attempts) if attempts.since.elapsed() < self.lockout => {
                return attempts.count >= self.max_failed_attempts;
            }
            Some(_) => {}
        }
        self.failed_attempts.remove(key);
        false
    }

    fn issue_session(&self, key: &str, refresh_token: Option<String>) -> Option<Session> {
        let account = self.accounts.get(key)?;
        let refresh_token = refresh_token.unwrap_or_else(opaque_token);
        self.refresh_tokens
            .insert(refresh_token.clone(), key.to_string());

        Some(Session::new(
            account.uid.simple().to_string(),
            account.email.clone(),
            IdentityToken::new(opaque_token()),
            IdentityToken::new(refresh_token),
            Utc::now() + Duration::minutes(ID_TOKEN_TTL_MINUTES),
        ))
    }
}

#[async_trait]
impl IdentityProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_account(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, ProviderFailure> {
        let key = self.insert_account(identifier, secret)?;
        self.issue_session(&key, None)
            .ok_or_else(|| ProviderFailure::Unknown("account vanished".to_string()))
    }

    async fn verify_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, ProviderFailure> {
        let key = account_key(identifier).ok_or(ProviderFailure::InvalidIdentifier)?;

        let password_hash = self
            .accounts
            .get(&key)
            .map(|account| account.password_hash.clone())
            .ok_or(ProviderFailure::IdentityNotFound)?;

        if self.is_locked(&key) {
            return Err(ProviderFailure::RateLimited);
        }

        let matches = verify(secret, &password_hash)
            .map_err(|e| ProviderFailure::Unknown(format!("hash check failed: {}", e)))?;
        if !matches {
            self.failed_attempts
                .entry(key)
                .and_modify(|attempts| attempts.count += 1)
                .or_insert(FailedAttempts {
                    count: 1,
                    since: Instant::now(),
                });
            return Err(ProviderFailure::WrongSecret);
        }

        self.failed_attempts.remove(&key);
        self.issue_session(&key, None)
            .ok_or(ProviderFailure::IdentityNotFound)
    }

    async fn invalidate_session(&self, session: &Session) -> Result<(), ProviderFailure> {
        self.refresh_tokens.remove(session.refresh_token().expose());
        Ok(())
    }

    async fn restore_session(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, ProviderFailure> {
        let Some(key) = self
            .refresh_tokens
            .get(refresh_token)
            .map(|entry| entry.value().clone())
        else {
            return Ok(None);
        };
        Ok(self.issue_session(&key, Some(refresh_token.to_string())))
    }
}

fn account_key(identifier: &str) -> Option<String> {
    let normalized = identifier.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

fn opaque_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}
