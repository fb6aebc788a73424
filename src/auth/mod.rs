//! Identity provider boundary and the per-client session store.
//!
//! Providers speak [`ProviderFailure`]; everything above this module only ever
//! sees [`AuthError`].

pub mod firebase;
pub mod memory;
pub mod session;

use async_trait::async_trait;
use std::sync::Arc;
use validator::ValidateEmail;

use crate::config::{ProviderKind, Settings};
use crate::models::Session;

pub use session::{SessionStore, Subscription};

/// Minimum secret length accepted before any provider round trip.
pub const MIN_SECRET_LEN: usize = 6;

/// Failures surfaced by session store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("identity already exists")]
    DuplicateIdentity,
    #[error("invalid identifier")]
    InvalidIdentifier,
    #[error("secret too weak")]
    WeakSecret,
    #[error("identity not found")]
    IdentityNotFound,
    #[error("wrong secret")]
    WrongSecret,
    #[error("too many attempts")]
    TooManyAttempts,
    #[error("network unavailable")]
    NetworkUnavailable,
    #[error("unknown authentication failure")]
    Unknown,
}

impl AuthError {
    /// Text for the transient notification shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::DuplicateIdentity => {
                "This email is already registered. Please login instead."
            }
            AuthError::InvalidIdentifier => "Invalid email address.",
            AuthError::IdentityNotFound | AuthError::WrongSecret => "Invalid email or password.",
            AuthError::WeakSecret => "Password must be at least 6 characters",
            AuthError::TooManyAttempts => "Too many attempts. Please try again later.",
            AuthError::NetworkUnavailable => "Network unavailable. Please check your connection.",
            AuthError::Unknown => "An error occurred. Please try again.",
        }
    }

    /// Stable label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::DuplicateIdentity => "duplicate_identity",
            AuthError::InvalidIdentifier => "invalid_identifier",
            AuthError::WeakSecret => "weak_secret",
            AuthError::IdentityNotFound => "identity_not_found",
            AuthError::WrongSecret => "wrong_secret",
            AuthError::TooManyAttempts => "too_many_attempts",
            AuthError::NetworkUnavailable => "network_unavailable",
            AuthError::Unknown => "unknown",
        }
    }
}

/// Error vocabulary of an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderFailure {
    #[error("account already exists")]
    DuplicateIdentity,
    #[error("malformed identifier")]
    InvalidIdentifier,
    #[error("no such account")]
    IdentityNotFound,
    #[error("credentials rejected")]
    WrongSecret,
    #[error("password rejected by policy")]
    WeakSecret,
    #[error("rate limited")]
    RateLimited,
    #[error("session no longer valid")]
    SessionInvalid,
    #[error("transport failure: {0}")]
    Network(String),
    #[error("provider error: {0}")]
    Unknown(String),
}

impl From<ProviderFailure> for AuthError {
    fn from(failure: ProviderFailure) -> Self {
        match failure {
            ProviderFailure::DuplicateIdentity => AuthError::DuplicateIdentity,
            ProviderFailure::InvalidIdentifier => AuthError::InvalidIdentifier,
            ProviderFailure::IdentityNotFound => AuthError::IdentityNotFound,
            ProviderFailure::WrongSecret => AuthError::WrongSecret,
            ProviderFailure::WeakSecret => AuthError::WeakSecret,
            ProviderFailure::RateLimited => AuthError::TooManyAttempts,
            ProviderFailure::Network(_) => AuthError::NetworkUnavailable,
            ProviderFailure::SessionInvalid | ProviderFailure::Unknown(_) => AuthError::Unknown,
        }
    }
}

/// External system of record for credentials and tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name used in logs and the health endpoint
    fn name(&self) -> &'static str;

    async fn create_account(&self, identifier: &str, secret: &str)
        -> Result<Session, ProviderFailure>;

    async fn verify_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, ProviderFailure>;

    async fn invalidate_session(&self, session: &Session) -> Result<(), ProviderFailure>;

    /// Exchange a persisted refresh token for a live session.
    ///
    /// `Ok(None)` means the provider no longer recognises the token.
    async fn restore_session(&self, refresh_token: &str)
        -> Result<Option<Session>, ProviderFailure>;
}

/// Trimmed identifier if it looks like an address.
pub fn validate_identifier(identifier: &str) -> Result<&str, AuthError> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() || !trimmed.validate_email() {
        return Err(AuthError::InvalidIdentifier);
    }
    Ok(trimmed)
}

pub fn validate_secret(secret: &str) -> Result<(), AuthError> {
    if secret.chars().count() < MIN_SECRET_LEN {
        return Err(AuthError::WeakSecret);
    }
    Ok(())
}

/// Local checks run before any provider call.
pub fn validate_credentials<'a>(identifier: &'a str, secret: &str) -> Result<&'a str, AuthError> {
    let identifier = validate_identifier(identifier)?;
    validate_secret(secret)?;
    Ok(identifier)
}

/// Build the provider selected by configuration.
pub fn build_provider(settings: &Settings) -> anyhow::Result<Arc<dyn IdentityProvider>> {
    let provider: Arc<dyn IdentityProvider> = match settings.identity_provider {
        ProviderKind::Firebase => Arc::new(firebase::FirebaseProvider::from_settings(settings)?),
        ProviderKind::Memory => {
            let provider = memory::MemoryProvider::new(
                settings.memory_hash_cost,
                settings.memory_max_failed_attempts,
                settings.memory_lockout(),
            );
            for (email, password) in &settings.memory_seed_accounts {
                provider.seed(email, password)?;
            }
            Arc::new(provider)
        }
    };
    tracing::info!(provider = provider.name(), "Identity provider ready");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_must_look_like_an_address() {
        assert_eq!(validate_identifier("  a@b.com "), Ok("a@b.com"));
        assert_eq!(validate_identifier("bad"), Err(AuthError::InvalidIdentifier));
        assert_eq!(validate_identifier(""), Err(AuthError::InvalidIdentifier));
        assert_eq!(validate_identifier("@b.com"), Err(AuthError::InvalidIdentifier));
    }

    #[test]
    fn secret_needs_six_characters() {
        assert_eq!(validate_secret("abcde"), Err(AuthError::WeakSecret));
        assert_eq!(validate_secret("abcdef"), Ok(()));
        // counted in characters, not bytes
        assert_eq!(validate_secret("ééééé"), Err(AuthError::WeakSecret));
    }

    #[test]
    fn identifier_is_checked_before_secret() {
        assert_eq!(
            validate_credentials("bad", "123"),
            Err(AuthError::InvalidIdentifier)
        );
        assert_eq!(validate_credentials("a@b.com", "123"), Err(AuthError::WeakSecret));
    }

    #[test]
    fn provider_failures_map_into_closed_set() {
        assert_eq!(AuthError::from(ProviderFailure::RateLimited), AuthError::TooManyAttempts);
        assert_eq!(
            AuthError::from(ProviderFailure::Network("connection refused".into())),
            AuthError::NetworkUnavailable
        );
        assert_eq!(
            AuthError::from(ProviderFailure::Unknown("QUOTA_EXCEEDED".into())),
            AuthError::Unknown
        );
        assert_eq!(AuthError::from(ProviderFailure::SessionInvalid), AuthError::Unknown);
    }

    #[test]
    fn wrong_secret_and_unknown_identity_share_a_message() {
        assert_eq!(
            AuthError::WrongSecret.user_message(),
            AuthError::IdentityNotFound.user_message()
        );
        assert!(!AuthError::Unknown.user_message().is_empty());
    }

    #[test]
    fn provider_weak_secret_reads_like_the_local_check() {
        // both providers enforce the same six-character floor as the local check
        let local = validate_secret("abcde").unwrap_err();
        let remote = AuthError::from(ProviderFailure::WeakSecret);
        assert_eq!(local, remote);
        assert_eq!(remote.user_message(), "Password must be at least 6 characters");
    }
}
