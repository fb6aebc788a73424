use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{validate_credentials, AuthError, IdentityProvider, ProviderFailure};
use crate::models::Session;
use crate::monitoring;

type Observer = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

/// Single source of truth for who is logged in on one client.
///
/// The session value is only ever written by [`SessionStore::publish`], which
/// holds the change lock while it updates the value and notifies observers, so
/// broadcasts reach observers in change order and never overlap.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    current: RwLock<Option<Session>>,
    observers: Mutex<Vec<(u64, Observer)>>,
    next_observer: AtomicU64,
    changes: tokio::sync::Mutex<()>,
    resolved: watch::Sender<bool>,
    disposed: AtomicBool,
}

/// Handle returned by [`SessionStore::subscribe`].
#[must_use = "dropping the handle keeps the observer registered"]
pub struct Subscription {
    id: u64,
    store: Weak<SessionStore>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(store) = self.store.upgrade() {
            store.observers.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

impl SessionStore {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Arc<Self> {
        let (resolved, _) = watch::channel(false);
        Arc::new(SessionStore {
            provider,
            current: RwLock::new(None),
            observers: Mutex::new(Vec::new()),
            next_observer: AtomicU64::new(0),
            changes: tokio::sync::Mutex::new(()),
            resolved,
            disposed: AtomicBool::new(false),
        })
    }

    /// Startup resolution. Restores a persisted session if one is given and
    /// broadcasts the outcome. Gives up after `limit` and resolves as absent.
    pub async fn init(&self, persisted: Option<String>, limit: Duration) {
        if self.is_resolved() {
            return;
        }

        let restored = match persisted {
            None => None,
            Some(refresh_token) => {
                match tokio::time::timeout(limit, self.provider.restore_session(&refresh_token))
                    .await
                {
                    Ok(Ok(session)) => session,
                    Ok(Err(failure)) => {
                        warn!(provider = self.provider.name(), error = %failure, "Session restore failed");
                        None
                    }
                    Err(_) => {
                        warn!(provider = self.provider.name(), "Session restore timed out");
                        None
                    }
                }
            }
        };

        self.publish(restored).await;
    }

    /// False until the startup check has completed.
    pub fn is_resolved(&self) -> bool {
        *self.resolved.borrow()
    }

    /// Wait for the startup check, up to `limit`. Returns whether it resolved.
    pub async fn wait_resolved(&self, limit: Duration) -> bool {
        let mut rx = self.resolved.subscribe();
        tokio::time::timeout(limit, rx.wait_for(|done| *done))
            .await
            .map(|result| result.is_ok())
            .unwrap_or(false)
    }

    /// Last known session; never blocks on the provider.
    pub fn current_session(&self) -> Option<Session> {
        self.current.read().clone()
    }

    /// Register an observer, called after every change in registration order.
    pub fn subscribe<F>(self: &Arc<Self>, observer: F) -> Subscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let id = self.next_observer.fetch_add(1, Ordering::Relaxed);
        self.observers.lock().push((id, Arc::new(observer)));
        Subscription {
            id,
            store: Arc::downgrade(self),
        }
    }

    pub async fn signup(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        let result = self.signup_inner(identifier, secret).await;
        record_attempt("signup", &result);
        result
    }

    async fn signup_inner(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        let identifier = validate_credentials(identifier, secret)?;
        let session = self
            .provider
            .create_account(identifier, secret)
            .await
            .map_err(|failure| self.map_failure("signup", failure))?;

        info!(uid = session.uid(), email = session.email(), "Account created");
        self.publish(Some(session.clone())).await;
        Ok(session)
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        let result = self.login_inner(identifier, secret).await;
        record_attempt("login", &result);
        result
    }

    async fn login_inner(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        let identifier = validate_credentials(identifier, secret)?;
        let session = self
            .provider
            .verify_credentials(identifier, secret)
            .await
            .map_err(|failure| self.map_failure("login", failure))?;

        info!(uid = session.uid(), email = session.email(), "Logged in");
        self.publish(Some(session.clone())).await;
        Ok(session)
    }

    /// Tear down the session. On failure the session is left untouched.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let result = self.logout_inner().await;
        record_attempt("logout", &result);
        result
    }

    async fn logout_inner(&self) -> Result<(), AuthError> {
        if let Some(session) = self.current_session() {
            self.provider
                .invalidate_session(&session)
                .await
                .map_err(|failure| self.map_failure("logout", failure))?;
            info!(uid = session.uid(), "Logged out");
        }
        self.publish(None).await;
        Ok(())
    }

    /// Refresh tokens that expire within `skew`.
    ///
    /// A provider that no longer recognises the session clears it; transport
    /// failures keep the current session so a flaky network never logs anyone out.
    pub async fn refresh_if_expiring(&self, skew: Duration) -> Result<(), AuthError> {
        let Some(session) = self.current_session() else {
            return Ok(());
        };
        let skew = chrono::Duration::from_std(skew).unwrap_or_else(|_| chrono::Duration::zero());
        if !session.expires_within(Utc::now(), skew) {
            return Ok(());
        }

        debug!(uid = session.uid(), "Refreshing identity token");
        match self
            .provider
            .restore_session(session.refresh_token().expose())
            .await
        {
            Ok(Some(refreshed)) => {
                self.publish(Some(refreshed)).await;
                Ok(())
            }
            Ok(None) | Err(ProviderFailure::SessionInvalid) => {
                info!(uid = session.uid(), "Provider invalidated session");
                self.publish(None).await;
                Ok(())
            }
            Err(failure) => Err(self.map_failure("refresh", failure)),
        }
    }

    /// End of life: observers are dropped and later changes reach nobody.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.observers.lock().clear();
        self.resolved.send_replace(true);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    async fn publish(&self, next: Option<Session>) {
        let _turn = self.changes.lock().await;

        *self.current.write() = next.clone();
        self.resolved.send_replace(true);

        if self.is_disposed() {
            return;
        }

        let observers: Vec<Observer> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(next.as_ref());
        }
    }

    fn map_failure(&self, operation: &'static str, failure: ProviderFailure) -> AuthError {
        warn!(
            provider = self.provider.name(),
            operation,
            error = %failure,
            "Identity provider rejected request"
        );
        AuthError::from(failure)
    }
}

fn record_attempt<T>(operation: &str, result: &Result<T, AuthError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };
    monitoring::AUTH_ATTEMPTS
        .with_label_values(&[operation, outcome])
        .inc();
}
