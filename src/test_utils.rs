#[cfg(test)]
pub mod helpers {
    use crate::auth::{IdentityProvider, ProviderFailure};
    use crate::config::Settings;
    use crate::models::{IdentityToken, Session};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use dashmap::DashMap;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Once};
    use std::time::Duration;

    static INIT: Once = Once::new();

    /// Quiet tracing output for tests; safe to call repeatedly.
    pub fn init_tracing() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::WARN)
                .with_test_writer()
                .try_init()
                .ok();
        });
    }

    /// Settings with short delays and the memory provider.
    pub fn test_settings() -> Settings {
        let mut settings = Settings::new();
        settings.upload_delay_ms = 30;
        settings.search_delay_ms = 30;
        settings.session_resolve_timeout_ms = 500;
        settings.memory_hash_cost = 4;
        settings.client_cookie = "cc_client".to_string();
        settings.refresh_cookie = "cc_refresh".to_string();
        settings
    }

    /// Deterministic session: tokens derive from the email, expiry in one hour.
    pub fn session_for(email: &str) -> Session {
        Session::new(
            format!("uid-{}", email),
            email,
            IdentityToken::new(format!("id-{}", email)),
            IdentityToken::new(format!("refresh-{}", email)),
            Utc::now() + ChronoDuration::hours(1),
        )
    }

    /// Scripted provider that accepts everything unless told otherwise.
    #[derive(Default)]
    pub struct FakeProvider {
        calls: AtomicUsize,
        restores: AtomicUsize,
        next_failure: Mutex<Option<ProviderFailure>>,
        delay: Mutex<Option<Duration>>,
        known: DashMap<String, Session>,
    }

    impl FakeProvider {
        pub fn new() -> Arc<Self> {
            Arc::new(FakeProvider::default())
        }

        /// Credential and teardown calls seen so far
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn restores(&self) -> usize {
            self.restores.load(Ordering::SeqCst)
        }

        pub fn fail_next(&self, failure: ProviderFailure) {
            *self.next_failure.lock() = Some(failure);
        }

        pub fn delay_by(&self, delay: Duration) {
            *self.delay.lock() = Some(delay);
        }

        /// Make `session` restorable by its refresh token.
        pub fn remember(&self, session: Session) {
            self.known
                .insert(session.refresh_token().expose().to_string(), session);
        }

        pub fn forget_all(&self) {
            self.known.clear();
        }

        async fn step(&self) -> Result<(), ProviderFailure> {
            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match self.next_failure.lock().take() {
                Some(failure) => Err(failure),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn create_account(
            &self,
            identifier: &str,
            _secret: &str,
        ) -> Result<Session, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.step().await?;
            Ok(session_for(identifier))
        }

        async fn verify_credentials(
            &self,
            identifier: &str,
            _secret: &str,
        ) -> Result<Session, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.step().await?;
            Ok(session_for(identifier))
        }

        async fn invalidate_session(&self, session: &Session) -> Result<(), ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.step().await?;
            self.known.remove(session.refresh_token().expose());
            Ok(())
        }

        async fn restore_session(
            &self,
            refresh_token: &str,
        ) -> Result<Option<Session>, ProviderFailure> {
            self.restores.fetch_add(1, Ordering::SeqCst);
            self.step().await?;
            Ok(self.known.get(refresh_token).map(|entry| entry.value().clone()))
        }
    }
}
