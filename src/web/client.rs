//! Server-side stand-in for a browser tab.
//!
//! Each browser carries an opaque client cookie. The client it names owns one
//! session store, the shell's UI state, pending notices and page-local state.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use super::{documents::DocumentsState, search::SearchState, AppState};
use crate::auth::{IdentityProvider, SessionStore, Subscription};
use crate::monitoring;
use crate::shell::{Notices, UiState};

const REFRESH_COOKIE_DAYS: i64 = 30;

pub struct Client {
    pub id: Uuid,
    pub session: Arc<SessionStore>,
    pub ui: Mutex<UiState>,
    pub notices: Arc<Notices>,
    pub documents: DocumentsState,
    pub search: SearchState,
    last_seen: Mutex<Instant>,
    _audit: Subscription,
}

impl Client {
    fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let id = Uuid::now_v7();
        let session = SessionStore::new(provider);

        let audit = session.subscribe(move |current| {
            let state = if current.is_some() { "present" } else { "absent" };
            monitoring::SESSION_TRANSITIONS
                .with_label_values(&[state])
                .inc();
            info!(
                client = %id,
                session = state,
                email = current.map(|s| s.email()).unwrap_or("-"),
                "Session changed"
            );
        });

        Client {
            id,
            session,
            ui: Mutex::new(UiState::default()),
            notices: Arc::new(Notices::default()),
            documents: DocumentsState::default(),
            search: SearchState::default(),
            last_seen: Mutex::new(Instant::now()),
            _audit: audit,
        }
    }

    fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }
}

pub struct ClientRegistry {
    provider: Arc<dyn IdentityProvider>,
    clients: DashMap<Uuid, Arc<Client>>,
    resolve_timeout: Duration,
}

impl ClientRegistry {
    pub fn new(provider: Arc<dyn IdentityProvider>, resolve_timeout: Duration) -> Self {
        ClientRegistry {
            provider,
            clients: DashMap::new(),
            resolve_timeout,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Client>> {
        let client = self.clients.get(id).map(|entry| entry.value().clone())?;
        client.touch();
        Some(client)
    }

    /// Find the client for `known`, or start a new one whose store restores
    /// `persisted` in the background. The flag is true for new clients.
    pub fn resolve(&self, known: Option<Uuid>, persisted: Option<String>) -> (Arc<Client>, bool) {
        if let Some(client) = known.and_then(|id| self.get(&id)) {
            return (client, false);
        }

        let client = Arc::new(Client::new(self.provider.clone()));
        self.clients.insert(client.id, client.clone());
        monitoring::LIVE_CLIENTS.set(self.clients.len() as i64);
        debug!(client = %client.id, restoring = persisted.is_some(), "New client");

        let store = client.session.clone();
        let limit = self.resolve_timeout;
        tokio::spawn(async move {
            store.init(persisted, limit).await;
        });

        (client, true)
    }

    /// Drop clients idle for longer than `max_idle`, or longer than
    /// `anonymous_idle` when they hold no session; returns how many went.
    pub fn evict_idle(&self, max_idle: Duration, anonymous_idle: Duration) -> usize {
        let before = self.clients.len();
        self.clients.retain(|_, client| {
            let limit = if client.session.current_session().is_some() {
                max_idle
            } else {
                anonymous_idle.min(max_idle)
            };
            let keep = client.idle_for() <= limit;
            if !keep {
                client.session.dispose();
            }
            keep
        });
        monitoring::LIVE_CLIENTS.set(self.clients.len() as i64);
        before - self.clients.len()
    }

    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: Duration,
        max_idle: Duration,
        anonymous_idle: Duration,
    ) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(max_idle, anonymous_idle);
                if evicted > 0 {
                    info!(evicted, live = registry.len(), "Evicted idle clients");
                }
            }
        })
    }

    /// Process end: every store is disposed.
    pub fn dispose_all(&self) {
        for entry in self.clients.iter() {
            entry.value().session.dispose();
        }
        self.clients.clear();
        monitoring::LIVE_CLIENTS.set(0);
    }
}

/// Attach the caller's [`Client`] to the request and keep cookies in step
/// with its session.
pub async fn attach_client(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let settings = state.settings.clone();
    let mut jar = CookieJar::from_headers(request.headers());

    let known = jar
        .get(&settings.client_cookie)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
    let persisted = jar
        .get(&settings.refresh_cookie)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    let (client, created) = state.clients.resolve(known, persisted.clone());
    request.extensions_mut().insert(client.clone());

    let response = next.run(request).await;

    if created {
        jar = jar.add(
            Cookie::build((settings.client_cookie.clone(), client.id.simple().to_string()))
                .path("/")
                .http_only(true)
                .secure(settings.cookie_secure)
                .same_site(SameSite::Lax)
                .build(),
        );
    }

    match client.session.current_session() {
        Some(session) if persisted.as_deref() != Some(session.refresh_token().expose()) => {
            jar = jar.add(
                Cookie::build((
                    settings.refresh_cookie.clone(),
                    session.refresh_token().expose().to_string(),
                ))
                .path("/")
                .http_only(true)
                .secure(settings.cookie_secure)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::days(REFRESH_COOKIE_DAYS))
                .build(),
            );
        }
        None if persisted.is_some() && client.session.is_resolved() => {
            jar = jar.remove(Cookie::build((settings.refresh_cookie.clone(), "")).path("/"));
        }
        _ => {}
    }

    (jar, response).into_response()
}
