//! Per-navigation access decision.
//!
//! The gate keeps no state of its own: every verdict is computed from the
//! client's session store and the requested location.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::SessionStore;
use crate::models::Section;
use crate::monitoring;
use crate::web::{client::Client, AppState};

/// The login/signup screen.
pub const AUTH_PATH: &str = "/auth";

/// Where authenticated users land: the first navigation item.
pub const LANDING_PATH: &str = Section::ALL[0].descriptor().path;

/// Locations the gate knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The login/signup screen
    Auth,
    Section(Section),
}

impl Route {
    /// Exact-match lookup; anything else is an unknown (protected) location.
    pub fn parse(location: &str) -> Option<Self> {
        if location == AUTH_PATH {
            return Some(Route::Auth);
        }
        Section::ALL
            .into_iter()
            .find(|section| section.descriptor().path == location)
            .map(Route::Section)
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Auth => AUTH_PATH,
            Route::Section(section) => section.descriptor().path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Startup session check still running
    Resolving,
    Unauthenticated,
    Authenticated,
}

impl GateState {
    pub fn of(store: &SessionStore) -> Self {
        if !store.is_resolved() {
            GateState::Resolving
        } else if store.current_session().is_some() {
            GateState::Authenticated
        } else {
            GateState::Unauthenticated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Render what was asked for
    Render,
    /// Replace the request with a redirect
    Redirect(&'static str),
    /// Render nothing until the session resolves
    Hold,
}

pub fn decide(state: GateState, location: &str) -> Verdict {
    let wants_auth_screen = Route::parse(location) == Some(Route::Auth);
    match state {
        GateState::Resolving => Verdict::Hold,
        GateState::Unauthenticated if wants_auth_screen => Verdict::Render,
        GateState::Unauthenticated => Verdict::Redirect(AUTH_PATH),
        GateState::Authenticated if wants_auth_screen => Verdict::Redirect(LANDING_PATH),
        GateState::Authenticated => Verdict::Render,
    }
}

/// Middleware guarding every page route. Runs after the client middleware.
pub async fn guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(client) = request.extensions().get::<Arc<Client>>().cloned() else {
        warn!("Gate reached without a client; treating as unauthenticated");
        return redirect_to(AUTH_PATH, request.uri().path());
    };
    let store = &client.session;

    let mut gate_state = GateState::of(store);
    if gate_state == GateState::Resolving {
        let limit = state.settings.resolve_timeout();
        if !store.wait_resolved(limit).await {
            warn!(client = %client.id, "Session did not resolve in time");
        }
        gate_state = match GateState::of(store) {
            GateState::Resolving => GateState::Unauthenticated,
            resolved => resolved,
        };
    }

    if gate_state == GateState::Authenticated {
        if let Err(err) = store.refresh_if_expiring(state.settings.refresh_skew()).await {
            debug!(client = %client.id, error = %err, "Token refresh deferred");
        }
        gate_state = GateState::of(store);
    }

    let location = request.uri().path().to_string();
    match decide(gate_state, &location) {
        Verdict::Render => next.run(request).await,
        Verdict::Redirect(target) => redirect_to(target, &location),
        // decide never holds once the state above is resolved
        Verdict::Hold => redirect_to(AUTH_PATH, &location),
    }
}

fn redirect_to(target: &'static str, from: &str) -> Response {
    debug!(from, to = target, "Gate redirect");
    monitoring::GATE_REDIRECTS.with_label_values(&[target]).inc();
    Redirect::to(target).into_response()
}
