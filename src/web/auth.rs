use axum::{
    extract::{Form, Query},
    response::Redirect,
    Extension,
};
use maud::{html, Markup};
use serde::Deserialize;
use std::sync::Arc;

use super::{client::Client, components::layout, validate_redirect_url};
use crate::gate::{AUTH_PATH, LANDING_PATH};
use crate::shell::{self, LogoutOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Login,
    Signup,
}

impl Mode {
    fn other(self) -> Self {
        match self {
            Mode::Login => Mode::Signup,
            Mode::Signup => Mode::Login,
        }
    }

    fn href(self) -> &'static str {
        match self {
            Mode::Login => "/auth",
            Mode::Signup => "/auth?mode=signup",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModeQuery {
    #[serde(default)]
    pub mode: Mode,
}

/// Login/signup form data
#[derive(Debug, Deserialize)]
pub struct AuthForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub mode: Mode,
}

#[derive(Debug, Deserialize)]
pub struct LogoutForm {
    pub next: Option<String>,
}

/// Show the login or signup screen
pub async fn page(
    Extension(client): Extension<Arc<Client>>,
    Query(query): Query<ModeQuery>,
) -> Markup {
    let notices = client.notices.drain();
    layout::base(
        match query.mode {
            Mode::Login => "Sign In",
            Mode::Signup => "Create Account",
        },
        false,
        html! {
            (form(query.mode))
            (layout::toasts(&notices))
        },
    )
}

/// Handle login or signup, depending on the form's mode
pub async fn submit(Extension(client): Extension<Arc<Client>>, Form(form): Form<AuthForm>) -> Redirect {
    if form.email.trim().is_empty() || form.password.is_empty() {
        client.notices.error("Please fill in all fields");
        return Redirect::to(form.mode.href());
    }

    let result = match form.mode {
        Mode::Login => client.session.login(&form.email, &form.password).await,
        Mode::Signup => client.session.signup(&form.email, &form.password).await,
    };

    match result {
        Ok(_) => {
            // a fresh shell mounts for the new session
            client.ui.lock().reset();
            client.notices.success(match form.mode {
                Mode::Login => "Welcome back!",
                Mode::Signup => "Account created successfully!",
            });
            Redirect::to(LANDING_PATH)
        }
        Err(err) => {
            tracing::info!(client = %client.id, error = %err, "Authentication rejected");
            client.notices.error(err.user_message());
            Redirect::to(form.mode.href())
        }
    }
}

/// Handle logout from the shell
pub async fn logout(Extension(client): Extension<Arc<Client>>, Form(form): Form<LogoutForm>) -> Redirect {
    match shell::logout(&client.session, &client.ui, &client.notices).await {
        LogoutOutcome::Navigate(target) => Redirect::to(target),
        LogoutOutcome::Stay => {
            let back = form
                .next
                .as_deref()
                .map(validate_redirect_url)
                .unwrap_or_else(|| LANDING_PATH.to_string());
            Redirect::to(&back)
        }
    }
}

fn form(mode: Mode) -> Markup {
    let login = mode == Mode::Login;
    html! {
        div class="min-h-screen flex items-center justify-center bg-gradient-to-br from-indigo-50 to-purple-50 py-12 px-4 sm:px-6 lg:px-8" {
            div class="max-w-md w-full bg-white shadow-lg rounded-lg p-8 space-y-8" {
                div class="text-center" {
                    h1 class="text-3xl font-bold bg-gradient-to-r from-primary to-accent bg-clip-text text-transparent mb-2" {
                        "ConstituCheck"
                    }
                    p class="text-gray-500" {
                        @if login { "Welcome back to your admin portal" } @else { "Create your admin account" }
                    }
                }

                form class="space-y-4" action=(AUTH_PATH) method="POST" {
                    input type="hidden" name="mode" value=(if login { "login" } else { "signup" });

                    div class="space-y-2" {
                        label for="email" class="block text-sm font-medium text-gray-700" { "Email" }
                        input
                            id="email"
                            name="email"
                            type="email"
                            autocomplete="email"
                            class="appearance-none relative block w-full px-3 py-2 border border-gray-300 placeholder-gray-500 text-gray-900 rounded-md focus:outline-none focus:ring-primary focus:border-primary sm:text-sm"
                            placeholder="admin@constitucheck.com";
                    }
                    div class="space-y-2" {
                        label for="password" class="block text-sm font-medium text-gray-700" { "Password" }
                        input
                            id="password"
                            name="password"
                            type="password"
                            autocomplete=(if login { "current-password" } else { "new-password" })
                            class="appearance-none relative block w-full px-3 py-2 border border-gray-300 placeholder-gray-500 text-gray-900 rounded-md focus:outline-none focus:ring-primary focus:border-primary sm:text-sm"
                            placeholder="••••••••";
                    }

                    button
                        type="submit"
                        class="w-full flex justify-center py-2 px-4 border border-transparent text-sm font-medium rounded-md text-white bg-gradient-to-r from-primary to-accent hover:opacity-90 focus:outline-none focus:ring-2 focus:ring-offset-2 focus:ring-primary" {
                        @if login { "Sign In" } @else { "Create Account" }
                    }
                }

                div class="text-center" {
                    a href=(mode.other().href()) class="text-sm text-primary hover:underline" {
                        @if login { "Don't have an account? Sign up" } @else { "Already have an account? Sign in" }
                    }
                }
            }
        }
    }
}
