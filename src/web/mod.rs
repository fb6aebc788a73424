pub mod auth;
pub mod client;
pub mod components;
pub mod dashboard;
pub mod documents;
pub mod search;
pub mod ui;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use maud::{html, Markup};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::IdentityProvider;
use crate::config::Settings;
use crate::{gate, monitoring};
use client::{Client, ClientRegistry};
use components::layout::{self, ShellView};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub clients: Arc<ClientRegistry>,
}

impl AppState {
    pub fn new(settings: Settings, provider: Arc<dyn IdentityProvider>) -> Self {
        let clients = Arc::new(ClientRegistry::new(provider, settings.resolve_timeout()));
        AppState {
            settings: Arc::new(settings),
            clients,
        }
    }
}

pub fn router(state: AppState) -> Router {
    // Every page sees its client first, then the gate.
    let pages = Router::new()
        .route("/auth", get(auth::page).post(auth::submit))
        .route("/logout", post(auth::logout))
        .route("/", get(dashboard::show))
        .route("/documents", get(documents::show))
        .route("/documents/upload", post(documents::upload))
        .route("/search", get(search::show).post(search::submit))
        .route("/ui/sidebar", post(ui::toggle_sidebar))
        .route("/ui/drawer/open", post(ui::open_drawer))
        .route("/ui/drawer/close", post(ui::close_drawer))
        .route("/ui/drawer/select", post(ui::select_from_drawer))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), gate::guard))
        .layer(middleware::from_fn_with_state(state.clone(), client::attach_client));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(pages)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Validate redirect URL to prevent open redirect attacks.
/// Only allows relative URLs starting with /
pub fn validate_redirect_url(url: &str) -> String {
    if url.starts_with('/') && !url.starts_with("//") {
        url.to_string()
    } else {
        gate::LANDING_PATH.to_string()
    }
}

/// Wrap page content in the shell. Pending notices are consumed here.
pub fn render_page(client: &Client, location: &str, title: &str, auto_refresh: bool, content: Markup) -> Markup {
    let view = ShellView {
        location,
        ui: *client.ui.lock(),
        user_email: client.session.current_session().map(|s| s.email().to_string()),
        notices: client.notices.drain(),
    };
    layout::base(title, auto_refresh, layout::shell(&view, content))
}

/// 404 inside the shell; no navigation item is active.
async fn not_found(Extension(client): Extension<Arc<Client>>, uri: Uri) -> Response {
    let content = html! {
        div class="p-6 flex items-center justify-center" {
            div class="text-center py-20" {
                h1 class="text-6xl font-bold text-gray-900 mb-4" { "404" }
                p class="text-xl text-gray-500 mb-8" { "Page not found" }
                a href=(gate::LANDING_PATH) class="text-primary hover:underline" {
                    "Go back home"
                }
            }
        }
    };
    (
        StatusCode::NOT_FOUND,
        render_page(&client, uri.path(), "404 Not Found", false, content),
    )
        .into_response()
}

#[derive(Serialize)]
struct BuildInfo {
    git_hash: &'static str,
    git_branch: &'static str,
    build_timestamp: &'static str,
    rust_version: &'static str,
    profile: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: String,
    provider: &'static str,
    build: BuildInfo,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let profile = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };

    Json(HealthResponse {
        status: "healthy",
        version: state.settings.version.clone(),
        provider: state.clients.provider_name(),
        build: BuildInfo {
            git_hash: env!("GIT_HASH"),
            git_branch: env!("GIT_BRANCH"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rust_version: env!("RUST_VERSION"),
            profile,
        },
    })
}

async fn metrics() -> Response {
    match monitoring::render() {
        Ok(body) => body.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::helpers::{init_tracing, session_for, test_settings, FakeProvider};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use std::collections::HashMap;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Replays cookies between requests the way a browser tab would.
    struct Browser {
        app: Router,
        cookies: HashMap<String, String>,
    }

    impl Browser {
        fn new(provider: Arc<FakeProvider>) -> Self {
            init_tracing();
            Browser {
                app: router(AppState::new(test_settings(), provider)),
                cookies: HashMap::new(),
            }
        }

        async fn request(&mut self, method: &str, uri: &str, form: Option<&str>) -> Response {
            let mut builder = Request::builder().method(method).uri(uri);
            if !self.cookies.is_empty() {
                let header_value = self
                    .cookies
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join("; ");
                builder = builder.header(header::COOKIE, header_value);
            }
            let body = match form {
                Some(form) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                    Body::from(form.to_string())
                }
                None => Body::empty(),
            };

            let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
            self.remember(&response);
            response
        }

        async fn upload(&mut self, file_names: &[&str]) -> Response {
            let mut body = String::new();
            for name in file_names {
                body.push_str(&format!(
                    "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\ncontent\r\n",
                    name
                ));
            }
            body.push_str("--XBOUNDARY--\r\n");

            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            let request = Request::builder()
                .method("POST")
                .uri("/documents/upload")
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
                .body(Body::from(body))
                .unwrap();
            let response = self.app.clone().oneshot(request).await.unwrap();
            self.remember(&response);
            response
        }

        fn remember(&mut self, response: &Response) {
            for value in response.headers().get_all(header::SET_COOKIE) {
                let raw = value.to_str().unwrap();
                let pair = raw.split(';').next().unwrap();
                let (name, value) = pair.split_once('=').unwrap();
                if value.is_empty() || raw.contains("Max-Age=0") {
                    self.cookies.remove(name);
                } else {
                    self.cookies.insert(name.to_string(), value.to_string());
                }
            }
        }

        async fn page(&mut self, uri: &str) -> (StatusCode, String) {
            let response = self.request("GET", uri, None).await;
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[test]
    fn redirect_targets_must_be_local() {
        assert_eq!(validate_redirect_url("/documents"), "/documents");
        assert_eq!(validate_redirect_url("//evil.com"), "/");
        assert_eq!(validate_redirect_url("https://evil.com"), "/");
        assert_eq!(validate_redirect_url(""), "/");
    }

    #[tokio::test]
    async fn unauthenticated_pages_redirect_to_auth() {
        let mut browser = Browser::new(FakeProvider::new());

        for uri in ["/", "/documents", "/search", "/nowhere"] {
            let response = browser.request("GET", uri, None).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(location(&response), "/auth");
        }
        assert!(browser.cookies.contains_key("cc_client"));

        let (status, body) = browser.page("/auth").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome back to your admin portal"));
    }

    #[tokio::test]
    async fn login_lands_on_dashboard_with_toast() {
        let provider = FakeProvider::new();
        let mut browser = Browser::new(provider.clone());
        browser.page("/auth").await;

        let response = browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef&mode=login"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        assert!(browser.cookies.contains_key("cc_refresh"));

        let (status, body) = browser.page("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome back!"));
        assert!(body.contains("a@b.com"));
        assert!(body.contains("Total Users"));

        // notices are shown once
        let (_, body) = browser.page("/").await;
        assert!(!body.contains("Welcome back!"));

        let response = browser.request("GET", "/auth", None).await;
        assert_eq!(location(&response), "/");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn signup_mode_creates_account() {
        let mut browser = Browser::new(FakeProvider::new());
        let (_, body) = browser.page("/auth?mode=signup").await;
        assert!(body.contains("Create your admin account"));

        let response = browser
            .request("POST", "/auth", Some("email=new%40b.com&password=abcdef&mode=signup"))
            .await;
        assert_eq!(location(&response), "/");

        let (_, body) = browser.page("/").await;
        assert!(body.contains("Account created successfully!"));
    }

    #[tokio::test]
    async fn locally_invalid_credentials_are_rejected_before_the_provider() {
        let provider = FakeProvider::new();
        let mut browser = Browser::new(provider.clone());

        for (form, message) in [
            ("email=bad&password=abcdef&mode=login", "Invalid email address."),
            ("email=a%40b.com&password=abcde&mode=login", "Password must be at least 6 characters"),
        ] {
            let response = browser.request("POST", "/auth", Some(form)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/auth");

            let (status, body) = browser.page("/auth").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body.matches(message).count(), 1, "{}", form);

            let response = browser.request("GET", "/", None).await;
            assert_eq!(location(&response), "/auth");
        }

        assert_eq!(provider.calls(), 0);
        assert!(!browser.cookies.contains_key("cc_refresh"));
    }

    #[tokio::test]
    async fn empty_fields_never_reach_the_provider() {
        let provider = FakeProvider::new();
        let mut browser = Browser::new(provider.clone());

        let response = browser
            .request("POST", "/auth", Some("email=&password=&mode=signup"))
            .await;
        assert_eq!(location(&response), "/auth?mode=signup");

        let (_, body) = browser.page("/auth?mode=signup").await;
        assert!(body.contains("Please fill in all fields"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn provider_rejection_is_shown_on_auth_screen() {
        let provider = FakeProvider::new();
        provider.fail_next(crate::auth::ProviderFailure::WrongSecret);
        let mut browser = Browser::new(provider);

        let response = browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef&mode=login"))
            .await;
        assert_eq!(location(&response), "/auth");
        assert!(!browser.cookies.contains_key("cc_refresh"));

        let (_, body) = browser.page("/auth").await;
        assert!(body.contains("Invalid email or password."));
    }

    #[tokio::test]
    async fn sidebar_and_drawer_state_persist_across_pages() {
        let mut browser = Browser::new(FakeProvider::new());
        browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef"))
            .await;

        let response = browser
            .request("POST", "/ui/sidebar", Some("next=%2Fdocuments"))
            .await;
        assert_eq!(location(&response), "/documents");

        let (_, body) = browser.page("/search").await;
        assert!(body.contains("Expand sidebar"));

        browser
            .request("POST", "/ui/drawer/open", Some("next=%2Fsearch"))
            .await;
        let (_, body) = browser.page("/search").await;
        assert!(body.contains("/ui/drawer/select"));

        let response = browser
            .request("POST", "/ui/drawer/select", Some("section=documents"))
            .await;
        assert_eq!(location(&response), "/documents");
        let (_, body) = browser.page("/documents").await;
        assert!(!body.contains("/ui/drawer/select"));
        assert!(body.contains("Expand sidebar"));
    }

    #[tokio::test]
    async fn logout_clears_session_and_resets_shell() {
        let mut browser = Browser::new(FakeProvider::new());
        browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef"))
            .await;
        browser.request("POST", "/ui/sidebar", Some("next=%2F")).await;

        let response = browser.request("POST", "/logout", Some("next=%2F")).await;
        assert_eq!(location(&response), "/auth");
        assert!(!browser.cookies.contains_key("cc_refresh"));

        let (_, body) = browser.page("/auth").await;
        assert!(body.contains("Logged out successfully"));

        let response = browser.request("GET", "/", None).await;
        assert_eq!(location(&response), "/auth");

        browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef"))
            .await;
        let (_, body) = browser.page("/").await;
        assert!(body.contains("Collapse sidebar"));
    }

    #[tokio::test]
    async fn failed_logout_stays_on_page() {
        let provider = FakeProvider::new();
        let mut browser = Browser::new(provider.clone());
        browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef"))
            .await;

        provider.fail_next(crate::auth::ProviderFailure::Network("down".into()));
        let response = browser
            .request("POST", "/logout", Some("next=%2Fsearch"))
            .await;
        assert_eq!(location(&response), "/search");

        let (status, body) = browser.page("/search").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Failed to logout"));
    }

    #[tokio::test]
    async fn persisted_session_is_restored_for_a_new_client() {
        let provider = FakeProvider::new();
        provider.remember(session_for("back@b.com"));
        let mut browser = Browser::new(provider.clone());
        browser
            .cookies
            .insert("cc_refresh".to_string(), "refresh-back@b.com".to_string());

        let (status, body) = browser.page("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("back@b.com"));
        assert_eq!(provider.restores(), 1);
    }

    #[tokio::test]
    async fn stale_persisted_session_is_dropped() {
        let mut browser = Browser::new(FakeProvider::new());
        browser
            .cookies
            .insert("cc_refresh".to_string(), "refresh-gone@b.com".to_string());

        let response = browser.request("GET", "/", None).await;
        assert_eq!(location(&response), "/auth");
        assert!(!browser.cookies.contains_key("cc_refresh"));
    }

    #[tokio::test]
    async fn unknown_path_renders_404_inside_shell() {
        let mut browser = Browser::new(FakeProvider::new());
        browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef"))
            .await;

        let (status, body) = browser.page("/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page not found"));
        assert!(body.contains("ConstituCheck"));
        assert!(!body.contains(r#"aria-current="page""#));
    }

    #[tokio::test]
    async fn search_is_busy_then_idle() {
        let mut browser = Browser::new(FakeProvider::new());
        browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef"))
            .await;

        let response = browser.request("POST", "/search", Some("q=budget")).await;
        assert_eq!(location(&response), "/search");

        let (_, body) = browser.page("/search").await;
        assert!(body.contains("Searching..."));
        assert!(body.contains(r#"http-equiv="refresh""#));
        assert!(body.contains(r#"value="budget""#));

        tokio::time::sleep(Duration::from_millis(80)).await;
        let (_, body) = browser.page("/search").await;
        assert!(!body.contains("Searching..."));
        assert!(body.contains("3 Results Found"));
    }

    #[tokio::test]
    async fn upload_completes_with_toast() {
        let mut browser = Browser::new(FakeProvider::new());
        browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef"))
            .await;
        // drop the login toast
        browser.page("/").await;

        let response = browser.upload(&["a.pdf", "b.docx"]).await;
        assert_eq!(location(&response), "/documents");

        let (_, body) = browser.page("/documents").await;
        assert!(body.contains("Uploading to VM..."));

        tokio::time::sleep(Duration::from_millis(80)).await;
        let (_, body) = browser.page("/documents").await;
        assert!(body.contains("Successfully uploaded 2 file(s)"));
        assert!(body.contains("Drop files here or click to upload"));
    }

    #[tokio::test]
    async fn empty_upload_is_ignored() {
        let mut browser = Browser::new(FakeProvider::new());
        browser
            .request("POST", "/auth", Some("email=a%40b.com&password=abcdef"))
            .await;

        browser.upload(&[]).await;
        let (_, body) = browser.page("/documents").await;
        assert!(!body.contains("Uploading to VM..."));
    }

    #[tokio::test]
    async fn health_reports_provider() {
        let mut browser = Browser::new(FakeProvider::new());
        let (status, body) = browser.page("/health").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["provider"], "fake");
        assert!(json["build"]["git_hash"].is_string());
        // health is outside the client layer
        assert!(browser.cookies.is_empty());
    }

    #[tokio::test]
    async fn metrics_are_exposed() {
        let mut browser = Browser::new(FakeProvider::new());
        browser.request("GET", "/", None).await;

        let (status, body) = browser.page("/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("constitucheck_gate_redirects_total"));
    }
}
