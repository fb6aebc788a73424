//! Firebase Authentication over its REST endpoints.
//!
//! Password sign-up/sign-in go through the Identity Toolkit API, session
//! restore through the Secure Token exchange followed by an account lookup.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;

use super::{IdentityProvider, ProviderFailure};
use crate::config::Settings;
use crate::models::{IdentityToken, Session};

pub struct FirebaseProvider {
    http: reqwest::Client,
    api_key: String,
    toolkit_url: String,
    token_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
struct LookupUser {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseProvider {
    pub fn new(
        api_key: impl Into<String>,
        toolkit_url: impl Into<String>,
        token_url: impl Into<String>,
        timeout: StdDuration,
    ) -> anyhow::Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(anyhow!("FIREBASE_API_KEY must be set for the firebase provider"));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building identity provider HTTP client")?;

        Ok(FirebaseProvider {
            http,
            api_key,
            toolkit_url: toolkit_url.into().trim_end_matches('/').to_string(),
            token_url: token_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            settings.firebase_api_key.clone(),
            settings.identity_toolkit_url.clone(),
            settings.secure_token_url.clone(),
            StdDuration::from_secs(settings.provider_timeout_secs),
        )
    }

    async fn password_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderFailure> {
        let url = format!("{}/accounts:{}", self.toolkit_url, endpoint);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(transport_failure)?;

        let body: PasswordResponse = decode(response).await?;
        Ok(Session::new(
            body.local_id,
            body.email,
            IdentityToken::new(body.id_token),
            IdentityToken::new(body.refresh_token),
            Utc::now() + Duration::seconds(parse_expires_in(&body.expires_in)),
        ))
    }

    async fn lookup_email(&self, id_token: &str) -> Result<Option<String>, ProviderFailure> {
        let url = format!("{}/accounts:lookup", self.toolkit_url);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&LookupRequest { id_token })
            .send()
            .await
            .map_err(transport_failure)?;

        let body: LookupResponse = decode(response).await?;
        Ok(body.users.into_iter().next().and_then(|user| user.email))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseProvider {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn create_account(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, ProviderFailure> {
        self.password_call("signUp", identifier, secret).await
    }

    async fn verify_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, ProviderFailure> {
        self.password_call("signInWithPassword", identifier, secret)
            .await
    }

    async fn invalidate_session(&self, _session: &Session) -> Result<(), ProviderFailure> {
        // Sign-out is client-side only: dropping the tokens ends the session.
        Ok(())
    }

    async fn restore_session(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, ProviderFailure> {
        let url = format!("{}/token", self.token_url);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await
            .map_err(transport_failure)?;

        let body: RefreshResponse = match decode(response).await {
            Ok(body) => body,
            Err(ProviderFailure::SessionInvalid) => return Ok(None),
            Err(failure) => return Err(failure),
        };

        let Some(email) = self.lookup_email(&body.id_token).await? else {
            return Ok(None);
        };

        Ok(Some(Session::new(
            body.user_id,
            email,
            IdentityToken::new(body.id_token),
            IdentityToken::new(body.refresh_token),
            Utc::now() + Duration::seconds(parse_expires_in(&body.expires_in)),
        )))
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderFailure> {
    if response.status().is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ProviderFailure::Unknown(format!("malformed response: {}", e)));
    }

    let status = response.status();
    match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => Err(classify(&envelope.error.message)),
        Err(_) => Err(ProviderFailure::Unknown(format!("HTTP {}", status))),
    }
}

fn transport_failure(err: reqwest::Error) -> ProviderFailure {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        ProviderFailure::Network(err.to_string())
    } else {
        ProviderFailure::Unknown(err.to_string())
    }
}

/// Map a provider error message such as `WEAK_PASSWORD : Password should be
/// at least 6 characters` onto the provider vocabulary.
fn classify(message: &str) -> ProviderFailure {
    let code = message
        .split(|c: char| c == ' ' || c == ':')
        .next()
        .unwrap_or_default();

    match code {
        "EMAIL_EXISTS" => ProviderFailure::DuplicateIdentity,
        "INVALID_EMAIL" | "MISSING_EMAIL" => ProviderFailure::InvalidIdentifier,
        "EMAIL_NOT_FOUND" => ProviderFailure::IdentityNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "MISSING_PASSWORD" => {
            ProviderFailure::WrongSecret
        }
        "WEAK_PASSWORD" => ProviderFailure::WeakSecret,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => ProviderFailure::RateLimited,
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_DISABLED" | "USER_NOT_FOUND"
        | "INVALID_ID_TOKEN" => ProviderFailure::SessionInvalid,
        _ => ProviderFailure::Unknown(message.to_string()),
    }
}

/// `expiresIn` arrives as a decimal string of seconds.
fn parse_expires_in(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(3600)
}
