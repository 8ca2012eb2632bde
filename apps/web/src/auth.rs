//! Email/password sign-in against the hosted auth provider (Supabase GoTrue).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Rejected(String),

    #[error("Sign-in is not configured on this server.")]
    Disabled,

    #[error("Could not reach the sign-in service. Please try again.")]
    Transport(#[from] reqwest::Error),
}

/// A signed-in user, as kept in the browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// First two characters of the email, upper-cased, for the header avatar.
    pub fn initials(&self) -> String {
        let source: &str = if self.email.is_empty() { "U" } else { &self.email };
        source.chars().take(2).collect::<String>().to_uppercase()
    }
}

#[derive(Debug)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    /// The provider wants the address confirmed before issuing a session.
    ConfirmationSent,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
    fn enabled(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    user: GoTrueUser,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct GoTrueError {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl GoTrueSession {
    fn into_session(self, fallback_email: &str) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            user_id: self.user.id,
            email: self
                .user
                .email
                .unwrap_or_else(|| fallback_email.to_string()),
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
        }
    }
}

async fn rejection(response: reqwest::Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoTrueError>(&body)
        .ok()
        .and_then(|e| e.error_description.or(e.msg).or(e.message))
        .unwrap_or_else(|| format!("Authentication failed ({status})"));
    warn!("Auth provider rejected request with {status}: {message}");
    AuthError::Rejected(message)
}

#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(client: Client, base_url: &str, anon_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token?grant_type=password", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let session: GoTrueSession = response.json().await?;
        debug!("Signed in user {}", session.user.id);
        Ok(session.into_session(email))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        // With email confirmation enabled the provider answers with a bare user.
        let body: serde_json::Value = response.json().await?;
        match serde_json::from_value::<GoTrueSession>(body) {
            Ok(session) => Ok(SignUpOutcome::SignedIn(session.into_session(email))),
            Err(_) => Ok(SignUpOutcome::ConfirmationSent),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}

/// Stand-in used when no auth provider is configured.
pub struct DisabledAuth;

#[async_trait]
impl AuthProvider for DisabledAuth {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<AuthSession, AuthError> {
        Err(AuthError::Disabled)
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<SignUpOutcome, AuthError> {
        Err(AuthError::Disabled)
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        Ok(())
    }

    fn enabled(&self) -> bool {
        false
    }
}

/// Accepts only same-site relative paths as a post-login destination.
pub fn safe_redirect(target: Option<&str>) -> String {
    match target {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/upload".to_string(),
    }
}

#[cfg(test)]
pub(crate) fn signed_in(email: &str) -> AuthSession {
    AuthSession {
        access_token: "test-token".to_string(),
        user_id: "user-1".to_string(),
        email: email.to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}
