//! Per-browser session state.
//!
//! A session lives as long as the browser keeps the `jobs_session` cookie (no
//! `Max-Age`, so closing the browser ends it) or until it sits idle past
//! [`IDLE_TIMEOUT`]. Nothing here is persisted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::billing::credits::CreditsState;
use crate::models::tailoring::ProcessResponse;
use crate::workflow::wizard::Wizard;

pub const COOKIE_NAME: &str = "jobs_session";
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Empty,
    Loading,
    Ready,
    Error,
}

/// Holds the finished application package for the results page.
#[derive(Debug, Default)]
pub enum ResultStore {
    #[default]
    Empty,
    Loading,
    Ready(Box<ProcessResponse>),
    Error(String),
}

impl ResultStore {
    pub fn status(&self) -> StoreStatus {
        match self {
            ResultStore::Empty => StoreStatus::Empty,
            ResultStore::Loading => StoreStatus::Loading,
            ResultStore::Ready(_) => StoreStatus::Ready,
            ResultStore::Error(_) => StoreStatus::Error,
        }
    }

    pub fn result(&self) -> Option<&ProcessResponse> {
        match self {
            ResultStore::Ready(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub wizard: Wizard,
    pub results: ResultStore,
    pub auth: Option<AuthSession>,
    pub credits: Option<CreditsState>,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            wizard: Wizard::default(),
            results: ResultStore::default(),
            auth: None,
            credits: None,
            last_seen: Instant::now(),
        }
    }
}

impl Session {
    /// The signed-in user's session, if it has not expired.
    pub fn active_auth(&self) -> Option<&AuthSession> {
        self.auth.as_ref().filter(|a| !a.is_expired())
    }

    pub fn access_token(&self) -> Option<String> {
        self.active_auth().map(|a| a.access_token.clone())
    }

    /// Analytics identity: the user id when signed in, otherwise the session.
    pub fn distinct_id(&self, id: SessionId) -> String {
        match self.active_auth() {
            Some(auth) => auth.user_id.clone(),
            None => id.0.to_string(),
        }
    }
}

/// Identifies the caller's session. Inserted into request extensions by [`session_middleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the session if missing and marks it as seen.
    pub async fn touch(&self, id: SessionId) {
        let mut sessions = self.inner.write().await;
        sessions.entry(id.0).or_default().last_seen = Instant::now();
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        self.inner.read().await.contains_key(&id.0)
    }

    /// Runs `f` against the session, creating it first if needed.
    pub async fn with<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.inner.write().await;
        f(sessions.entry(id.0).or_default())
    }

    /// Runs `f` only if the session still exists. Used by background tasks,
    /// which must not resurrect a pruned session.
    pub async fn update<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.inner.write().await;
        sessions.get_mut(&id.0).map(f)
    }

    pub async fn read<R>(&self, id: SessionId, f: impl FnOnce(&Session) -> R) -> Option<R> {
        let sessions = self.inner.read().await;
        sessions.get(&id.0).map(f)
    }

    /// Drops sessions idle for longer than `idle`. Returns how many were removed.
    pub async fn prune_idle(&self, idle: Duration) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_seen.elapsed() < idle);
        before - sessions.len()
    }

    /// Moves the session to a fresh id and forgets the old one, so an id
    /// handed out before sign-in cannot be replayed afterwards.
    pub async fn rotate(&self, id: SessionId) -> SessionId {
        let mut sessions = self.inner.write().await;
        let mut session = sessions.remove(&id.0).unwrap_or_default();
        session.last_seen = Instant::now();
        let fresh = SessionId(Uuid::new_v4());
        sessions.insert(fresh.0, session);
        fresh
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Periodically prunes idle sessions for the lifetime of the process.
pub fn spawn_sweeper(store: SessionStore) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = store.prune_idle(IDLE_TIMEOUT).await;
            if removed > 0 {
                info!("Pruned {removed} idle sessions, {} active", store.len().await);
            }
        }
    })
}

/// The `Set-Cookie` value that binds the browser to `id`.
pub fn session_cookie(id: SessionId) -> Option<HeaderValue> {
    let cookie = format!("{COOKIE_NAME}={}; HttpOnly; SameSite=Lax; Path=/", id.0);
    HeaderValue::from_str(&cookie).ok()
}

fn sets_session_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| v.as_bytes().starts_with(COOKIE_NAME.as_bytes()))
}

fn session_from_cookie(req: &Request) -> Option<Uuid> {
    let cookies = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(COOKIE_NAME)
            .and_then(|rest| rest.strip_prefix('='))
            .and_then(|value| Uuid::parse_str(value).ok())
    })
}

/// Resolves the caller's session from the cookie, issuing a new one when the
/// cookie is missing or refers to a session this process no longer knows.
pub async fn session_middleware(
    State(store): State<SessionStore>,
    mut req: Request,
    next: Next,
) -> Response {
    let existing = match session_from_cookie(&req) {
        Some(id) if store.contains(SessionId(id)).await => Some(id),
        _ => None,
    };
    let id = SessionId(existing.unwrap_or_else(Uuid::new_v4));
    store.touch(id).await;
    req.extensions_mut().insert(id);

    let mut response = next.run(req).await;

    // A handler that rotated the session has already set the cookie.
    if existing.is_none() && !sets_session_cookie(&response) {
        debug!("Issued session {}", id.0);
        if let Some(value) = session_cookie(id) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Extension, Router};
    use tower::ServiceExt;

    async fn whoami(Extension(id): Extension<SessionId>) -> String {
        id.0.to_string()
    }

    fn app(store: SessionStore) -> Router {
        Router::new()
            .route("/", get(whoami))
            .layer(axum::middleware::from_fn_with_state(
                store,
                session_middleware,
            ))
    }

    #[test]
    fn test_result_store_status() {
        assert_eq!(ResultStore::default().status(), StoreStatus::Empty);
        assert_eq!(ResultStore::Loading.status(), StoreStatus::Loading);
        assert_eq!(
            ResultStore::Error("boom".to_string()).status(),
            StoreStatus::Error
        );
        assert!(ResultStore::Loading.result().is_none());
    }

    #[tokio::test]
    async fn test_new_visitor_gets_a_cookie() {
        let store = SessionStore::new();
        let response = app(store.clone())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("jobs_session="));
        assert!(cookie.contains("HttpOnly"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_known_cookie_is_reused() {
        let store = SessionStore::new();
        let id = SessionId(Uuid::new_v4());
        store.touch(id).await;

        let response = app(store.clone())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .header(header::COOKIE, format!("theme=dark; jobs_session={}", id.0))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_forged_cookie_gets_a_fresh_session() {
        let store = SessionStore::new();
        let response = app(store.clone())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .header(header::COOKIE, format!("jobs_session={}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_rotate_moves_the_session_to_a_new_id() {
        let store = SessionStore::new();
        let old = SessionId(Uuid::new_v4());
        store
            .with(old, |s| s.results = ResultStore::Loading)
            .await;

        let fresh = store.rotate(old).await;

        assert_ne!(fresh, old);
        assert!(!store.contains(old).await);
        assert_eq!(
            store.read(fresh, |s| s.results.status()).await,
            Some(StoreStatus::Loading)
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_handler_cookie_is_not_overwritten() {
        async fn rotating(
            State(store): State<SessionStore>,
            Extension(id): Extension<SessionId>,
        ) -> Response {
            let fresh = store.rotate(id).await;
            let mut response = Response::new(Body::from(fresh.0.to_string()));
            if let Some(value) = session_cookie(fresh) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            response
        }

        let store = SessionStore::new();
        let app = Router::new()
            .route("/", get(rotating))
            .layer(axum::middleware::from_fn_with_state(
                store.clone(),
                session_middleware,
            ))
            .with_state(store.clone());

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_does_not_resurrect_pruned_sessions() {
        let store = SessionStore::new();
        let id = SessionId(Uuid::new_v4());
        store.touch(id).await;

        assert_eq!(store.prune_idle(Duration::ZERO).await, 1);
        assert!(store.update(id, |_| ()).await.is_none());
        assert_eq!(store.len().await, 0);
    }
}
