pub mod auth;
pub mod health;
pub mod pages;
pub mod results;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::session::{session_middleware, SessionId};
use crate::state::AppState;
use crate::views::Layout;
use crate::workflow::upload::MAX_CV_BYTES;

/// Room for the text fields and multipart framing on top of the CV itself.
const UPLOAD_BODY_LIMIT: usize = MAX_CV_BYTES + 1024 * 1024;

/// Page chrome for the caller plus their analytics identity.
pub(crate) async fn page_context(state: &AppState, id: SessionId, title: &str) -> (Layout, String) {
    let auth_enabled = state.auth.enabled();
    state
        .sessions
        .with(id, |s| (Layout::for_session(s, title, auth_enabled), s.distinct_id(id)))
        .await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Marketing + billing
        .route("/", get(pages::handle_landing))
        .route("/pricing", get(pages::handle_pricing))
        .route("/pricing/checkout/:tier", get(pages::handle_checkout))
        // Auth
        .route(
            "/login",
            get(auth::handle_login_page).post(auth::handle_login),
        )
        .route(
            "/signup",
            get(auth::handle_signup_page).post(auth::handle_signup),
        )
        .route("/logout", post(auth::handle_logout))
        // Wizard
        .route(
            "/upload",
            get(upload::handle_upload_page)
                .post(upload::handle_upload_submit)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/upload/skills/toggle", post(upload::handle_toggle_skill))
        .route("/upload/confirm", post(upload::handle_confirm))
        .route("/upload/back", post(upload::handle_back))
        // Results
        .route("/results", get(results::handle_results))
        .route("/results/raw/:tab", get(results::handle_raw))
        .route("/results/download/:tab", get(results::handle_download))
        .route("/results/print/:tab", get(results::handle_print))
        .route("/results/export/:tab", get(results::handle_export))
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_middleware,
        ))
        .with_state(state)
}
