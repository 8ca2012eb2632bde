use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::analytics::AnalyticsEvent;
use crate::auth::{safe_redirect, AuthSession, SignUpOutcome};
use crate::billing::credits::fetch_credits;
use crate::errors::AppError;
use crate::routes::page_context;
use crate::session::{session_cookie, ResultStore, SessionId, StoreStatus};
use crate::state::AppState;
use crate::views::{render, AuthPage};
use crate::workflow::wizard::FlowStep;

const CONFIRMATION_NOTICE: &str = "Check your email to confirm your account, then log in.";

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

#[derive(Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
    pub redirect: Option<String>,
}

struct AuthForm {
    is_signup: bool,
    email: String,
    redirect: String,
    error: Option<String>,
    notice: Option<String>,
}

async fn auth_page(state: &AppState, id: SessionId, form: AuthForm) -> Result<AuthPage, AppError> {
    let title = if form.is_signup { "Sign up" } else { "Log in" };
    let (layout, _) = page_context(state, id, title).await;
    Ok(AuthPage {
        layout,
        is_signup: form.is_signup,
        email: form.email,
        redirect: form.redirect,
        error: form.error,
        notice: form.notice,
    })
}

/// Stores the new sign-in under a rotated session id and loads the credits
/// badge for it. Returns the new id and the user id.
async fn establish(state: &AppState, id: SessionId, auth: AuthSession) -> (SessionId, String) {
    let credits = fetch_credits(state.api.as_ref(), &auth.access_token).await;
    let user_id = auth.user_id.clone();
    let fresh = state.sessions.rotate(id).await;
    info!("User {user_id} signed in, session {} rotated to {}", id.0, fresh.0);
    state
        .sessions
        .with(fresh, |s| {
            // In-flight calls report to the old id, so their steps would never finish.
            if matches!(s.wizard.step(), FlowStep::Analyzing | FlowStep::Tailoring) {
                s.wizard.reset();
            }
            if s.results.status() == StoreStatus::Loading {
                s.results = ResultStore::Empty;
            }
            s.auth = Some(auth);
            s.credits = Some(credits);
        })
        .await;
    (fresh, user_id)
}

/// Redirects and binds the browser to the rotated session.
fn signed_in_redirect(to: &str, session: SessionId) -> Response {
    let mut response = Redirect::to(to).into_response();
    if let Some(value) = session_cookie(session) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

/// GET /login
pub async fn handle_login_page(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, AppError> {
    let form = AuthForm {
        is_signup: false,
        email: String::new(),
        redirect: safe_redirect(query.redirect.as_deref()),
        error: None,
        notice: None,
    };
    Ok(render(&auth_page(&state, id, form).await?)?.into_response())
}

/// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let redirect = safe_redirect(form.redirect.as_deref());
    let email = form.email.trim().to_string();

    match state.auth.sign_in(&email, &form.password).await {
        Ok(auth) => {
            let (fresh, user_id) = establish(&state, id, auth).await;
            state
                .analytics
                .capture(user_id, AnalyticsEvent::LoginCompleted);
            Ok(signed_in_redirect(&redirect, fresh))
        }
        Err(e) => {
            warn!("Sign-in failed: {e}");
            let page = auth_page(
                &state,
                id,
                AuthForm {
                    is_signup: false,
                    email,
                    redirect,
                    error: Some(e.to_string()),
                    notice: None,
                },
            )
            .await?;
            Ok((StatusCode::UNAUTHORIZED, render(&page)?).into_response())
        }
    }
}

/// GET /signup
pub async fn handle_signup_page(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, AppError> {
    let distinct_id = state.sessions.with(id, |s| s.distinct_id(id)).await;
    state
        .analytics
        .capture(distinct_id, AnalyticsEvent::SignupStarted);
    let form = AuthForm {
        is_signup: true,
        email: String::new(),
        redirect: safe_redirect(query.redirect.as_deref()),
        error: None,
        notice: None,
    };
    Ok(render(&auth_page(&state, id, form).await?)?.into_response())
}

/// POST /signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let redirect = safe_redirect(form.redirect.as_deref());
    let email = form.email.trim().to_string();

    let (error, notice) = match state.auth.sign_up(&email, &form.password).await {
        Ok(SignUpOutcome::SignedIn(auth)) => {
            let (fresh, user_id) = establish(&state, id, auth).await;
            state
                .analytics
                .capture(user_id, AnalyticsEvent::SignupCompleted);
            return Ok(signed_in_redirect(&redirect, fresh));
        }
        Ok(SignUpOutcome::ConfirmationSent) => (None, Some(CONFIRMATION_NOTICE.to_string())),
        Err(e) => {
            warn!("Sign-up failed: {e}");
            (Some(e.to_string()), None)
        }
    };

    let status = if error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    let page = auth_page(
        &state,
        id,
        AuthForm {
            is_signup: true,
            email,
            redirect,
            error,
            notice,
        },
    )
    .await?;
    Ok((status, render(&page)?).into_response())
}

/// POST /logout
pub async fn handle_logout(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
) -> Redirect {
    let (token, distinct_id) = state
        .sessions
        .with(id, |s| {
            let distinct_id = s.distinct_id(id);
            let token = s.auth.take().map(|a| a.access_token);
            s.credits = None;
            s.results = ResultStore::Empty;
            s.wizard.reset();
            (token, distinct_id)
        })
        .await;

    if let Some(token) = token {
        if let Err(e) = state.auth.sign_out(&token).await {
            warn!("Provider sign-out failed, session cleared locally: {e}");
        }
        state.analytics.capture(distinct_id, AnalyticsEvent::Logout);
    }
    Redirect::to("/")
}
