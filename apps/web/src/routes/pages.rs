use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Extension,
};
use tracing::info;

use crate::analytics::AnalyticsEvent;
use crate::billing::pricing::{checkout_target, find_tier, CheckoutTarget};
use crate::errors::AppError;
use crate::routes::page_context;
use crate::session::SessionId;
use crate::state::AppState;
use crate::views::{render, LandingPage, PricingPage};

/// GET /
pub async fn handle_landing(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
) -> Result<Html<String>, AppError> {
    let (layout, distinct_id) = page_context(&state, id, "Tailored job applications").await;
    state.analytics.capture(
        distinct_id,
        AnalyticsEvent::PageView {
            url: state.config.page_url("/"),
        },
    );
    render(&LandingPage::new(layout))
}

/// GET /pricing
pub async fn handle_pricing(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
) -> Result<Html<String>, AppError> {
    let (layout, distinct_id) = page_context(&state, id, "Pricing").await;
    state
        .analytics
        .capture(distinct_id, AnalyticsEvent::PricingPageViewed);
    render(&PricingPage::new(layout))
}

/// GET /pricing/checkout/:tier
pub async fn handle_checkout(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Path(slug): Path<String>,
) -> Result<Redirect, AppError> {
    let tier = find_tier(&slug).ok_or_else(|| AppError::NotFound(format!("Unknown plan '{slug}'")))?;
    let (signed_in, distinct_id) = state
        .sessions
        .with(id, |s| (s.active_auth().is_some(), s.distinct_id(id)))
        .await;

    match checkout_target(tier, signed_in) {
        CheckoutTarget::External(url) => {
            info!("Checkout started for plan {}", tier.name);
            state.analytics.capture(
                distinct_id,
                AnalyticsEvent::CheckoutStarted {
                    plan_name: tier.name.to_string(),
                    product_id: tier.product_id.unwrap_or_default().to_string(),
                },
            );
            Ok(Redirect::to(&url))
        }
        CheckoutTarget::Internal(path) => Ok(Redirect::to(path)),
    }
}
