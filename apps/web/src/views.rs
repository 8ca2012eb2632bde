//! Page templates. Everything a template shows is precomputed here so the
//! HTML files stay free of logic beyond `if` and `for`.

use askama::Template;
use axum::response::Html;

use crate::billing::credits::CreditsBadge;
use crate::billing::pricing::{Faq, PricingTier, FAQS, TIERS};
use crate::errors::AppError;
use crate::results::ResultsView;
use crate::session::Session;
use crate::workflow::progress::{ProgressPlan, StepView};
use crate::workflow::skill_gap::SkillGapView;

/// Seconds between reloads of a page that waits on a backend call.
pub const REFRESH_SECS: u32 = 1;

/// Header and `<head>` data shared by every page.
pub struct Layout {
    pub title: String,
    pub user_email: Option<String>,
    pub user_initials: Option<String>,
    pub credits: Option<CreditsBadge>,
    pub auth_enabled: bool,
    pub refresh_secs: Option<u32>,
}

impl Layout {
    /// Layout with no user information, for error pages.
    pub fn bare(title: &str) -> Self {
        Self {
            title: title.to_string(),
            user_email: None,
            user_initials: None,
            credits: None,
            auth_enabled: false,
            refresh_secs: None,
        }
    }

    pub fn for_session(session: &Session, title: &str, auth_enabled: bool) -> Self {
        let auth = session.active_auth();
        Self {
            title: title.to_string(),
            user_email: auth.map(|a| a.email.clone()),
            user_initials: auth.map(|a| a.initials()),
            credits: auth
                .and(session.credits.as_ref())
                .map(CreditsBadge::from_state),
            auth_enabled,
            refresh_secs: None,
        }
    }

    pub fn refreshing(mut self) -> Self {
        self.refresh_secs = Some(REFRESH_SECS);
        self
    }
}

pub fn render(page: &impl Template) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}

#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingPage {
    pub layout: Layout,
    pub tiers: &'static [PricingTier],
    pub faqs: &'static [Faq],
}

impl LandingPage {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            tiers: TIERS,
            faqs: FAQS,
        }
    }
}

#[derive(Template)]
#[template(path = "pricing.html")]
pub struct PricingPage {
    pub layout: Layout,
    pub tiers: &'static [PricingTier],
    pub faqs: &'static [Faq],
}

impl PricingPage {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            tiers: TIERS,
            faqs: FAQS,
        }
    }
}

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthPage {
    pub layout: Layout,
    pub is_signup: bool,
    pub email: String,
    pub redirect: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadPage {
    pub layout: Layout,
    pub error: Option<String>,
    pub job_description: String,
    pub job_url: String,
    pub company_url: String,
}

#[derive(Template)]
#[template(path = "progress.html")]
pub struct ProgressPage {
    pub layout: Layout,
    pub heading: &'static str,
    pub subtitle: &'static str,
    pub steps: Vec<StepView>,
}

impl ProgressPage {
    pub fn new(layout: Layout, plan: &ProgressPlan, elapsed: std::time::Duration) -> Self {
        Self {
            layout: layout.refreshing(),
            heading: plan.title,
            subtitle: plan.subtitle,
            steps: plan.snapshot(elapsed),
        }
    }
}

#[derive(Template)]
#[template(path = "skill_gap.html")]
pub struct SkillGapPage {
    pub layout: Layout,
    pub role_title: String,
    pub company_name: String,
    pub gap: SkillGapView,
    pub confirmed_count: usize,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsPage {
    pub layout: Layout,
    pub view: ResultsView,
}

#[derive(Template)]
#[template(path = "results_loading.html")]
pub struct ResultsLoadingPage {
    pub layout: Layout,
}

/// Standalone print document; opens the browser print dialog on load.
#[derive(Template)]
#[template(path = "print.html")]
pub struct PrintPage {
    pub title: String,
    pub body: String,
    pub is_resume: bool,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub layout: Layout,
    pub status: u16,
    pub message: String,
}
