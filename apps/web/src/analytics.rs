//! Product analytics via the PostHog capture API.
//!
//! Capturing never blocks a request and never fails one: events are sent on a
//! spawned task and delivery problems are only logged.

use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Every event the frontend reports, with its properties.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    PageView { url: String },
    SignupStarted,
    SignupCompleted,
    LoginCompleted,
    Logout,
    ResumeUploaded { file_type: String, file_size_bytes: usize },
    AnalysisStarted { has_job_url: bool, has_company_url: bool },
    AnalysisCompleted { match_score: u32, duration_ms: u128 },
    AnalysisError { error_type: String },
    TailoringStarted,
    TailoringCompleted { duration_ms: u128 },
    ResumeSectionViewed { section: String },
    ResumeDownloaded { format: &'static str },
    CoverLetterViewed,
    ColdEmailViewed,
    PricingPageViewed,
    CheckoutStarted { plan_name: String, product_id: String },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::PageView { .. } => "$pageview",
            AnalyticsEvent::SignupStarted => "signup_started",
            AnalyticsEvent::SignupCompleted => "signup_completed",
            AnalyticsEvent::LoginCompleted => "login_completed",
            AnalyticsEvent::Logout => "logout",
            AnalyticsEvent::ResumeUploaded { .. } => "resume_uploaded",
            AnalyticsEvent::AnalysisStarted { .. } => "analysis_started",
            AnalyticsEvent::AnalysisCompleted { .. } => "analysis_completed",
            AnalyticsEvent::AnalysisError { .. } => "analysis_error",
            AnalyticsEvent::TailoringStarted => "tailoring_started",
            AnalyticsEvent::TailoringCompleted { .. } => "tailoring_completed",
            AnalyticsEvent::ResumeSectionViewed { .. } => "resume_section_viewed",
            AnalyticsEvent::ResumeDownloaded { .. } => "resume_downloaded",
            AnalyticsEvent::CoverLetterViewed => "cover_letter_viewed",
            AnalyticsEvent::ColdEmailViewed => "cold_email_viewed",
            AnalyticsEvent::PricingPageViewed => "pricing_page_viewed",
            AnalyticsEvent::CheckoutStarted { .. } => "checkout_started",
        }
    }

    pub fn properties(&self) -> Map<String, Value> {
        let value = match self {
            AnalyticsEvent::PageView { url } => json!({ "$current_url": url }),
            AnalyticsEvent::SignupCompleted | AnalyticsEvent::LoginCompleted => {
                json!({ "method": "email" })
            }
            AnalyticsEvent::ResumeUploaded {
                file_type,
                file_size_bytes,
            } => json!({ "file_type": file_type, "file_size_bytes": file_size_bytes }),
            AnalyticsEvent::AnalysisStarted {
                has_job_url,
                has_company_url,
            } => json!({ "has_job_url": has_job_url, "has_company_url": has_company_url }),
            AnalyticsEvent::AnalysisCompleted {
                match_score,
                duration_ms,
            } => json!({ "match_score": match_score, "duration_ms": duration_ms }),
            AnalyticsEvent::AnalysisError { error_type } => json!({ "error_type": error_type }),
            AnalyticsEvent::TailoringCompleted { duration_ms } => {
                json!({ "duration_ms": duration_ms })
            }
            AnalyticsEvent::ResumeSectionViewed { section } => json!({ "section": section }),
            AnalyticsEvent::ResumeDownloaded { format } => json!({ "format": format }),
            AnalyticsEvent::CheckoutStarted {
                plan_name,
                product_id,
            } => json!({ "plan_name": plan_name, "product_id": product_id }),
            _ => json!({}),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CapturePayload<'a> {
    api_key: &'a str,
    event: &'a str,
    distinct_id: &'a str,
    properties: Map<String, Value>,
}

#[derive(Clone)]
pub struct Analytics {
    client: Client,
    api_key: Option<String>,
    capture_url: String,
}

impl Analytics {
    pub fn new(client: Client, api_key: Option<String>, host: &str) -> Self {
        Self {
            client,
            api_key,
            capture_url: format!("{}/capture/", host.trim_end_matches('/')),
        }
    }

    /// An instance that drops every event.
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::new(Client::new(), None, "http://localhost")
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends the event in the background.
    pub fn capture(&self, distinct_id: impl Into<String>, event: AnalyticsEvent) {
        if !self.is_enabled() {
            return;
        }
        let this = self.clone();
        let distinct_id = distinct_id.into();
        tokio::spawn(async move {
            this.deliver(&distinct_id, &event).await;
        });
    }

    async fn deliver(&self, distinct_id: &str, event: &AnalyticsEvent) -> bool {
        let Some(api_key) = self.api_key.as_deref() else {
            return false;
        };
        let payload = CapturePayload {
            api_key,
            event: event.name(),
            distinct_id,
            properties: event.properties(),
        };

        match self.client.post(&self.capture_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Captured {}", event.name());
                true
            }
            Ok(response) => {
                warn!("Analytics capture of {} returned {}", event.name(), response.status());
                false
            }
            Err(e) => {
                warn!("Analytics capture of {} failed: {e}", event.name());
                false
            }
        }
    }
}
