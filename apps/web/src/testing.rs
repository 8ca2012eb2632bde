//! In-memory doubles shared by the unit and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::analytics::Analytics;
use crate::api_client::{ApiError, JobsApi};
use crate::auth::{signed_in, AuthError, AuthProvider, AuthSession, DisabledAuth, SignUpOutcome};
use crate::config::test_config;
use crate::models::analysis::AnalysisResponse;
use crate::models::credits::CreditsInfo;
use crate::models::tailoring::{TailorRequest, TailorResponse};
use crate::results::print::HeuristicRenderer;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::workflow::upload::AnalyzeRequest;

/// A backend that answers from canned values. Anything not configured fails
/// the way the real backend does.
#[derive(Default)]
pub struct FakeApi {
    analysis: Option<AnalysisResponse>,
    tailored: Option<TailorResponse>,
    credits: Option<CreditsInfo>,
    analyze_calls: AtomicUsize,
    tailor_requests: Mutex<Vec<TailorRequest>>,
}

impl FakeApi {
    pub fn with_credits(info: CreditsInfo) -> Self {
        Self {
            credits: Some(info),
            ..Default::default()
        }
    }

    pub fn returning_analysis(mut self, analysis: AnalysisResponse) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn returning_tailored(mut self, tailored: TailorResponse) -> Self {
        self.tailored = Some(tailored);
        self
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn tailor_requests(&self) -> Vec<TailorRequest> {
        self.tailor_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobsApi for FakeApi {
    async fn analyze(
        &self,
        _request: &AnalyzeRequest,
        _token: Option<&str>,
    ) -> Result<AnalysisResponse, ApiError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.analysis.clone().ok_or_else(|| ApiError::Backend {
            status: 402,
            detail: "quota exceeded".to_string(),
        })
    }

    async fn tailor(
        &self,
        request: &TailorRequest,
        _token: Option<&str>,
    ) -> Result<TailorResponse, ApiError> {
        self.tailor_requests.lock().unwrap().push(request.clone());
        self.tailored.clone().ok_or_else(|| ApiError::Backend {
            status: 500,
            detail: "Tailoring failed".to_string(),
        })
    }

    async fn credits(&self, _token: &str) -> Result<CreditsInfo, ApiError> {
        self.credits.clone().ok_or_else(|| ApiError::Backend {
            status: 503,
            detail: "Failed to fetch credits".to_string(),
        })
    }
}

/// A sign-in provider that accepts any credentials.
pub struct FakeAuth;

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthSession, AuthError> {
        Ok(signed_in(email))
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpOutcome, AuthError> {
        Ok(SignUpOutcome::SignedIn(signed_in(email)))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

pub fn test_state(api: Arc<dyn JobsApi>) -> AppState {
    AppState {
        config: test_config(),
        api,
        auth: Arc::new(DisabledAuth),
        sessions: SessionStore::new(),
        analytics: Analytics::disabled(),
        printer: Arc::new(HeuristicRenderer),
    }
}
