use std::sync::Arc;

use crate::analytics::Analytics;
use crate::api_client::JobsApi;
use crate::auth::AuthProvider;
use crate::config::Config;
use crate::results::print::PrintRenderer;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Jobs backend. Default: ApiClient against API_URL.
    pub api: Arc<dyn JobsApi>,
    /// Sign-in provider. DisabledAuth when Supabase is not configured.
    pub auth: Arc<dyn AuthProvider>,
    pub sessions: SessionStore,
    pub analytics: Analytics,
    pub printer: Arc<dyn PrintRenderer>,
}
