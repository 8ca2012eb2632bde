mod analytics;
mod api_client;
mod auth;
mod billing;
mod config;
mod errors;
mod models;
mod results;
mod routes;
mod session;
mod state;
#[cfg(test)]
mod testing;
mod views;
mod workflow;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analytics::Analytics;
use crate::api_client::ApiClient;
use crate::auth::{AuthProvider, DisabledAuth, SupabaseAuth};
use crate::config::Config;
use crate::results::print::HeuristicRenderer;
use crate::routes::build_router;
use crate::session::{spawn_sweeper, SessionStore};
use crate::state::AppState;

/// Timeout for the auth and analytics services. Backend calls have none.
const SIDE_SERVICE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jobs web v{}", env!("CARGO_PKG_VERSION"));

    // Jobs backend gateway
    let api = Arc::new(ApiClient::new(config.api_url.clone())?);
    info!("Jobs API at {}", config.api_url);

    // Shared client for the side services
    let http = reqwest::Client::builder()
        .timeout(SIDE_SERVICE_TIMEOUT)
        .build()?;

    let auth: Arc<dyn AuthProvider> = match config.supabase() {
        Some((url, anon_key)) => {
            info!("Supabase auth enabled");
            Arc::new(SupabaseAuth::new(http.clone(), url, anon_key.to_string()))
        }
        None => {
            warn!("SUPABASE_URL / SUPABASE_ANON_KEY not set, sign-in disabled");
            Arc::new(DisabledAuth)
        }
    };

    let analytics = Analytics::new(http, config.posthog_key.clone(), &config.posthog_host);
    if !analytics.is_enabled() {
        info!("POSTHOG_KEY not set, analytics disabled");
    }

    let sessions = SessionStore::new();
    spawn_sweeper(sessions.clone());

    // Build app state
    let state = AppState {
        config: config.clone(),
        api,
        auth,
        sessions,
        analytics,
        printer: Arc::new(HeuristicRenderer),
    };

    // Build router
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
