use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Read once at startup; every value has a default so a bare `cargo run` works.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub port: u16,
    pub rust_log: String,
    pub public_url: String,
    pub posthog_key: Option<String>,
    pub posthog_host: String,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        Ok(Config {
            api_url: env_or("API_URL", "http://localhost:8000"),
            port,
            rust_log: env_or("RUST_LOG", "info"),
            public_url: optional_env("PUBLIC_URL")
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            posthog_key: optional_env("POSTHOG_KEY"),
            posthog_host: env_or("POSTHOG_HOST", "https://us.i.posthog.com"),
            supabase_url: optional_env("SUPABASE_URL"),
            supabase_anon_key: optional_env("SUPABASE_ANON_KEY"),
        })
    }

    /// Both Supabase values are needed before sign-in is offered.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }

    /// Absolute URL for a path, as reported in page views.
    pub fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.public_url.trim_end_matches('/'), path)
    }
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        api_url: "http://localhost:8000".to_string(),
        port: 3000,
        rust_log: "info".to_string(),
        public_url: "http://localhost:3000/".to_string(),
        posthog_key: None,
        posthog_host: "https://us.i.posthog.com".to_string(),
        supabase_url: None,
        supabase_anon_key: None,
    }
}
