//! Credits badge state. A failed fetch is a distinct, visible state rather than
//! a silent substitution, so "really on the free tier" and "billing unreachable"
//! can be told apart.

use serde::Serialize;
use tracing::warn;

use crate::api_client::JobsApi;
use crate::models::credits::{CreditsInfo, Tier};

#[derive(Debug, Clone, PartialEq)]
pub enum CreditsState {
    Loaded(CreditsInfo),
    /// The fetch failed; carries what the badge shows instead.
    Unavailable(CreditsInfo),
}

impl CreditsState {
    pub fn info(&self) -> &CreditsInfo {
        match self {
            CreditsState::Loaded(info) | CreditsState::Unavailable(info) => info,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, CreditsState::Loaded(_))
    }
}

pub async fn fetch_credits(api: &dyn JobsApi, token: &str) -> CreditsState {
    match api.credits(token).await {
        Ok(info) => CreditsState::Loaded(info),
        Err(e) => {
            warn!("Failed to fetch credits, showing free-tier default: {e}");
            CreditsState::Unavailable(CreditsInfo::free_default())
        }
    }
}

/// Header badge.
#[derive(Debug, Clone, Serialize)]
pub struct CreditsBadge {
    pub tier_label: &'static str,
    pub tier_class: &'static str,
    pub remaining: u32,
    pub limit: u32,
    pub is_low: bool,
    pub is_estimate: bool,
}

impl CreditsBadge {
    pub fn from_state(state: &CreditsState) -> Self {
        let info = state.info();
        Self {
            tier_label: info.tier.label(),
            tier_class: match info.tier {
                Tier::Free => "tier-free",
                Tier::Pro => "tier-pro",
                Tier::Team => "tier-team",
            },
            remaining: info.credits_remaining,
            limit: info.tier_limit,
            is_low: info.credits_remaining <= 1 && info.tier == Tier::Free,
            is_estimate: !state.is_available(),
        }
    }
}
