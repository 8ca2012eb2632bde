use serde::{Deserialize, Serialize};

/// Billing tier as reported by the credits endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Team,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Pro => "Pro",
            Tier::Team => "Team",
        }
    }
}

/// Response of `GET /api/credits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditsInfo {
    pub credits_remaining: u32,
    pub credits_used_this_month: u32,
    pub tier: Tier,
    pub tier_limit: u32,
    #[serde(default)]
    pub credits_reset_at: Option<String>,
}

impl CreditsInfo {
    /// What the badge shows when the billing service cannot be reached.
    pub fn free_default() -> Self {
        Self {
            credits_remaining: 3,
            credits_used_this_month: 0,
            tier: Tier::Free,
            tier_limit: 3,
            credits_reset_at: None,
        }
    }
}
