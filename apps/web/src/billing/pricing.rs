//! Pricing table and outbound checkout links.

use serde::Serialize;

const CHECKOUT_BASE: &str = "https://polar.sh/api/v1/checkouts/custom/";

#[derive(Debug, Serialize)]
pub struct PricingTier {
    pub slug: &'static str,
    pub name: &'static str,
    pub price: &'static str,
    pub period: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub cta: &'static str,
    pub highlight: bool,
    pub product_id: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const TIERS: &[PricingTier] = &[
    PricingTier {
        slug: "free",
        name: "Free",
        price: "$0",
        period: "forever",
        description: "Perfect for trying out Jobs AI",
        features: &[
            "3 resume analyses per month",
            "Company voice mirroring",
            "ATS-optimized output",
            "Cover letter generation",
            "Cold email templates",
        ],
        cta: "Get Started",
        highlight: false,
        product_id: None,
    },
    PricingTier {
        slug: "pro",
        name: "Pro",
        price: "$9",
        period: "/month",
        description: "For active job seekers",
        features: &[
            "30 resume analyses per month",
            "Everything in Free",
            "Priority processing",
            "PDF export",
            "Email support",
        ],
        cta: "Upgrade to Pro",
        highlight: true,
        product_id: Some("72a37199-b2a2-490c-a26d-0b75604d13aa"),
    },
    PricingTier {
        slug: "team",
        name: "Team",
        price: "$29",
        period: "/month",
        description: "For career coaches & power users",
        features: &[
            "100 resume analyses per month",
            "Everything in Pro",
            "Bulk processing",
            "Usage analytics",
            "Priority support",
        ],
        cta: "Upgrade to Team",
        highlight: false,
        product_id: Some("6c45e5f4-15ca-4fbb-8ba7-91a4bbcccc6e"),
    },
];

pub const FAQS: &[Faq] = &[
    Faq {
        question: "What counts as an analysis?",
        answer: "One analysis includes generating a tailored resume, cover letter, and cold email for a single job application.",
    },
    Faq {
        question: "Do unused credits roll over?",
        answer: "Monthly credits reset each billing cycle. Purchased credit packs never expire.",
    },
    Faq {
        question: "Can I upgrade or downgrade anytime?",
        answer: "Yes! You can change your plan at any time. Changes take effect immediately.",
    },
    Faq {
        question: "Is my data secure?",
        answer: "Absolutely. We use industry-standard encryption. Your resume data is never shared or used for training.",
    },
];

pub fn find_tier(slug: &str) -> Option<&'static PricingTier> {
    TIERS.iter().find(|t| t.slug.eq_ignore_ascii_case(slug))
}

/// Where the checkout button for `tier` leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTarget {
    /// Hosted checkout at the billing provider.
    External(String),
    Internal(&'static str),
}

pub fn checkout_target(tier: &PricingTier, signed_in: bool) -> CheckoutTarget {
    match tier.product_id {
        Some(product_id) => CheckoutTarget::External(format!("{CHECKOUT_BASE}?productId={product_id}")),
        None if signed_in => CheckoutTarget::Internal("/upload"),
        None => CheckoutTarget::Internal("/signup"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_tier_goes_to_hosted_checkout() {
        let pro = find_tier("pro").unwrap();
        assert_eq!(
            checkout_target(pro, false),
            CheckoutTarget::External(
                "https://polar.sh/api/v1/checkouts/custom/?productId=72a37199-b2a2-490c-a26d-0b75604d13aa"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_free_tier_depends_on_sign_in() {
        let free = find_tier("Free").unwrap();
        assert_eq!(checkout_target(free, true), CheckoutTarget::Internal("/upload"));
        assert_eq!(checkout_target(free, false), CheckoutTarget::Internal("/signup"));
    }

    #[test]
    fn test_unknown_tier() {
        assert!(find_tier("enterprise").is_none());
    }

    #[test]
    fn test_exactly_one_highlighted_tier() {
        assert_eq!(TIERS.iter().filter(|t| t.highlight).count(), 1);
    }
}
