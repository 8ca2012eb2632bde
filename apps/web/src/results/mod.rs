//! The results viewer: tab selection, exports and the page view model.

pub mod print;

use serde::Serialize;

use crate::analytics::AnalyticsEvent;
use crate::models::analysis::CompanyIntel;
use crate::models::tailoring::ProcessResponse;
use crate::results::print::{render_markdown, PrintKind};

/// How long the "Copied!" indicator stays visible.
pub const COPIED_INDICATOR_MS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultTab {
    #[default]
    Resume,
    Cover,
    Email,
    Company,
}

/// What the "Download" button does for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportAction {
    Print(PrintKind),
    Download,
}

impl ResultTab {
    pub const ALL: [ResultTab; 4] = [
        ResultTab::Resume,
        ResultTab::Cover,
        ResultTab::Email,
        ResultTab::Company,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ResultTab::Resume => "resume",
            ResultTab::Cover => "cover",
            ResultTab::Email => "email",
            ResultTab::Company => "company",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResultTab::Resume => "ATS Resume",
            ResultTab::Cover => "Cover Letter",
            ResultTab::Email => "Cold Email",
            ResultTab::Company => "Company Intel",
        }
    }

    pub fn parse(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.slug() == slug)
    }

    /// The text the copy and download actions operate on.
    pub fn active_text(self, result: &ProcessResponse) -> &str {
        match self {
            ResultTab::Resume => &result.tailored_resume.resume_markdown,
            ResultTab::Cover => &result.writing.cover_letter.content,
            ResultTab::Email => &result.writing.cold_email.content,
            ResultTab::Company => &result.writing.company_summary.content,
        }
    }

    pub fn download_filename(self) -> String {
        format!("jobs_{}.md", self.slug())
    }

    pub fn print_kind(self) -> Option<PrintKind> {
        match self {
            ResultTab::Resume => Some(PrintKind::Resume),
            ResultTab::Cover => Some(PrintKind::CoverLetter),
            _ => None,
        }
    }

    pub fn export_action(self) -> ExportAction {
        self.print_kind()
            .map(ExportAction::Print)
            .unwrap_or(ExportAction::Download)
    }

    pub fn view_event(self) -> Option<AnalyticsEvent> {
        match self {
            ResultTab::Resume => Some(AnalyticsEvent::ResumeSectionViewed {
                section: "resume".to_string(),
            }),
            ResultTab::Cover => Some(AnalyticsEvent::CoverLetterViewed),
            ResultTab::Email => Some(AnalyticsEvent::ColdEmailViewed),
            ResultTab::Company => Some(AnalyticsEvent::ResumeSectionViewed {
                section: "company".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TabLink {
    pub slug: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntelCard {
    pub label: &'static str,
    pub value: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceLink {
    pub url: String,
    pub title: String,
    pub fact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompanyView {
    pub summary: String,
    pub recommendation: Option<String>,
    pub confidence: Option<String>,
    pub confidence_class: &'static str,
    pub cards: Vec<IntelCard>,
    pub mission: Option<String>,
    pub reputation: Option<String>,
    pub culture: Vec<String>,
    pub red_flags: Vec<String>,
    pub news: Vec<String>,
    pub sources: Vec<SourceLink>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// True only for absolute `http://` or `https://` URLs.
pub fn is_web_url(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Website cards link out; bare domains get an https scheme.
pub fn website_href(value: &str) -> String {
    if is_web_url(value) {
        value.trim().to_string()
    } else {
        format!("https://{value}")
    }
}

impl CompanyView {
    pub fn build(intel: &CompanyIntel, summary: &str) -> Self {
        let mut cards = Vec::new();
        for (label, value) in [
            ("Industry", &intel.industry),
            ("Company Size", &intel.employee_count_range),
            ("Stage", &intel.company_stage),
        ] {
            if !value.trim().is_empty() {
                cards.push(IntelCard {
                    label,
                    value: value.clone(),
                    href: None,
                });
            }
        }
        if !intel.website.trim().is_empty() {
            cards.push(IntelCard {
                label: "Website",
                value: intel.website.clone(),
                href: Some(website_href(&intel.website)),
            });
        }

        let confidence = non_empty(&intel.confidence_level);
        let confidence_class = match confidence.as_deref() {
            Some("High") => "confidence-high",
            Some("Medium") => "confidence-medium",
            Some(_) => "confidence-low",
            None => "",
        };

        Self {
            summary: summary.to_string(),
            recommendation: non_empty(&intel.recommendation),
            confidence,
            confidence_class,
            cards,
            mission: non_empty(&intel.mission),
            reputation: non_empty(&intel.reputation_summary),
            culture: intel.culture_highlights.clone(),
            red_flags: intel.red_flags.clone(),
            news: intel.recent_funding_or_news.clone(),
            sources: intel
                .sources
                .iter()
                .filter(|s| is_web_url(&s.url))
                .map(|s| SourceLink {
                    url: s.url.clone(),
                    title: non_empty(&s.title).unwrap_or_else(|| s.url.clone()),
                    fact: non_empty(&s.fact),
                })
                .collect(),
        }
    }
}

/// Everything the results page renders for one active tab.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub role_title: String,
    pub company_name: String,
    pub active_slug: &'static str,
    pub active_label: &'static str,
    pub tabs: Vec<TabLink>,
    pub is_resume: bool,
    pub is_company: bool,
    pub resume_html: String,
    pub letter_text: String,
    pub company: CompanyView,
    pub keywords_used: usize,
    pub skills_matched: usize,
    pub warnings: Vec<String>,
    pub copied_ms: u32,
}

impl ResultsView {
    pub fn build(result: &ProcessResponse, tab: ResultTab) -> Self {
        let is_letter = matches!(tab, ResultTab::Cover | ResultTab::Email);
        Self {
            role_title: result.job_analysis.role_title.clone(),
            company_name: result.company_intel.company_name.clone(),
            active_slug: tab.slug(),
            active_label: tab.label(),
            tabs: ResultTab::ALL
                .into_iter()
                .map(|t| TabLink {
                    slug: t.slug(),
                    label: t.label(),
                    active: t == tab,
                })
                .collect(),
            is_resume: tab == ResultTab::Resume,
            is_company: tab == ResultTab::Company,
            resume_html: if tab == ResultTab::Resume {
                render_markdown(&result.tailored_resume.resume_markdown)
            } else {
                String::new()
            },
            letter_text: if is_letter {
                tab.active_text(result).to_string()
            } else {
                String::new()
            },
            company: if tab == ResultTab::Company {
                CompanyView::build(&result.company_intel, &result.writing.company_summary.content)
            } else {
                CompanyView::default()
            },
            keywords_used: result.tailored_resume.keywords_used.len(),
            skills_matched: result.tailored_resume.matched_skills.len(),
            warnings: result.warnings.clone(),
            copied_ms: COPIED_INDICATOR_MS,
        }
    }
}
