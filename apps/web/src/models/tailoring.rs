//! Step 2 payloads and the merged result the results page reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::analysis::{AnalysisResponse, CompanyIntel, JobAnalysis};

/// Missing skills the user says they actually have.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedSkillsPayload {
    pub confirmed_missing_skills: Vec<String>,
}

/// Body of `POST /api/analyze/step2/tailor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailorRequest {
    pub master_cv: Value,
    pub job_analysis: JobAnalysis,
    pub company_intel: CompanyIntel,
    pub confirmed_skills: ConfirmedSkillsPayload,
}

/// Response of the tailoring call: the four generated artifacts plus ATS metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailorResponse {
    pub resume_markdown: String,
    pub cover_letter: String,
    pub cold_email: String,
    pub company_summary: String,
    #[serde(default)]
    pub keywords_used: Vec<String>,
    #[serde(default)]
    pub matched_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredResume {
    pub resume_markdown: String,
    pub matched_skills: Vec<String>,
    pub keywords_used: Vec<String>,
    pub relevance_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrittenPiece {
    pub content: String,
    pub word_count: usize,
}

impl WrittenPiece {
    pub fn new(content: String) -> Self {
        let word_count = content.split_whitespace().count();
        Self {
            content,
            word_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Writing {
    pub cover_letter: WrittenPiece,
    pub cold_email: WrittenPiece,
    pub company_summary: WrittenPiece,
}

/// Everything the results page renders. Only built from a completed tailoring step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub master_cv: Value,
    pub job_analysis: JobAnalysis,
    pub company_intel: CompanyIntel,
    pub tailored_resume: TailoredResume,
    pub writing: Writing,
    pub warnings: Vec<String>,
}

impl ProcessResponse {
    /// Combines the step 1 analysis with the step 2 artifacts.
    pub fn merge(analysis: AnalysisResponse, tailored: TailorResponse) -> Self {
        Self {
            master_cv: analysis.master_cv,
            job_analysis: analysis.job_analysis,
            company_intel: analysis.company_intel,
            tailored_resume: TailoredResume {
                resume_markdown: tailored.resume_markdown,
                matched_skills: tailored.matched_skills,
                keywords_used: tailored.keywords_used,
                relevance_summary: String::new(),
            },
            writing: Writing {
                cover_letter: WrittenPiece::new(tailored.cover_letter),
                cold_email: WrittenPiece::new(tailored.cold_email),
                company_summary: WrittenPiece::new(tailored.company_summary),
            },
            warnings: analysis.cv_warnings,
        }
    }
}
