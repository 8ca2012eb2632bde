//! Step 1 payloads: CV + JD analysis, company research and the skill gap.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a required skill was found in the master CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    #[serde(default)]
    pub found_in_cv: bool,
    /// "skills" | "experience" | "certifications"
    #[serde(default)]
    pub source: String,
}

/// Skill gap between the job's requirements and the master CV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGapAnalysis {
    #[serde(default)]
    pub matched_skills: Vec<SkillMatch>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills_matched: Vec<String>,
    #[serde(default)]
    pub preferred_skills_missing: Vec<String>,
    /// Backend's own estimate (0 – 100). The confirmation view recomputes it.
    #[serde(default)]
    pub match_percentage: f64,
}

/// Structured job description. Unknown fields are kept in `extra` so the value
/// goes back to the tailoring call exactly as the backend produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobAnalysis {
    #[serde(default)]
    pub role_title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub seniority_level: String,
    #[serde(default)]
    pub employment_type: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub keywords_for_ats: Vec<String>,
    #[serde(default)]
    pub industry: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntelSource {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fact: Option<String>,
}

/// Company research. Everything beyond the name is best-effort on the backend side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyIntel {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub employee_count_range: String,
    #[serde(default)]
    pub company_stage: String,
    #[serde(default)]
    pub recent_funding_or_news: Vec<String>,
    #[serde(default)]
    pub hiring_contacts: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub culture_highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub red_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<IntelSource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST /api/analyze/step1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Opaque structured CV; only ever passed back to the backend.
    pub master_cv: Value,
    pub job_analysis: JobAnalysis,
    pub company_intel: CompanyIntel,
    pub skill_gap: SkillGapAnalysis,
    #[serde(default)]
    pub cv_warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analysis_response_tolerates_sparse_payload() {
        let body = json!({
            "master_cv": {"name": "Ada"},
            "job_analysis": {"role_title": "Platform Engineer"},
            "company_intel": {"company_name": "Stripe"},
            "skill_gap": {"missing_skills": ["Kubernetes"]}
        });
        let parsed: AnalysisResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.job_analysis.role_title, "Platform Engineer");
        assert_eq!(parsed.skill_gap.missing_skills, vec!["Kubernetes"]);
        assert!(parsed.cv_warnings.is_empty());
        assert!(parsed.skill_gap.matched_skills.is_empty());
    }

    #[test]
    fn test_unknown_job_fields_survive_reserialization() {
        let body = json!({
            "role_title": "SRE",
            "salary_band": "L5",
            "remote_policy": {"type": "hybrid"}
        });
        let parsed: JobAnalysis = serde_json::from_value(body).unwrap();
        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["salary_band"], "L5");
        assert_eq!(back["remote_policy"]["type"], "hybrid");
    }

    #[test]
    fn test_company_intel_omits_absent_optional_sections() {
        let intel = CompanyIntel {
            company_name: "Stripe".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&intel).unwrap();
        assert!(value.get("mission").is_none());
        assert!(value.get("red_flags").is_none());
        assert_eq!(value["recent_funding_or_news"], json!([]));
    }
}
