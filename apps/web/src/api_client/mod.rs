/// Gateway to the Jobs backend.
///
/// Every backend call made by the frontend goes through [`JobsApi`]. The
/// production implementation is [`ApiClient`]; there is no retry and no
/// timeout, a failed call surfaces once as an [`ApiError`] whose message is
/// shown to the user as-is.
use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::analysis::AnalysisResponse;
use crate::models::credits::CreditsInfo;
use crate::models::tailoring::{TailorRequest, TailorResponse};
use crate::workflow::upload::{AnalyzeRequest, JobSource};

const ANALYZE_PATH: &str = "/api/analyze/step1";
const TAILOR_PATH: &str = "/api/analyze/step2/tailor";
const CREDITS_PATH: &str = "/api/credits";
const USER_AGENT: &str = concat!("jobs-web/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Analyze,
    Tailor,
    Credits,
}

impl Operation {
    fn fallback_message(self) -> &'static str {
        match self {
            Operation::Analyze => "Analysis failed",
            Operation::Tailor => "Tailoring failed",
            Operation::Credits => "Failed to fetch credits",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx answer. `detail` is what the backend said, or the operation's fallback.
    #[error("{detail}")]
    Backend { status: u16, detail: String },

    #[error("Could not reach the Jobs API. Please try again.")]
    Transport(#[source] reqwest::Error),

    #[error("The Jobs API sent a response we could not read.")]
    Decode(#[source] reqwest::Error),
}

impl ApiError {
    /// Coarse category for analytics.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Backend { status, .. } if *status >= 500 => "server",
            ApiError::Backend { .. } => "rejected",
            ApiError::Transport(_) => "network",
            ApiError::Decode(_) => "decode",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Pulls a human-readable message out of a FastAPI-style error body.
///
/// `{"detail": "..."}` is the common case; the credits endpoint nests it as
/// `{"detail": {"message": "..."}}` and request validation failures send a list.
fn detail_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// The backend operations the frontend depends on.
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Step 1: CV extraction, JD analysis, company research and skill gap.
    async fn analyze(
        &self,
        request: &AnalyzeRequest,
        token: Option<&str>,
    ) -> Result<AnalysisResponse, ApiError>;

    /// Step 2: tailoring with the skills the user confirmed.
    async fn tailor(
        &self,
        request: &TailorRequest,
        token: Option<&str>,
    ) -> Result<TailorResponse, ApiError>;

    async fn credits(&self, token: &str) -> Result<CreditsInfo, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let base_url: String = base_url.into();
        Ok(Self {
            client: Client::builder().user_agent(USER_AGENT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: Option<&str>,
        operation: Operation,
    ) -> Result<T, ApiError> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            warn!("{operation:?} request failed: {e}");
            ApiError::Transport(e)
        })?;

        decode(response, operation).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response, operation: Operation) -> Result<T, ApiError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = detail_message(&body)
            .unwrap_or_else(|| operation.fallback_message().to_string());
        warn!("{operation:?} rejected with {status}: {detail}");
        return Err(ApiError::Backend {
            status: status.as_u16(),
            detail,
        });
    }

    let parsed = response.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            ApiError::Decode(e)
        } else {
            ApiError::Transport(e)
        }
    })?;
    debug!("{operation:?} succeeded with {status}");
    Ok(parsed)
}

fn analyze_form(request: &AnalyzeRequest) -> Result<multipart::Form, reqwest::Error> {
    let cv = request.cv();
    let part = multipart::Part::bytes(cv.bytes.to_vec())
        .file_name(cv.file_name.clone())
        .mime_str("application/pdf")?;

    let form = multipart::Form::new().part("cv_pdf", part);
    let form = match request.job() {
        JobSource::Description(text) => form.text("job_description", text.clone()),
        JobSource::Url(url) => form.text("job_url", url.clone()),
    };
    Ok(form.text("company_url", request.company_url().to_string()))
}

#[async_trait]
impl JobsApi for ApiClient {
    async fn analyze(
        &self,
        request: &AnalyzeRequest,
        token: Option<&str>,
    ) -> Result<AnalysisResponse, ApiError> {
        let form = analyze_form(request).map_err(ApiError::Transport)?;
        let builder = self.client.post(self.url(ANALYZE_PATH)).multipart(form);
        self.send(builder, token, Operation::Analyze).await
    }

    async fn tailor(
        &self,
        request: &TailorRequest,
        token: Option<&str>,
    ) -> Result<TailorResponse, ApiError> {
        let builder = self.client.post(self.url(TAILOR_PATH)).json(request);
        self.send(builder, token, Operation::Tailor).await
    }

    async fn credits(&self, token: &str) -> Result<CreditsInfo, ApiError> {
        let builder = self.client.get(self.url(CREDITS_PATH));
        self.send(builder, Some(token), Operation::Credits).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::{CompanyIntel, JobAnalysis};
    use crate::models::credits::Tier;
    use crate::models::tailoring::ConfirmedSkillsPayload;
    use crate::workflow::upload::{pdf_upload, AnalyzeInput};
    use mockito::Matcher;
    use serde_json::json;

    fn analyze_request() -> AnalyzeRequest {
        AnalyzeInput {
            cv: Some(pdf_upload()),
            job_description: "We need a Go engineer".to_string(),
            job_url: String::new(),
            company_url: "stripe.com".to_string(),
        }
        .validate()
        .unwrap()
    }

    fn analysis_body() -> String {
        json!({
            "master_cv": {"name": "Ada"},
            "job_analysis": {"role_title": "Backend Engineer"},
            "company_intel": {"company_name": "Stripe"},
            "skill_gap": {"missing_skills": ["Kubernetes", "GraphQL"]},
            "cv_warnings": []
        })
        .to_string()
    }

    #[test]
    fn test_detail_message_shapes() {
        assert_eq!(
            detail_message(r#"{"detail": "quota exceeded"}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(
            detail_message(r#"{"detail": {"message": "No credits remaining", "tier": "free"}}"#)
                .as_deref(),
            Some("No credits remaining")
        );
        assert_eq!(
            detail_message(r#"{"detail": [{"msg": "field required", "loc": ["body"]}]}"#)
                .as_deref(),
            Some("field required")
        );
        assert_eq!(detail_message(r#"{"error": "nope"}"#), None);
        assert_eq!(detail_message(r#"{"detail": ""}"#), None);
        assert_eq!(detail_message("<html>502 Bad Gateway</html>"), None);
    }

    #[tokio::test]
    async fn test_analyze_sends_multipart_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", ANALYZE_PATH)
            .match_header("authorization", "Bearer tok-123")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="cv_pdf"; filename="resume.pdf""#.to_string()),
                Matcher::Regex(r#"name="company_url""#.to_string()),
                Matcher::Regex("stripe.com".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(analysis_body())
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let analysis = client
            .analyze(&analyze_request(), Some("tok-123"))
            .await
            .unwrap();

        assert_eq!(analysis.skill_gap.missing_skills, vec!["Kubernetes", "GraphQL"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_anonymous_request_omits_authorization() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", ANALYZE_PATH)
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(analysis_body())
            .create_async()
            .await;

        let client = ApiClient::new(format!("{}/", server.url())).unwrap();
        client.analyze(&analyze_request(), None).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_backend_detail_becomes_the_error_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", ANALYZE_PATH)
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "quota exceeded"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let err = client.analyze(&analyze_request(), None).await.unwrap_err();

        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(err.kind(), "rejected");
    }

    #[tokio::test]
    async fn test_unparseable_error_body_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", TAILOR_PATH)
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let request = TailorRequest {
            master_cv: json!({}),
            job_analysis: JobAnalysis::default(),
            company_intel: CompanyIntel::default(),
            confirmed_skills: ConfirmedSkillsPayload::default(),
        };
        let err = client.tailor(&request, None).await.unwrap_err();

        assert_eq!(err.to_string(), "Tailoring failed");
        assert_eq!(err.kind(), "server");
    }

    #[tokio::test]
    async fn test_tailor_posts_confirmed_skills_as_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", TAILOR_PATH)
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "confirmed_skills": {"confirmed_missing_skills": ["Kubernetes"]}
            })))
            .with_status(200)
            .with_body(
                json!({
                    "resume_markdown": "# Ada",
                    "cover_letter": "Dear team",
                    "cold_email": "Hi",
                    "company_summary": "Payments",
                    "keywords_used": ["Go"],
                    "matched_skills": ["Go"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let request = TailorRequest {
            master_cv: json!({"name": "Ada"}),
            job_analysis: JobAnalysis::default(),
            company_intel: CompanyIntel::default(),
            confirmed_skills: ConfirmedSkillsPayload {
                confirmed_missing_skills: vec!["Kubernetes".to_string()],
            },
        };
        let tailored = client.tailor(&request, None).await.unwrap();

        assert_eq!(tailored.resume_markdown, "# Ada");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_credits_requires_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", CREDITS_PATH)
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body(
                r#"{"credits_remaining": 29, "credits_used_this_month": 1, "tier": "pro", "tier_limit": 30}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let credits = client.credits("tok").await.unwrap();

        assert_eq!(credits.tier, Tier::Pro);
        assert_eq!(credits.credits_remaining, 29);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", CREDITS_PATH)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let err = client.credits("tok").await.unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:1").unwrap();
        let err = client.analyze(&analyze_request(), None).await.unwrap_err();
        assert_eq!(err.kind(), "network");
        assert_eq!(
            err.to_string(),
            "Could not reach the Jobs API. Please try again."
        );
    }
}
