//! API Gateway Client — the single point of entry for all backend calls.
//!
//! ARCHITECTURAL RULE: no other module may talk to the resume backend
//! directly. All four endpoints (validate-url, upload-resume,
//! preview-optimization, generate-resume) MUST go through this module, which
//! owns the canonical response schemas and fails loudly on any shape drift.
//!
//! Error policy mirrors how each failure is experienced by the user:
//! a bad job URL is expected input, so `validate_url` never errors and folds
//! transport failures into a negative result; upload/preview/generate
//! failures are exceptional and propagate as `ApiError` so the workflow
//! controller can pick the step-appropriate recovery state.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::plan::OptimizationPlan;
use crate::models::session::{JobId, ResumeId};

/// Message shown when the backend cannot be reached at all. Kept identical
/// for every transport-level validate failure so the UI stays predictable.
pub const CONNECT_ERROR_MESSAGE: &str = "Error connecting to server";

/// Client-side upload filter. The backend accepts anything; this only stops
/// obvious mistakes before the bytes leave the machine.
pub const ALLOWED_RESUME_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("unsupported file type '{0}' (expected one of: pdf, docx, txt)")]
    UnsupportedFile(String),

    #[error("failed to read '{path}': {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to start resume generation (status {0})")]
    GenerationRejected(u16),
}

// ────────────────────────────────────────────────────────────────────────────
// Canonical request / response schemas
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    valid: bool,
    #[serde(default)]
    message: String,
    data: Option<ValidateData>,
}

#[derive(Debug, Deserialize)]
struct ValidateData {
    job_id: JobId,
    #[serde(default)]
    description_preview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    message: String,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    resume_id: Option<ResumeId>,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Debug, Serialize)]
struct OptimizationRequest<'a> {
    resume_id: &'a ResumeId,
    job_id: &'a JobId,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    approved_plan: Option<&'a OptimizationPlan>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    message: String,
    download_url: Option<String>,
}

/// Error payload shapes the backend emits. FastAPI puts free text under
/// `detail`; older variants used `message`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

/// Outcome of `validate_url`. Never an error: a rejected URL is a normal
/// result the user corrects and retries.
#[derive(Debug, Clone)]
pub struct UrlValidation {
    pub valid: bool,
    pub message: String,
    pub job_id: Option<JobId>,
    /// First ~100 chars of the scraped job description, when available.
    pub description_preview: Option<String>,
}

impl UrlValidation {
    fn rejected(message: impl Into<String>) -> Self {
        UrlValidation {
            valid: false,
            message: message.into(),
            job_id: None,
            description_preview: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub resume_id: ResumeId,
    pub filename: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct GenerationReceipt {
    pub message: String,
    /// Possibly relative; resolve with `resolve_download_url`.
    pub download_url: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Gateway trait
// ────────────────────────────────────────────────────────────────────────────

/// The backend gateway as seen by the workflow controller. Carried as
/// `Arc<dyn ResumeGateway>` so controller tests can substitute a stub
/// without a live server.
#[async_trait]
pub trait ResumeGateway: Send + Sync {
    async fn validate_url(&self, url: &str) -> UrlValidation;

    async fn upload_resume(&self, path: &Path) -> Result<UploadReceipt, ApiError>;

    async fn preview_optimization(
        &self,
        resume_id: &ResumeId,
        job_id: &JobId,
        api_key: Option<&str>,
    ) -> Result<OptimizationPlan, ApiError>;

    async fn generate_resume(
        &self,
        resume_id: &ResumeId,
        job_id: &JobId,
        api_key: Option<&str>,
        approved_plan: Option<&OptimizationPlan>,
    ) -> Result<GenerationReceipt, ApiError>;

    /// Absolute (scheme-prefixed) paths pass through unchanged; relative
    /// paths are joined with the configured API base.
    fn resolve_download_url(&self, path: &str) -> String;
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(ApiClient {
            http,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Reads an error response body and unwraps the backend's `detail`/`message`
/// fields when present, falling back to the raw body text.
async fn server_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|e| e.detail.or(e.message))
        .unwrap_or(body);
    ApiError::Server { status, message }
}

#[async_trait]
impl ResumeGateway for ApiClient {
    async fn validate_url(&self, url: &str) -> UrlValidation {
        let response = self
            .http
            .post(self.endpoint("/validate-url"))
            .json(&ValidateRequest { url })
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("validate-url transport failure: {e}");
                return UrlValidation::rejected(CONNECT_ERROR_MESSAGE);
            }
        };

        if !response.status().is_success() {
            warn!("validate-url returned {}", response.status());
            return UrlValidation::rejected(CONNECT_ERROR_MESSAGE);
        }

        let parsed: ValidateResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!("validate-url body did not parse: {e}");
                return UrlValidation::rejected(CONNECT_ERROR_MESSAGE);
            }
        };

        if !parsed.valid {
            return UrlValidation::rejected(parsed.message);
        }

        match parsed.data {
            Some(data) => {
                debug!("url accepted, job_id={}", data.job_id);
                UrlValidation {
                    valid: true,
                    message: parsed.message,
                    job_id: Some(data.job_id),
                    description_preview: data.description_preview,
                }
            }
            // `valid` without a job id is a contract violation; treat it as
            // a rejection instead of guessing.
            None => UrlValidation::rejected("unexpected response shape: missing data.job_id"),
        }
    }

    async fn upload_resume(&self, path: &Path) -> Result<UploadReceipt, ApiError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_RESUME_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::UnsupportedFile(extension));
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume")
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::File {
            path: path.display().to_string(),
            source,
        })?;

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(filename),
        );

        let response = self
            .http
            .post(self.endpoint("/upload-resume"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let parsed: UploadResponse = response.json().await?;
        let data = parsed
            .data
            .ok_or_else(|| ApiError::UnexpectedShape("upload response missing data".into()))?;
        let resume_id = data.resume_id.ok_or_else(|| {
            ApiError::UnexpectedShape("upload response missing data.resume_id".into())
        })?;

        debug!("resume uploaded, resume_id={resume_id}");
        Ok(UploadReceipt {
            resume_id,
            filename: data.filename,
            message: parsed.message,
        })
    }

    async fn preview_optimization(
        &self,
        resume_id: &ResumeId,
        job_id: &JobId,
        api_key: Option<&str>,
    ) -> Result<OptimizationPlan, ApiError> {
        let response = self
            .http
            .post(self.endpoint("/preview-optimization"))
            .json(&OptimizationRequest {
                resume_id,
                job_id,
                api_key,
                approved_plan: None,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let plan: OptimizationPlan = response.json().await?;
        debug!(
            "optimization plan received: {} experience entries",
            plan.experience_entries.len()
        );
        Ok(plan)
    }

    async fn generate_resume(
        &self,
        resume_id: &ResumeId,
        job_id: &JobId,
        api_key: Option<&str>,
        approved_plan: Option<&OptimizationPlan>,
    ) -> Result<GenerationReceipt, ApiError> {
        let response = self
            .http
            .post(self.endpoint("/generate-resume"))
            .json(&OptimizationRequest {
                resume_id,
                job_id,
                api_key,
                approved_plan,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("generate-resume returned {status}");
            return Err(ApiError::GenerationRejected(status.as_u16()));
        }

        let parsed: GenerateResponse = response.json().await?;
        let download_url = parsed.download_url.ok_or_else(|| {
            ApiError::UnexpectedShape("generate response missing download_url".into())
        })?;

        Ok(GenerationReceipt {
            message: parsed.message,
            download_url,
        })
    }

    fn resolve_download_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job_id(v: serde_json::Value) -> JobId {
        JobId(v)
    }

    fn resume_id(v: serde_json::Value) -> ResumeId {
        ResumeId(v)
    }

    #[tokio::test]
    async fn test_validate_url_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate-url"))
            .and(body_json(json!({"url": "https://linkedin.com/jobs/123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "valid": true,
                "message": "Valid URL, analyzing the Job Post",
                "data": {"job_id": 7, "description_preview": "Senior Rust..."}
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let outcome = client.validate_url("https://linkedin.com/jobs/123").await;
        assert!(outcome.valid);
        assert_eq!(outcome.job_id, Some(job_id(json!(7))));
        assert_eq!(outcome.description_preview.as_deref(), Some("Senior Rust..."));
    }

    #[tokio::test]
    async fn test_validate_url_rejection_is_a_result_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "valid": false,
                "message": "Please enter valid URL"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let outcome = client.validate_url("ftp://nope").await;
        assert!(!outcome.valid);
        assert_eq!(outcome.message, "Please enter valid URL");
        assert!(outcome.job_id.is_none());
    }

    #[tokio::test]
    async fn test_validate_url_transport_failure_normalizes() {
        // Nothing listens on port 1.
        let client = ApiClient::new("http://127.0.0.1:1").unwrap();
        let outcome = client.validate_url("https://linkedin.com/jobs/1").await;
        assert!(!outcome.valid);
        assert_eq!(outcome.message, CONNECT_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_validate_url_valid_without_job_id_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate-url"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"valid": true, "message": "ok"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let outcome = client.validate_url("https://monster.com/jobs/9").await;
        assert!(!outcome.valid);
        assert!(outcome.message.contains("missing data.job_id"));
    }

    #[tokio::test]
    async fn test_upload_resume_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload-resume"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "It is uploaded successfully",
                "data": {"resume_id": "r1", "filename": "resume.pdf"}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("resume.pdf");
        std::fs::write(&file, b"%PDF-1.4 fake").unwrap();

        let client = ApiClient::new(server.uri()).unwrap();
        let receipt = client.upload_resume(&file).await.unwrap();
        assert_eq!(receipt.resume_id, resume_id(json!("r1")));
        assert_eq!(receipt.filename.as_deref(), Some("resume.pdf"));
        assert_eq!(receipt.message, "It is uploaded successfully");
    }

    #[tokio::test]
    async fn test_upload_resume_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("resume.exe");
        std::fs::write(&file, b"MZ").unwrap();

        let client = ApiClient::new("http://127.0.0.1:1").unwrap();
        let err = client.upload_resume(&file).await.unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedFile(ext) if ext == "exe"));
    }

    #[tokio::test]
    async fn test_upload_resume_missing_id_fails_loudly() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload-resume"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "ok",
                "data": {"filename": "resume.docx"}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("resume.docx");
        std::fs::write(&file, b"PK").unwrap();

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client.upload_resume(&file).await.unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedShape(_)));
    }

    #[tokio::test]
    async fn test_preview_optimization_unwraps_server_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preview-optimization"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "detail": "Job Post or Resume not found"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client
            .preview_optimization(&resume_id(json!("r1")), &job_id(json!(7)), None)
            .await
            .unwrap_err();
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Job Post or Resume not found");
            }
            other => panic!("expected Server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_preview_optimization_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preview-optimization"))
            .and(body_json(json!({"resume_id": "r1", "job_id": 7})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "company_name": "Acme",
                "summary": {"original": "o", "optimized": "n"},
                "experience_entries": [{"header": "Acme Corp", "bullets": [], "optimized_bullets": ["did x"]}]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let plan = client
            .preview_optimization(&resume_id(json!("r1")), &job_id(json!(7)), None)
            .await
            .unwrap();
        assert_eq!(plan.company_name, "Acme");
        assert_eq!(plan.experience_entries.len(), 1);
    }

    #[tokio::test]
    async fn test_generate_resume_missing_download_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate-resume"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "done"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client
            .generate_resume(&resume_id(json!("r1")), &job_id(json!(7)), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedShape(_)));
    }

    #[tokio::test]
    async fn test_generate_resume_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate-resume"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client
            .generate_resume(&resume_id(json!("r1")), &job_id(json!(7)), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::GenerationRejected(500)));
    }

    #[test]
    fn test_resolve_download_url() {
        let client = ApiClient::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(
            client.resolve_download_url("https://x/y.docx"),
            "https://x/y.docx"
        );
        assert_eq!(
            client.resolve_download_url("/files/a.docx"),
            "http://127.0.0.1:8000/files/a.docx"
        );
    }
}
