//! HTTP clients for the CourseTrack backend services.
//!
//! One [`BackendClient`] talks to every consumed service — per-document
//! extraction, per-course study-plan generation, social match
//! publish/fetch, and calendar serialization — and implements the
//! coordinator's service traits. All wire-format leniency is absorbed
//! here; the core only ever sees normalized domain types.

mod wire;

use std::time::Duration;

use reqwest::{Client, multipart};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use url::Url;

use coursetrack_core::{CalendarService, ExtractionService, MatchService, PlanService};
use coursetrack_shared::{
    BackendConfig, CourseTrackError, DocumentUpload, ExportRequest, ExtractionOutcome, MatchEntry,
    MatchPublish, MatchQuery, PlanRequest, Result, StudyPlan,
};

use crate::wire::RawExtractionResponse;

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("CourseTrack/", env!("CARGO_PKG_VERSION"));

/// Longest error-body excerpt carried into error messages.
const MAX_ERROR_BODY: usize = 200;

// ---------------------------------------------------------------------------
// BackendClient
// ---------------------------------------------------------------------------

/// Client for the CourseTrack backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// Base URL without a trailing slash.
    base: String,
    client: Client,
}

impl BackendClient {
    /// Build a client from the `[backend]` config section.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            CourseTrackError::config(format!(
                "invalid backend base_url '{}': {e}",
                config.base_url
            ))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CourseTrackError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base: base.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// SHA-256 hex digest of a document's bytes — the local fallback for the
/// content fingerprint when the server response omits one.
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Short fingerprint excerpt for log and error context.
fn fingerprint_prefix(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(8)]
}

/// Read a non-success response body into a bounded error message.
async fn status_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", &body[..body.len().min(MAX_ERROR_BODY)])
    }
}

// ---------------------------------------------------------------------------
// Service impls
// ---------------------------------------------------------------------------

impl ExtractionService for BackendClient {
    #[instrument(skip_all, fields(document = %document.name))]
    async fn extract(&self, document: &DocumentUpload) -> Result<ExtractionOutcome> {
        let local_fingerprint = sha256_hex(&document.bytes);

        let part = multipart::Part::bytes(document.bytes.clone()).file_name(document.name.clone());
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("extract_assignments"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| CourseTrackError::extraction(&document.name, e.to_string()))?;

        if !response.status().is_success() {
            return Err(CourseTrackError::extraction(
                &document.name,
                status_error(response).await,
            ));
        }

        let raw: RawExtractionResponse = response.json().await.map_err(|e| {
            CourseTrackError::extraction(&document.name, format!("invalid response body: {e}"))
        })?;

        let outcome = wire::normalize_response(raw, local_fingerprint);
        debug!(
            records = outcome.records.len(),
            fingerprint = outcome.fingerprint.as_deref().map(fingerprint_prefix),
            cached_plans = outcome.cached_plans.len(),
            "extraction response received"
        );

        Ok(outcome)
    }
}

impl PlanService for BackendClient {
    #[instrument(skip_all, fields(course = course_code))]
    async fn generate(&self, course_code: &str, request: &PlanRequest) -> Result<StudyPlan> {
        let response = self
            .client
            .post(self.endpoint("generate_study_plan"))
            .query(&[("course_name", course_code)])
            .json(request)
            .send()
            .await
            .map_err(|e| CourseTrackError::generation(course_code, e.to_string()))?;

        if !response.status().is_success() {
            return Err(CourseTrackError::generation(
                course_code,
                status_error(response).await,
            ));
        }

        response.json::<StudyPlan>().await.map_err(|e| {
            CourseTrackError::generation(course_code, format!("invalid response body: {e}"))
        })
    }
}

/// Wrapper around the `/shared_handles` response body.
#[derive(Debug, serde::Deserialize)]
struct MatchFetchResponse {
    #[serde(default)]
    matches: Vec<MatchEntry>,
}

impl MatchService for BackendClient {
    #[instrument(skip_all, fields(fingerprint = fingerprint_prefix(&request.fingerprint)))]
    async fn publish(&self, request: &MatchPublish) -> Result<()> {
        let context = fingerprint_prefix(&request.fingerprint).to_string();

        let response = self
            .client
            .post(self.endpoint("share_handle"))
            .json(request)
            .send()
            .await
            .map_err(|e| CourseTrackError::match_failure(&context, e.to_string()))?;

        if !response.status().is_success() {
            return Err(CourseTrackError::match_failure(
                &context,
                status_error(response).await,
            ));
        }

        Ok(())
    }

    #[instrument(skip_all, fields(fingerprint = fingerprint_prefix(&request.fingerprint)))]
    async fn fetch(&self, request: &MatchQuery) -> Result<Vec<MatchEntry>> {
        let context = fingerprint_prefix(&request.fingerprint).to_string();

        let response = self
            .client
            .post(self.endpoint("shared_handles"))
            .json(request)
            .send()
            .await
            .map_err(|e| CourseTrackError::match_failure(&context, e.to_string()))?;

        if !response.status().is_success() {
            return Err(CourseTrackError::match_failure(
                &context,
                status_error(response).await,
            ));
        }

        let body: MatchFetchResponse = response.json().await.map_err(|e| {
            CourseTrackError::match_failure(&context, format!("invalid response body: {e}"))
        })?;

        Ok(body.matches)
    }
}

impl CalendarService for BackendClient {
    #[instrument(skip_all, fields(calendar = %request.calendar_name, records = request.records.len()))]
    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.endpoint("export_calendar"))
            .json(request)
            .send()
            .await
            .map_err(|e| CourseTrackError::Export(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CourseTrackError::Export(status_error(response).await));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CourseTrackError::Export(format!("failed to read artifact: {e}")))?;

        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
