//! Job submission.
//!
//! One `POST` per user action, no retries. Every failure is reported as a
//! [`SubmissionError`] and left to the caller to surface.

use std::time::Duration;

use crate::endpoints::Endpoints;
use crate::error::SubmissionError;
use crate::types::{JobId, MediaKind, SubmitRequest, SubmitResponse};

/// Creates backend jobs from a video URL and a media kind
#[derive(Clone, Debug)]
pub struct SubmissionClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    timeout: Option<Duration>,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl SubmissionClient {
    /// Create a submission client sharing an existing HTTP client
    pub fn new(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self {
            http,
            endpoints,
            timeout: None,
        }
    }

    /// Bound every submission request by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Submit a job and return its identifier
    ///
    /// A non-blank `video_url` is sent exactly as given.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::EmptyUrl`] if `video_url` is blank (no request is sent)
    /// - [`SubmissionError::Transport`] if the request fails before a response
    /// - [`SubmissionError::Rejected`] on any non-2xx response
    /// - [`SubmissionError::InvalidResponse`] if the body has no usable `download_id`
    pub async fn submit(
        &self,
        video_url: &str,
        media_kind: MediaKind,
    ) -> Result<JobId, SubmissionError> {
        if video_url.trim().is_empty() {
            return Err(SubmissionError::EmptyUrl);
        }

        let url = self.endpoints.submit_url();
        let body = SubmitRequest {
            video_url: video_url.to_string(),
            download_type: media_kind,
        };

        tracing::debug!(url = %url, video_url = %video_url, media_kind = %media_kind, "submitting download job");

        let mut request = self.http.post(&url).json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(SubmissionError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = parse_detail(&text);
            tracing::warn!(status = status.as_u16(), detail = ?detail, "submission rejected");
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = response.bytes().await.map_err(SubmissionError::Transport)?;
        let parsed: SubmitResponse =
            serde_json::from_slice(&bytes).map_err(|e| SubmissionError::InvalidResponse {
                reason: format!("failed to parse response body: {e}"),
            })?;

        let job_id =
            JobId::new(parsed.download_id).map_err(|_| SubmissionError::InvalidResponse {
                reason: "response carried an empty download_id".to_string(),
            })?;

        if let Some(echoed) = parsed.download_type
            && echoed != media_kind
        {
            tracing::warn!(job_id = %job_id, requested = %media_kind, echoed = %echoed, "backend echoed a different media kind");
        }

        tracing::info!(job_id = %job_id, media_kind = %media_kind, "download job submitted");
        Ok(job_id)
    }
}

/// Extract a FastAPI-style `{"detail": ...}` message from an error body
fn parse_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
