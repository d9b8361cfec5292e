//! Backend endpoint addresses
//!
//! All URLs are derived from [`ClientConfig`]; job identifiers are encoded as a
//! single path segment.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::types::JobId;

/// JSON status document polled when no path is configured
const DEFAULT_JSON_STATUS_PATH: &str = "/status";

/// Resolved endpoint URLs for one backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    /// Scheme, host and port, without trailing slash
    origin: String,
    api_prefix: String,
    json_status_path: String,
}

impl Endpoints {
    /// Resolve endpoints from a (validated) configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let origin = config.base_url.trim_end_matches('/').to_string();
        let api_prefix = config.api_prefix.trim_end_matches('/').to_string();
        let json_status_path = match &config.stream.json_status_path {
            Some(path) => path.trim_end_matches('/').to_string(),
            None => DEFAULT_JSON_STATUS_PATH.to_string(),
        };
        Ok(Self {
            origin,
            api_prefix,
            json_status_path,
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}{}", self.origin, self.api_prefix, path)
    }

    /// `POST` target for new jobs
    pub fn submit_url(&self) -> String {
        self.api("/download")
    }

    /// Server-sent events stream for one job
    pub fn status_stream_url(&self, job_id: &JobId) -> String {
        self.api(&format!("/status/{}", encode_segment(job_id)))
    }

    /// JSON status document for one job (polling transport)
    pub fn json_status_url(&self, job_id: &JobId) -> String {
        format!(
            "{}{}/{}",
            self.origin,
            self.json_status_path,
            encode_segment(job_id)
        )
    }

    /// Direct download of a completed job's artifact
    pub fn artifact_url(&self, job_id: &JobId) -> String {
        self.api(&format!("/download_video/{}", encode_segment(job_id)))
    }

    /// Backend version document
    pub fn version_url(&self) -> String {
        self.api("/version")
    }
}

fn encode_segment(job_id: &JobId) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(job_id.as_str())
}
