//! Error types for downtube-client
//!
//! This module provides the error taxonomy of the client:
//! - [`SubmissionError`] - a job could not be created (transport, rejection, bad body)
//! - [`StatusParseError`] - a single status message could not be decoded
//! - [`StreamError`] - the status subscription itself failed
//! - [`Error`] - the crate-level error that wraps all of the above
//!
//! A backend-asserted `error` status is *not* represented here; it is a
//! legitimate terminal [`JobStatus`](crate::types::JobStatus).

use crate::types::JobId;
use thiserror::Error;

/// Result type alias for downtube-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for downtube-client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Job submission failed
    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    /// Status subscription failed
    #[error("status stream error: {0}")]
    Stream(#[from] StreamError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The artifact for this job is not available (yet, or anymore)
    #[error("content not ready for job {0}")]
    NotReady(JobId),

    /// A path did not match any client view
    #[error("unknown route: {0}")]
    UnknownRoute(String),

    /// A job identifier was empty or otherwise unusable
    #[error("invalid job id: {0:?}")]
    InvalidJobId(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Job submission errors
///
/// Every variant is a `SubmissionFailed` condition: the caller alerts the user
/// and lets them submit again. Nothing is retried.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The video URL was empty; no request was issued
    #[error("video URL is empty")]
    EmptyUrl,

    /// The request never produced a response (connect failure, timeout, ...)
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("backend rejected submission with status {status}{}", detail_suffix(.detail))]
    Rejected {
        /// HTTP status code returned by the backend
        status: u16,
        /// The `detail` message from the backend's error body, if any
        detail: Option<String>,
    },

    /// The response body could not be parsed or carried no job identifier
    #[error("invalid submission response: {reason}")]
    InvalidResponse {
        /// What was wrong with the body
        reason: String,
    },
}

/// A status message whose payload is not a well-formed status update
///
/// Logged and ignored by the status tracker; never closes the subscription.
#[derive(Debug, Error)]
#[error("malformed status message: {source}")]
pub struct StatusParseError {
    /// The underlying JSON error
    #[source]
    pub source: serde_json::Error,
    /// The raw message payload
    pub payload: String,
}

/// Subscription-level failures of a status stream
///
/// Logged by the status tracker, which then closes the subscription.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The subscription could not be established
    #[error("failed to connect to status stream: {0}")]
    Connect(#[source] reqwest::Error),

    /// The status endpoint answered with a non-success status
    #[error("status endpoint returned HTTP {status}")]
    Http {
        /// HTTP status code returned by the backend
        status: u16,
    },

    /// The backend does not know this job
    #[error("job not found")]
    NotFound,

    /// The connection broke while reading the stream
    #[error("status stream transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend closed the stream
    #[error("status stream ended")]
    Ended,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl StreamError {
    /// Build a stream error from a non-success HTTP status code
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::NOT_FOUND {
            StreamError::NotFound
        } else {
            StreamError::Http {
                status: status.as_u16(),
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display_includes_detail_when_present() {
        let err = SubmissionError::Rejected {
            status: 400,
            detail: Some("Invalid YouTube URL".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "backend rejected submission with status 400: Invalid YouTube URL"
        );

        let err = SubmissionError::Rejected {
            status: 502,
            detail: None,
        };
        assert_eq!(
            err.to_string(),
            "backend rejected submission with status 502"
        );
    }

    #[test]
    fn submission_error_converts_into_crate_error() {
        let err: Error = SubmissionError::EmptyUrl.into();
        assert!(matches!(err, Error::Submission(SubmissionError::EmptyUrl)));
        assert_eq!(err.to_string(), "submission failed: video URL is empty");
    }

    #[test]
    fn stream_error_from_status_maps_404_to_not_found() {
        assert!(matches!(
            StreamError::from_status(reqwest::StatusCode::NOT_FOUND),
            StreamError::NotFound
        ));
        assert!(matches!(
            StreamError::from_status(reqwest::StatusCode::BAD_GATEWAY),
            StreamError::Http { status: 502 }
        ));
    }

    #[test]
    fn config_helper_records_key() {
        match Error::config("base_url", "not a URL") {
            Error::Config { message, key } => {
                assert_eq!(message, "not a URL");
                assert_eq!(key.as_deref(), Some("base_url"));
            }
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
