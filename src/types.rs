//! Core types for downtube-client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Opaque job identifier assigned by the backend at submission time
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a new JobId, rejecting empty or whitespace-only identifiers
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidJobId(id));
        }
        Ok(Self(id))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Requested media kind, fixed at submission
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Full video
    #[default]
    Video,
    /// Audio track only
    Audio,
}

impl MediaKind {
    /// Wire representation (`"video"` / `"audio"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// Capitalized name used in user-facing labels
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Video => "Video",
            MediaKind::Audio => "Audio",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job status as observed by the client
///
/// `Loading` is assigned by the client before the first server event and is
/// never sent by the backend. The other variants are backend-asserted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// No server event received yet
    #[default]
    Loading,
    /// The backend is fetching or converting the media
    Downloading,
    /// The artifact is ready for retrieval
    Completed,
    /// The media exceeds the backend's size limit
    TooLarge,
    /// The artifact was retrieved or expired and is gone
    Deleted,
    /// The backend failed to process the job
    Error,
}

impl JobStatus {
    /// Whether no further transitions are accepted after this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::TooLarge | JobStatus::Deleted | JobStatus::Error
        )
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Loading => "loading",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::TooLarge => "too-large",
            JobStatus::Deleted => "deleted",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status message from the backend
///
/// `download_type` is optional on the wire: older backends only send
/// `{status, filename}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// New job status
    pub status: JobStatus,
    /// Media kind of the job, when the backend reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_type: Option<MediaKind>,
}

/// Request body of the submission endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// URL of the video to fetch
    pub video_url: String,
    /// Requested media kind
    pub download_type: MediaKind,
}

/// Response body of the submission endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Identifier of the created job
    pub download_id: String,
    /// Media kind echoed back by the backend
    #[serde(default)]
    pub download_type: Option<MediaKind>,
    /// Initial status reported by the backend (not trusted for display)
    #[serde(default)]
    pub status: Option<String>,
}

/// Why a status subscription was closed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// A terminal status was applied
    Terminal,
    /// The consumer closed the handle or dropped it
    Consumer,
    /// The transport failed or the backend ended the stream
    TransportError,
}

/// Observable state of one job, published on every change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// The observed job
    pub job_id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Media kind, once known
    pub media_kind: Option<MediaKind>,
    /// Whether the subscription has been closed
    pub closed: bool,
    /// Why the subscription was closed, if it was
    pub closed_reason: Option<CloseReason>,
    /// When this snapshot last changed
    pub updated_at: DateTime<Utc>,
}

impl JobSnapshot {
    /// Initial snapshot: `loading`, open
    pub fn new(job_id: JobId, media_kind: Option<MediaKind>) -> Self {
        Self {
            job_id,
            status: JobStatus::Loading,
            media_kind,
            closed: false,
            closed_reason: None,
            updated_at: Utc::now(),
        }
    }

    /// Whether the observed status is terminal
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
