//! Result view model.
//!
//! Maps a [`JobSnapshot`] to what the result view shows: a message, the
//! retrieval link once the job is completed, and the way back to the form.

use crate::artifact::retrieval_url;
use crate::endpoints::Endpoints;
use crate::routes::Route;
use crate::types::{JobSnapshot, JobStatus, MediaKind};

/// Label of the recovery action shown on every result view
pub const DOWNLOAD_ANOTHER_LABEL: &str = "Download Another";

/// Link to a completed job's artifact
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalLink {
    /// File-retrieval endpoint for the job
    pub url: String,
    /// Button label, e.g. "Download Audio"
    pub label: String,
}

/// Everything the result view renders for one snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultView {
    /// Status the view was built from
    pub status: JobStatus,
    /// User-facing message
    pub message: &'static str,
    /// Present only when the job is completed
    pub retrieval: Option<RetrievalLink>,
    /// Where the recovery action leads
    pub recovery: Route,
}

impl ResultView {
    /// Build the view for `snapshot`
    pub fn from_snapshot(snapshot: &JobSnapshot, endpoints: &Endpoints) -> Self {
        let retrieval = retrieval_url(snapshot, endpoints).map(|url| {
            let kind = snapshot.media_kind.unwrap_or(MediaKind::Video);
            RetrievalLink {
                url,
                label: format!("Download {}", kind.label()),
            }
        });

        Self {
            status: snapshot.status,
            message: status_message(snapshot.status),
            retrieval,
            recovery: Route::Home,
        }
    }
}

/// User-facing message for a status
pub fn status_message(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Loading => "Checking download status...",
        JobStatus::Downloading => "Your file is being processed. Please wait...",
        JobStatus::Completed => "Your file is ready for download.",
        JobStatus::TooLarge => "The file is too large to download.",
        JobStatus::Deleted => "This download has expired.",
        JobStatus::Error => "An error occurred while processing the download.",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::types::JobId;

    fn snapshot(status: JobStatus, kind: Option<MediaKind>) -> JobSnapshot {
        let mut snap = JobSnapshot::new(JobId::new("job123").unwrap(), kind);
        snap.status = status;
        snap
    }

    fn endpoints() -> Endpoints {
        Endpoints::from_config(&ClientConfig::default()).unwrap()
    }

    #[test]
    fn completed_audio_has_link() {
        let view = ResultView::from_snapshot(
            &snapshot(JobStatus::Completed, Some(MediaKind::Audio)),
            &endpoints(),
        );
        assert_eq!(view.message, "Your file is ready for download.");
        assert_eq!(
            view.retrieval,
            Some(RetrievalLink {
                url: "http://localhost:8000/api/download_video/job123".to_string(),
                label: "Download Audio".to_string(),
            })
        );
        assert_eq!(view.recovery, Route::Home);
    }

    #[test]
    fn unknown_kind_labels_as_video() {
        let view = ResultView::from_snapshot(&snapshot(JobStatus::Completed, None), &endpoints());
        assert_eq!(view.retrieval.unwrap().label, "Download Video");
    }

    #[test]
    fn non_completed_views_have_no_link() {
        for status in [
            JobStatus::Loading,
            JobStatus::Downloading,
            JobStatus::TooLarge,
            JobStatus::Deleted,
            JobStatus::Error,
        ] {
            let view = ResultView::from_snapshot(&snapshot(status, Some(MediaKind::Video)), &endpoints());
            assert!(view.retrieval.is_none(), "{status}");
            assert_eq!(view.message, status_message(status));
            assert_eq!(view.recovery, Route::Home);
        }
    }
}
