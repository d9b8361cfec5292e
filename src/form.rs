//! Submission form controller.
//!
//! Wraps [`SubmissionClient`] with the caller-side contract: blank input is
//! rejected before any request, one submission is in flight at a time, and the
//! outcome is reported through [`FormCallbacks`] instead of platform dialogs or
//! global navigation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::routes::Route;
use crate::submission::SubmissionClient;
use crate::types::{JobId, MediaKind};

/// Message shown when the URL field is empty
pub const EMPTY_URL_MESSAGE: &str = "Please enter a video URL!";

/// Message shown when a submission fails for any reason
pub const SUBMISSION_FAILED_MESSAGE: &str = "An error occurred. Please try again.";

/// User-facing side effects of the form
pub trait FormCallbacks: Send + Sync {
    /// Show a blocking message to the user
    fn alert(&self, message: &str);

    /// Move to another view
    fn navigate(&self, route: Route);
}

/// Result of one submit action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormOutcome {
    /// The job was created and the result view was requested
    Submitted(JobId),
    /// Input was rejected locally; nothing was sent
    Rejected,
    /// Another submission from this form is still in flight
    Busy,
    /// The backend call failed; the form can be used again
    Failed,
}

/// Submission form bound to one set of callbacks
pub struct SubmitForm<C> {
    client: SubmissionClient,
    callbacks: Arc<C>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<C: FormCallbacks> SubmitForm<C> {
    /// Create a form
    pub fn new(client: SubmissionClient, callbacks: Arc<C>) -> Self {
        Self {
            client,
            callbacks,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Handle a click on one of the download buttons
    pub async fn submit(&self, video_url: &str, media_kind: MediaKind) -> FormOutcome {
        if video_url.trim().is_empty() {
            self.callbacks.alert(EMPTY_URL_MESSAGE);
            return FormOutcome::Rejected;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("submission already in flight, ignoring click");
            return FormOutcome::Busy;
        }
        let _guard = InFlightGuard(&self.in_flight);

        match self.client.submit(video_url, media_kind).await {
            Ok(job_id) => {
                self.callbacks.navigate(Route::Result(job_id.clone()));
                FormOutcome::Submitted(job_id)
            }
            Err(e) => {
                tracing::error!(error = %e, "error submitting download request");
                self.callbacks.alert(SUBMISSION_FAILED_MESSAGE);
                FormOutcome::Failed
            }
        }
    }
}
