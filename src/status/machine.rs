//! Transport-independent status state machine.
//!
//! [`StatusTracker`] owns the observed state of one job. It is fed message
//! payloads and transport errors in delivery order and decides when the
//! subscription must close. It performs no I/O.

use chrono::Utc;

use crate::config::StreamErrorPolicy;
use crate::error::{StatusParseError, StreamError};
use crate::types::{CloseReason, JobId, JobSnapshot, JobStatus, MediaKind, StatusUpdate};

/// Longest payload prefix included in parse-error logs
const LOGGED_PAYLOAD_LIMIT: usize = 200;

/// Effect of one delivered notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// A status update was applied; `closed` is set when it was terminal
    Applied {
        /// The adopted status
        status: JobStatus,
        /// Whether the tracker closed as a result
        closed: bool,
    },
    /// The payload was malformed; nothing changed
    Ignored,
    /// The tracker was already closed; the notification was dropped
    Discarded,
    /// A transport error closed the tracker
    Closed {
        /// Status after the error was handled
        status: JobStatus,
    },
}

impl Transition {
    /// Whether the snapshot changed and observers should be notified
    pub fn is_change(&self) -> bool {
        matches!(self, Transition::Applied { .. } | Transition::Closed { .. })
    }
}

/// Observed state of one job
#[derive(Clone, Debug)]
pub struct StatusTracker {
    snapshot: JobSnapshot,
    policy: StreamErrorPolicy,
}

impl StatusTracker {
    /// Start tracking `job_id` in the `loading` state
    pub fn new(job_id: JobId, media_kind: Option<MediaKind>, policy: StreamErrorPolicy) -> Self {
        Self {
            snapshot: JobSnapshot::new(job_id, media_kind),
            policy,
        }
    }

    /// Current observable state
    pub fn snapshot(&self) -> &JobSnapshot {
        &self.snapshot
    }

    /// Current status
    pub fn status(&self) -> JobStatus {
        self.snapshot.status
    }

    /// Whether no further notifications will be processed
    pub fn is_closed(&self) -> bool {
        self.snapshot.closed
    }

    /// Parse a message payload without touching state
    pub fn parse(payload: &str) -> Result<StatusUpdate, StatusParseError> {
        serde_json::from_str(payload).map_err(|source| StatusParseError {
            source,
            payload: payload.to_string(),
        })
    }

    /// Handle one message payload from the status stream
    pub fn on_message(&mut self, payload: &str) -> Transition {
        if self.is_closed() {
            tracing::trace!(job_id = %self.snapshot.job_id, "message after close discarded");
            return Transition::Discarded;
        }

        match Self::parse(payload) {
            Ok(update) => self.apply(update),
            Err(e) => {
                tracing::warn!(
                    job_id = %self.snapshot.job_id,
                    error = %e.source,
                    payload = %truncate(&e.payload, LOGGED_PAYLOAD_LIMIT),
                    "failed to parse status message"
                );
                Transition::Ignored
            }
        }
    }

    /// Handle an already-parsed status update
    pub fn apply(&mut self, update: StatusUpdate) -> Transition {
        if self.is_closed() {
            return Transition::Discarded;
        }

        let previous = self.snapshot.status;
        self.snapshot.status = update.status;
        if let Some(kind) = update.download_type {
            self.snapshot.media_kind = Some(kind);
        }
        self.snapshot.updated_at = Utc::now();

        tracing::debug!(
            job_id = %self.snapshot.job_id,
            from = %previous,
            to = %update.status,
            "status update applied"
        );

        let closed = update.status.is_terminal();
        if closed {
            tracing::info!(job_id = %self.snapshot.job_id, status = %update.status, "job reached terminal status");
            self.mark_closed(CloseReason::Terminal);
        }

        Transition::Applied {
            status: update.status,
            closed,
        }
    }

    /// Handle a subscription-level failure
    pub fn on_error(&mut self, error: &StreamError) -> Transition {
        if self.is_closed() {
            tracing::trace!(job_id = %self.snapshot.job_id, "stream error after close discarded");
            return Transition::Discarded;
        }

        tracing::warn!(
            job_id = %self.snapshot.job_id,
            error = %error,
            status = %self.snapshot.status,
            "status stream failed, closing subscription"
        );

        if self.policy == StreamErrorPolicy::FailFast && !self.snapshot.status.is_terminal() {
            self.snapshot.status = JobStatus::Error;
        }
        self.mark_closed(CloseReason::TransportError);

        Transition::Closed {
            status: self.snapshot.status,
        }
    }

    /// Close on behalf of the consumer
    ///
    /// Returns `true` only for the call that actually closed the tracker.
    pub fn close(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        tracing::debug!(job_id = %self.snapshot.job_id, status = %self.snapshot.status, "status subscription closed by consumer");
        self.mark_closed(CloseReason::Consumer);
        true
    }

    fn mark_closed(&mut self, reason: CloseReason) {
        self.snapshot.closed = true;
        self.snapshot.closed_reason = Some(reason);
        self.snapshot.updated_at = Utc::now();
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
