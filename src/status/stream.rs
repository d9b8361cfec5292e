//! Status subscription driver and consumer handle.
//!
//! Each opened subscription runs on one tokio task that feeds transport items
//! to a [`StatusTracker`] strictly in delivery order. Every applied change is
//! queued for the consumer, and the latest one is also kept in a `watch`
//! channel for cheap reads. The transport stream is owned by that task and
//! dropped exactly once, whichever comes first of: terminal status, transport
//! failure, end of stream, or consumer close.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::machine::StatusTracker;
use super::source::StatusSource;
use crate::config::StreamErrorPolicy;
use crate::error::StreamError;
use crate::types::{JobId, JobSnapshot, JobStatus, MediaKind};

/// Opens status subscriptions over one transport
#[derive(Clone)]
pub struct StatusStream {
    source: Arc<dyn StatusSource>,
    policy: StreamErrorPolicy,
}

impl std::fmt::Debug for StatusStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusStream")
            .field("source", &self.source.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl StatusStream {
    /// Use `source` with the default error policy
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self {
            source,
            policy: StreamErrorPolicy::default(),
        }
    }

    /// Set what a transport failure does to the observed status
    pub fn with_policy(mut self, policy: StreamErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start observing `job_id`
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(&self, job_id: JobId) -> StatusHandle {
        self.spawn(job_id, None)
    }

    /// Start observing `job_id` whose media kind is already known
    pub fn open_with_kind(&self, job_id: JobId, media_kind: MediaKind) -> StatusHandle {
        self.spawn(job_id, Some(media_kind))
    }

    fn spawn(&self, job_id: JobId, media_kind: Option<MediaKind>) -> StatusHandle {
        let tracker = StatusTracker::new(job_id.clone(), media_kind, self.policy);
        let initial = tracker.snapshot().clone();
        let (latest_tx, latest) = watch::channel(initial.clone());
        let (changes_tx, changes) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tokio::spawn(drive(
            Arc::clone(&self.source),
            tracker,
            Publisher {
                latest: latest_tx,
                changes: changes_tx,
            },
            cancel.clone(),
        ));

        StatusHandle {
            job_id,
            latest,
            changes,
            last_seen: initial,
            _release: cancel.clone().drop_guard(),
            cancel,
        }
    }
}

/// Driver side of a handle's channels
struct Publisher {
    latest: watch::Sender<JobSnapshot>,
    changes: mpsc::UnboundedSender<JobSnapshot>,
}

impl Publisher {
    fn publish(&self, snapshot: &JobSnapshot) {
        self.latest.send_replace(snapshot.clone());
        // The consumer may already be gone
        let _ = self.changes.send(snapshot.clone());
    }
}

async fn drive(
    source: Arc<dyn StatusSource>,
    mut tracker: StatusTracker,
    publisher: Publisher,
    cancel: CancellationToken,
) {
    let job_id = tracker.snapshot().job_id.clone();

    let subscribed = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = source.subscribe(&job_id) => Some(result),
    };

    let mut events = match subscribed {
        None => {
            if tracker.close() {
                publisher.publish(tracker.snapshot());
            }
            return;
        }
        Some(Err(e)) => {
            tracker.on_error(&e);
            publisher.publish(tracker.snapshot());
            return;
        }
        Some(Ok(events)) => events,
    };

    tracing::debug!(job_id = %job_id, source = source.name(), "status subscription open");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                if tracker.close() {
                    publisher.publish(tracker.snapshot());
                }
                break;
            }
            item = events.next() => {
                let transition = match item {
                    Some(Ok(payload)) => tracker.on_message(&payload),
                    Some(Err(e)) => tracker.on_error(&e),
                    None => tracker.on_error(&StreamError::Ended),
                };
                if transition.is_change() {
                    publisher.publish(tracker.snapshot());
                }
                if tracker.is_closed() {
                    break;
                }
            }
        }
    }

    drop(events);
    cancel.cancel();
    tracing::debug!(job_id = %job_id, status = %tracker.status(), "status subscription released");
}

/// Consumer side of one job's status subscription
///
/// Every applied change is delivered through [`changed`](Self::changed) in
/// order, even when several arrive before the consumer looks. Dropping the
/// handle closes the subscription.
#[derive(Debug)]
pub struct StatusHandle {
    job_id: JobId,
    latest: watch::Receiver<JobSnapshot>,
    changes: mpsc::UnboundedReceiver<JobSnapshot>,
    last_seen: JobSnapshot,
    cancel: CancellationToken,
    _release: DropGuard,
}

impl StatusHandle {
    /// The observed job
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Latest published state, including changes not yet taken with `changed`
    pub fn snapshot(&self) -> JobSnapshot {
        self.latest.borrow().clone()
    }

    /// Latest published status
    pub fn status(&self) -> JobStatus {
        self.latest.borrow().status
    }

    /// Latest known media kind
    pub fn media_kind(&self) -> Option<MediaKind> {
        self.latest.borrow().media_kind
    }

    /// Whether the subscription has been closed
    pub fn is_closed(&self) -> bool {
        self.latest.borrow().closed
    }

    /// Wait for the next change, in the order the changes were applied
    ///
    /// Returns `None` once the subscription is closed and every change has
    /// been observed.
    pub async fn changed(&mut self) -> Option<JobSnapshot> {
        let snapshot = self.changes.recv().await?;
        self.last_seen = snapshot.clone();
        Some(snapshot)
    }

    /// Wait until the subscription is closed and return the final state
    pub async fn wait_closed(&mut self) -> JobSnapshot {
        if self.last_seen.closed {
            return self.last_seen.clone();
        }
        while let Some(snapshot) = self.changed().await {
            if snapshot.closed {
                return snapshot;
            }
        }
        self.snapshot()
    }

    /// Every state from the last one observed to the final one, in order
    ///
    /// The first item is the state last returned by `changed` (the initial
    /// `loading` state for a fresh handle). The stream owns the handle, so
    /// dropping it closes the subscription.
    pub fn updates(self) -> BoxStream<'static, JobSnapshot> {
        let Self {
            changes,
            last_seen,
            _release: release,
            ..
        } = self;
        let snapshots = futures::stream::once(async move { last_seen })
            .chain(UnboundedReceiverStream::new(changes))
            .boxed();
        futures::stream::unfold((snapshots, release), |(mut snapshots, release)| async move {
            let snapshot = snapshots.next().await?;
            Some((snapshot, (snapshots, release)))
        })
        .boxed()
    }

    /// Close the subscription
    ///
    /// Idempotent; a no-op if the subscription already closed itself.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}
