//! Status transport seam.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::StreamError;
use crate::types::JobId;

/// Message payloads (or a subscription failure) delivered by a transport, in order
pub type StatusEvents = BoxStream<'static, Result<String, StreamError>>;

/// A way of subscribing to one job's status messages
///
/// Implementations only deliver raw payloads; parsing, terminal detection and
/// teardown are handled by the status driver. Dropping the returned stream
/// must release the underlying subscription.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Open a subscription for `job_id`
    async fn subscribe(&self, job_id: &JobId) -> Result<StatusEvents, StreamError>;

    /// Name used in logs
    fn name(&self) -> &'static str;
}
