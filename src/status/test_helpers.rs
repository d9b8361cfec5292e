//! Shared test helpers for driving status subscriptions by hand.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::source::{StatusEvents, StatusSource};
use crate::error::StreamError;
use crate::types::JobId;

/// Sender half used by tests to push transport items
pub(crate) type ItemSender = mpsc::UnboundedSender<Result<String, StreamError>>;

/// Counts drops of the stream it is moved into
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A status source fed from an in-memory channel
///
/// `drops` counts how many times a subscription stream was released.
pub(crate) struct ChannelSource {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Result<String, StreamError>>>>,
    fail_subscribe: bool,
    pub(crate) drops: Arc<AtomicUsize>,
}

impl ChannelSource {
    /// A source with one pending subscription and the sender that feeds it
    pub(crate) fn new() -> (Arc<Self>, ItemSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Arc::new(Self {
            rx: Mutex::new(Some(rx)),
            fail_subscribe: false,
            drops: Arc::new(AtomicUsize::new(0)),
        });
        (source, tx)
    }

    /// A source whose subscribe call always fails
    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            rx: Mutex::new(None),
            fail_subscribe: true,
            drops: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl StatusSource for ChannelSource {
    async fn subscribe(&self, _job_id: &JobId) -> Result<StatusEvents, StreamError> {
        if self.fail_subscribe {
            return Err(StreamError::Http { status: 503 });
        }
        let rx = self.rx.lock().unwrap().take().ok_or(StreamError::Ended)?;
        let counter = DropCounter(Arc::clone(&self.drops));
        Ok(UnboundedReceiverStream::new(rx)
            .map(move |item| {
                let _ = &counter;
                item
            })
            .boxed())
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
