//! Polling transport against the JSON status endpoint.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::source::{StatusEvents, StatusSource};
use crate::endpoints::Endpoints;
use crate::error::StreamError;
use crate::types::JobId;

/// Status transport that GETs the job's JSON status at a fixed interval
///
/// Every successful response body is delivered as one message. The stream
/// never ends on its own while the backend answers; the status driver drops it
/// once a terminal status is applied.
#[derive(Clone, Debug)]
pub struct PollingSource {
    http: reqwest::Client,
    endpoints: Endpoints,
    interval: Duration,
    request_timeout: Duration,
}

impl PollingSource {
    /// Create a polling transport sharing an existing HTTP client
    pub fn new(
        http: reqwest::Client,
        endpoints: Endpoints,
        interval: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoints,
            interval,
            request_timeout,
        }
    }
}

struct PollState {
    http: reqwest::Client,
    url: String,
    interval: Duration,
    request_timeout: Duration,
    first: bool,
    done: bool,
}

impl PollState {
    async fn poll_once(&self) -> Result<String, StreamError> {
        let response = self
            .http
            .get(&self.url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(StreamError::Transport)?;

        if !response.status().is_success() {
            return Err(StreamError::from_status(response.status()));
        }

        response.text().await.map_err(StreamError::Transport)
    }
}

#[async_trait]
impl StatusSource for PollingSource {
    async fn subscribe(&self, job_id: &JobId) -> Result<StatusEvents, StreamError> {
        let url = self.endpoints.json_status_url(job_id);
        tracing::debug!(job_id = %job_id, url = %url, interval_ms = self.interval.as_millis() as u64, "polling job status");

        let state = PollState {
            http: self.http.clone(),
            url,
            interval: self.interval,
            request_timeout: self.request_timeout,
            first: true,
            done: false,
        };

        let stream = futures::stream::unfold(state, |mut st| async move {
            if st.done {
                return None;
            }
            if st.first {
                st.first = false;
            } else {
                tokio::time::sleep(st.interval).await;
            }
            let item = st.poll_once().await;
            if item.is_err() {
                st.done = true;
            }
            Some((item, st))
        });

        Ok(stream.boxed())
    }

    fn name(&self) -> &'static str {
        "polling"
    }
}
