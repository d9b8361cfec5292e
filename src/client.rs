//! Client facade wiring configuration, HTTP client and components together.

use std::sync::Arc;

use serde::Deserialize;

use crate::artifact::ArtifactClient;
use crate::config::{ClientConfig, StreamTransport};
use crate::endpoints::Endpoints;
use crate::error::Result;
use crate::form::{FormCallbacks, SubmitForm};
use crate::routes::Route;
use crate::status::{PollingSource, SseSource, StatusHandle, StatusSource, StatusStream};
use crate::submission::SubmissionClient;
use crate::types::{JobId, JobSnapshot, MediaKind};
use crate::view::ResultView;

#[derive(Deserialize)]
struct VersionInfo {
    version: String,
}

/// Entry point of the library
///
/// Owns one `reqwest::Client` shared by every component. The shared client
/// has a connect timeout but no overall request timeout, so long-lived status
/// streams are not cut off; bounded requests set their own timeout.
#[derive(Clone, Debug)]
pub struct DowntubeClient {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
    endpoints: Endpoints,
    submission: SubmissionClient,
    status: StatusStream,
    artifacts: ArtifactClient,
}

impl DowntubeClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for invalid settings and
    /// [`Error::Network`](crate::Error::Network) if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoints = Endpoints::from_config(&config)?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let source: Arc<dyn StatusSource> = match config.stream.transport {
            StreamTransport::Sse => Arc::new(SseSource::new(http.clone(), endpoints.clone())),
            StreamTransport::Polling => Arc::new(PollingSource::new(
                http.clone(),
                endpoints.clone(),
                config.stream.poll_interval,
                config.request_timeout,
            )),
        };

        let submission = SubmissionClient::new(http.clone(), endpoints.clone())
            .with_timeout(config.request_timeout);
        let status = StatusStream::new(source).with_policy(config.stream.on_error);
        let artifacts = ArtifactClient::new(http.clone(), endpoints.clone());

        tracing::debug!(
            base_url = %config.base_url,
            transport = ?config.stream.transport,
            "downtube client ready"
        );

        Ok(Self {
            config: Arc::new(config),
            http,
            endpoints,
            submission,
            status,
            artifacts,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolved endpoint URLs
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Submission component
    pub fn submission(&self) -> &SubmissionClient {
        &self.submission
    }

    /// Status component, for opening subscriptions with custom options
    pub fn status_stream(&self) -> &StatusStream {
        &self.status
    }

    /// Artifact component
    pub fn artifacts(&self) -> &ArtifactClient {
        &self.artifacts
    }

    /// Submit a job and return its identifier
    pub async fn submit(&self, video_url: &str, media_kind: MediaKind) -> Result<JobId> {
        Ok(self.submission.submit(video_url, media_kind).await?)
    }

    /// Start observing a job
    ///
    /// Must be called from within a tokio runtime.
    pub fn open_status(&self, job_id: JobId) -> StatusHandle {
        self.status.open(job_id)
    }

    /// Start observing a job whose media kind is known
    pub fn open_status_with_kind(&self, job_id: JobId, media_kind: MediaKind) -> StatusHandle {
        self.status.open_with_kind(job_id, media_kind)
    }

    /// Enter a view: result views start observing their job, the form needs nothing
    pub fn enter(&self, route: &Route) -> Option<StatusHandle> {
        route.job_id().map(|id| self.open_status(id.clone()))
    }

    /// A submission form reporting through `callbacks`
    pub fn submit_form<C: FormCallbacks>(&self, callbacks: Arc<C>) -> SubmitForm<C> {
        SubmitForm::new(self.submission.clone(), callbacks)
    }

    /// Retrieval URL of a job's artifact
    pub fn artifact_url(&self, job_id: &JobId) -> String {
        self.endpoints.artifact_url(job_id)
    }

    /// Result view for a snapshot
    pub fn view(&self, snapshot: &JobSnapshot) -> ResultView {
        ResultView::from_snapshot(snapshot, &self.endpoints)
    }

    /// Version reported by the backend
    pub async fn backend_version(&self) -> Result<String> {
        let info: VersionInfo = self
            .http
            .get(self.endpoints.version_url())
            .timeout(self.config.request_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(info.version)
    }
}
