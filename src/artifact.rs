//! Artifact retrieval for completed jobs.

use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::endpoints::Endpoints;
use crate::error::{Error, Result};
use crate::types::{JobId, JobSnapshot, JobStatus};

/// Retrieval URL for a job, available only once it is `completed`
pub fn retrieval_url(snapshot: &JobSnapshot, endpoints: &Endpoints) -> Option<String> {
    (snapshot.status == JobStatus::Completed).then(|| endpoints.artifact_url(&snapshot.job_id))
}

/// Downloads produced artifacts
#[derive(Clone, Debug)]
pub struct ArtifactClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl ArtifactClient {
    /// Create an artifact client sharing an existing HTTP client
    pub fn new(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    /// Download the artifact of `job_id` into `dir`
    ///
    /// The file is named after the server-provided filename, the URL, or the
    /// job id, in that order. The body is written to a `.part` file first and
    /// renamed once complete. The backend deletes the artifact after serving
    /// it, so this succeeds at most once per job.
    ///
    /// # Errors
    ///
    /// - [`Error::NotReady`] if the backend answers 404
    /// - [`Error::Network`] on any other HTTP or transport failure
    /// - [`Error::Io`] if the file cannot be written
    pub async fn fetch_to(&self, job_id: &JobId, dir: &Path) -> Result<PathBuf> {
        let url = self.endpoints.artifact_url(job_id);
        tracing::debug!(job_id = %job_id, url = %url, "fetching artifact");

        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotReady(job_id.clone()));
        }
        let response = response.error_for_status()?;

        let filename = filename_from_response(&response, job_id);
        let dest = dir.join(&filename);
        let partial = dir.join(format!("{filename}.part"));

        tokio::fs::create_dir_all(dir).await?;
        let partial = PartialFile::new(partial);
        let written = write_body(Box::pin(response.bytes_stream()), partial.path()).await?;
        partial.persist(&dest).await?;
        tracing::info!(job_id = %job_id, path = %dest.display(), bytes = written, "artifact saved");
        Ok(dest)
    }
}

/// A download in progress, removed from disk unless persisted
struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Move the finished file to `dest`
    async fn persist(mut self, dest: &Path) -> Result<()> {
        tokio::fs::rename(&self.path, dest).await?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.armed
            && let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove partial artifact");
        }
    }
}

/// Stream `body` into a new file at `path`, returning the byte count
async fn write_body<S, B>(mut body: S, path: &Path) -> Result<u64>
where
    S: Stream<Item = reqwest::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(chunk.as_ref()).await?;
        written += chunk.as_ref().len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Pick a local filename for an artifact response
///
/// Tries `Content-Disposition` (`filename=` then RFC 5987 `filename*=`), then
/// the last URL path segment, then the job id. Only the final path component
/// of any server-provided name is used.
pub(crate) fn filename_from_response(response: &reqwest::Response, job_id: &JobId) -> String {
    if let Some(value) = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        && let Some(name) = filename_from_disposition(value)
    {
        return name;
    }

    if let Some(mut segments) = response.url().path_segments()
        && let Some(last) = segments.next_back()
        && let Ok(decoded) = urlencoding::decode(last)
        && let Some(name) = sanitize(&decoded)
        && name != job_id.as_str()
    {
        return name;
    }

    sanitize(job_id.as_str()).unwrap_or_else(|| "download".to_string())
}

fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for part in value.split(';') {
        let part = part.trim();
        if let Some(encoded) = part.strip_prefix("filename*=") {
            // charset'lang'encoded-filename
            if let Some(idx) = encoded.rfind('\'')
                && let Ok(decoded) = urlencoding::decode(&encoded[idx + 1..])
                && let Some(name) = sanitize(&decoded)
            {
                return Some(name);
            }
        } else if let Some(name) = part.strip_prefix("filename=") {
            plain = sanitize(name.trim_matches('"'));
        }
    }
    plain
}

fn sanitize(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base.to_string())
    }
}
