//! End-to-end job flows against a mock backend.
//!
//! These tests drive the public API only: form submission, navigation to the
//! result view, live status and the retrieval link.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::*;
use futures::StreamExt;
use downtube_client::form::{EMPTY_URL_MESSAGE, SUBMISSION_FAILED_MESSAGE};
use downtube_client::{CloseReason, FormOutcome, JobId, JobStatus, MediaKind, Route};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn audio_job_from_form_to_retrieval_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .and(body_json(serde_json::json!({
            "video_url": "https://youtu.be/abc",
            "download_type": "audio",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"download_id": "job123"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_status_stream(
        &server,
        "job123",
        &[
            r#"{"status":"downloading","download_type":"audio"}"#,
            r#"{"status":"completed","download_type":"audio"}"#,
            r#"{"status":"downloading","download_type":"audio"}"#,
        ],
    )
    .await;

    let client = client_for(&server);
    let callbacks = Arc::new(RecordingCallbacks::default());
    let form = client.submit_form(callbacks.clone());

    let outcome = form.submit("https://youtu.be/abc", MediaKind::Audio).await;
    let job_id = JobId::new("job123").unwrap();
    assert_eq!(outcome, FormOutcome::Submitted(job_id.clone()));
    assert_eq!(callbacks.routes(), vec![Route::Result(job_id.clone())]);
    assert!(callbacks.alerts().is_empty());

    let route = callbacks.routes().remove(0);
    assert_eq!(route.path(), "/result/job123");

    let mut handle = client.enter(&route).expect("result view observes its job");
    let last = handle.wait_closed().await;

    // The event after `completed` never lands
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(last.media_kind, Some(MediaKind::Audio));
    assert_eq!(last.closed_reason, Some(CloseReason::Terminal));

    let view = client.view(&last);
    let link = view.retrieval.expect("completed view has a link");
    assert_eq!(link.url, format!("{}/api/download_video/job123", server.uri()));
    assert_eq!(link.label, "Download Audio");
    assert_eq!(view.recovery, Route::Home);
}

#[tokio::test]
async fn rejected_submission_stays_on_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"detail": "Invalid URL"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let callbacks = Arc::new(RecordingCallbacks::default());
    let form = client.submit_form(callbacks.clone());

    let outcome = form.submit("not a video", MediaKind::Video).await;
    assert_eq!(outcome, FormOutcome::Failed);
    assert!(callbacks.routes().is_empty());
    assert_eq!(callbacks.alerts(), vec![SUBMISSION_FAILED_MESSAGE.to_string()]);
    assert!(!form.is_busy());
}

#[tokio::test]
async fn empty_url_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let callbacks = Arc::new(RecordingCallbacks::default());
    let form = client.submit_form(callbacks.clone());

    assert_eq!(form.submit("   ", MediaKind::Video).await, FormOutcome::Rejected);
    assert_eq!(callbacks.alerts(), vec![EMPTY_URL_MESSAGE.to_string()]);
    assert!(callbacks.routes().is_empty());
}

#[tokio::test]
async fn result_view_starts_loading() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&[r#"{"status":"completed"}"#]).into_bytes(), "text/event-stream")
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handle = client.open_status(JobId::new("slow").unwrap());

    assert_eq!(handle.status(), JobStatus::Loading);
    assert!(!handle.is_closed());
    assert!(client.view(&handle.snapshot()).retrieval.is_none());
    handle.close();
}

#[tokio::test]
async fn reload_resumes_from_path() {
    let server = MockServer::start().await;
    mount_status_stream(&server, "job55", &[r#"{"status":"too-large"}"#]).await;

    let client = client_for(&server);
    let route = Route::parse("/result/job55/").unwrap();
    let mut handle = client.enter(&route).unwrap();

    let last = handle.wait_closed().await;
    assert_eq!(last.status, JobStatus::TooLarge);
    assert_eq!(last.media_kind, None);

    let view = client.view(&last);
    assert_eq!(view.message, "The file is too large to download.");
    assert!(view.retrieval.is_none());
}

#[tokio::test]
async fn missing_job_closes_with_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut handle = client.open_status(JobId::new("gone").unwrap());
    let last = handle.wait_closed().await;

    assert_eq!(last.closed_reason, Some(CloseReason::TransportError));
    // Last known status is kept
    assert_eq!(last.status, JobStatus::Loading);
}

#[tokio::test]
async fn submit_then_fetch_artifact() {
    let server = MockServer::start().await;
    mount_submit_ok(&server, "job8").await;
    mount_status_stream(&server, "job8", &[r#"{"status":"completed"}"#]).await;
    Mock::given(method("GET"))
        .and(path("/api/download_video/job8"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", r#"attachment; filename="clip.mp4""#)
                .set_body_raw(b"mp4-bytes".to_vec(), "video/mp4"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let job_id = client.submit("https://youtu.be/x", MediaKind::Video).await.unwrap();
    let mut handle = client.open_status_with_kind(job_id.clone(), MediaKind::Video);
    assert_eq!(handle.wait_closed().await.status, JobStatus::Completed);

    let dir = tempfile::tempdir().unwrap();
    let saved = client.artifacts().fetch_to(&job_id, dir.path()).await.unwrap();
    assert_eq!(saved.file_name().unwrap(), "clip.mp4");
    assert_eq!(std::fs::read(saved).unwrap(), b"mp4-bytes");
}

#[tokio::test]
async fn every_transition_in_one_chunk_is_observed() {
    let server = MockServer::start().await;
    mount_status_stream(
        &server,
        "burst",
        &[
            r#"{"status":"downloading","download_type":"video"}"#,
            r#"{"status":"completed","download_type":"video"}"#,
        ],
    )
    .await;

    let client = client_for(&server);
    let handle = client.open_status(JobId::new("burst").unwrap());
    let observed: Vec<JobStatus> = handle.updates().map(|snap| snap.status).collect().await;

    assert_eq!(
        observed,
        vec![JobStatus::Loading, JobStatus::Downloading, JobStatus::Completed]
    );
}
