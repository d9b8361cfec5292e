//! Mock backend fixtures

use std::sync::Mutex;
use std::time::Duration;

use downtube_client::{ClientConfig, DowntubeClient, FormCallbacks, Route};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Render `data:` payloads as an SSE body, one event per payload
pub fn sse_body(payloads: &[&str]) -> String {
    payloads
        .iter()
        .map(|p| format!("data: {p}\n\n"))
        .collect()
}

/// Client pointed at a mock backend
pub fn client_for(server: &MockServer) -> DowntubeClient {
    let mut config = ClientConfig::with_base_url(server.uri());
    config.request_timeout = Duration::from_secs(5);
    DowntubeClient::new(config).expect("client config is valid")
}

/// Mount a submission endpoint answering with `job_id`
pub async fn mount_submit_ok(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "download_id": job_id,
        })))
        .mount(server)
        .await;
}

/// Mount a status stream for `job_id` that sends `payloads` and then ends
pub async fn mount_status_stream(server: &MockServer, job_id: &str, payloads: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/api/status/{job_id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(payloads).into_bytes(), "text/event-stream"),
        )
        .mount(server)
        .await;
}

/// Records every form side effect
#[derive(Default)]
pub struct RecordingCallbacks {
    pub alerts: Mutex<Vec<String>>,
    pub routes: Mutex<Vec<Route>>,
}

impl RecordingCallbacks {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("lock").clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("lock").clone()
    }
}

impl FormCallbacks for RecordingCallbacks {
    fn alert(&self, message: &str) {
        self.alerts.lock().expect("lock").push(message.to_string());
    }

    fn navigate(&self, route: Route) {
        self.routes.lock().expect("lock").push(route);
    }
}
