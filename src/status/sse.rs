//! Server-sent events transport.
//!
//! [`SseDecoder`] turns a `text/event-stream` body into events, independent of
//! how the bytes are chunked. [`SseSource`] opens the job's event stream with
//! reqwest and yields the `data` of every `message` event.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use super::source::{StatusEvents, StatusSource};
use crate::endpoints::Endpoints;
use crate::error::StreamError;
use crate::types::JobId;

/// Event type delivered to status observers
const MESSAGE_EVENT: &str = "message";

/// One dispatched server-sent event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type (`message` unless the server set `event:`)
    pub event: String,
    /// Concatenated `data:` lines, joined with `\n`
    pub data: String,
    /// Last event ID seen on the stream
    pub id: Option<String>,
    /// Reconnection time requested by the server, in milliseconds
    pub retry: Option<u64>,
}

/// Incremental `text/event-stream` parser
///
/// Lines may end in `\n`, `\r\n` or `\r`, and chunk boundaries may fall
/// anywhere, including inside a line ending or a UTF-8 sequence. An event
/// that is not terminated by a blank line before the stream ends is never
/// dispatched.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: String,
    has_data: bool,
    event_type: String,
    last_id: Option<String>,
    retry: Option<u64>,
    pending_cr: bool,
    seen_first_line: bool,
}

impl SseDecoder {
    /// Create a decoder at the start of a stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of the body and return every event it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        for &byte in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\n' => self.end_line(&mut events),
                b'\r' => {
                    self.end_line(&mut events);
                    self.pending_cr = true;
                }
                _ => self.line.push(byte),
            }
        }
        events
    }

    fn end_line(&mut self, events: &mut Vec<SseEvent>) {
        let raw = std::mem::take(&mut self.line);
        let mut line = String::from_utf8_lossy(&raw).into_owned();
        if !self.seen_first_line {
            self.seen_first_line = true;
            if let Some(stripped) = line.strip_prefix('\u{feff}') {
                line = stripped.to_string();
            }
        }

        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                events.push(event);
            }
            return;
        }

        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };

        match field {
            "event" => self.event_type = value.to_string(),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    self.retry = value.parse().ok();
                }
            }
            other => tracing::trace!(field = %other, "ignoring unknown SSE field"),
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = std::mem::take(&mut self.event_type);
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseEvent {
            event: if event_type.is_empty() {
                MESSAGE_EVENT.to_string()
            } else {
                event_type
            },
            data: std::mem::take(&mut self.data),
            id: self.last_id.clone(),
            retry: self.retry,
        })
    }
}

/// Status transport over server-sent events
#[derive(Clone, Debug)]
pub struct SseSource {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl SseSource {
    /// Create an SSE transport sharing an existing HTTP client
    pub fn new(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }
}

#[async_trait]
impl StatusSource for SseSource {
    async fn subscribe(&self, job_id: &JobId) -> Result<StatusEvents, StreamError> {
        let url = self.endpoints.status_stream_url(job_id);
        tracing::debug!(job_id = %job_id, url = %url, "opening status event stream");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(StreamError::Connect)?;

        if !response.status().is_success() {
            return Err(StreamError::from_status(response.status()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("text/event-stream") {
            tracing::warn!(job_id = %job_id, content_type = %content_type, "status endpoint did not announce an event stream");
        }

        Ok(message_stream(Box::pin(response.bytes_stream())).boxed())
    }

    fn name(&self) -> &'static str {
        "sse"
    }
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    ready: VecDeque<String>,
    done: bool,
}

/// Decode a byte stream into `message` event payloads
///
/// A body error is yielded once and ends the stream.
pub(crate) fn message_stream<S, B>(body: S) -> impl Stream<Item = Result<String, StreamError>>
where
    S: Stream<Item = reqwest::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(data) = st.ready.pop_front() {
                return Some((Ok(data), st));
            }
            if st.done {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    for event in st.decoder.feed(chunk.as_ref()) {
                        if event.event == MESSAGE_EVENT {
                            st.ready.push_back(event.data);
                        } else {
                            tracing::debug!(event = %event.event, "skipping non-message SSE event");
                        }
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(StreamError::Transport(e)), st));
                }
                None => st.done = true,
            }
        }
    })
}
