//! Configuration types for downtube-client

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How status updates are delivered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamTransport {
    /// Server-sent events on the status endpoint (default)
    #[default]
    Sse,
    /// Periodic GET of the JSON status endpoint
    Polling,
}

/// What a subscription-level failure does to the observed status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamErrorPolicy {
    /// Close the subscription and leave the status at its last known value (default)
    ///
    /// Only backend-asserted terminal states are shown to the user; a consumer
    /// may keep showing "checking status" if the stream dies early.
    #[default]
    KeepLastKnown,
    /// Close the subscription and force a non-terminal status to `error`
    FailFast,
}

/// Status stream configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Transport used to follow a job (default: sse)
    #[serde(default)]
    pub transport: StreamTransport,

    /// Interval between polls when `transport` is `polling` (default: 1000 ms)
    ///
    /// Matches the rate at which the backend emits server-sent events.
    #[serde(default = "default_poll_interval", with = "millis_serde")]
    pub poll_interval: Duration,

    /// Path of the JSON status endpoint used for polling, relative to the base URL
    ///
    /// Defaults to `/status`, the backend's JSON status document. The
    /// `{api_prefix}/status` route is the event stream and cannot be polled.
    #[serde(default)]
    pub json_status_path: Option<String>,

    /// Behaviour on a transport error before a terminal status (default: keep_last_known)
    #[serde(default)]
    pub on_error: StreamErrorPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            transport: StreamTransport::default(),
            poll_interval: default_poll_interval(),
            json_status_path: None,
            on_error: StreamErrorPolicy::default(),
        }
    }
}

/// Main configuration for DowntubeClient
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend (default: "http://localhost:8000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix of every API route (default: "/api")
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Timeout for submission, version and polling requests (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Timeout for establishing a connection (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Status stream settings
    #[serde(default)]
    pub stream: StreamConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
            stream: StreamConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with all other settings defaulted
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.base_url)
            .map_err(|e| Error::config("base_url", format!("invalid base URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::config("base_url", "base URL cannot carry paths"));
        }

        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(Error::config(
                "api_prefix",
                format!("API prefix must start with '/': {:?}", self.api_prefix),
            ));
        }

        if let Some(path) = &self.stream.json_status_path
            && !path.starts_with('/')
        {
            return Err(Error::config(
                "stream.json_status_path",
                format!("status path must start with '/': {path:?}"),
            ));
        }

        if self.stream.poll_interval.is_zero() {
            return Err(Error::config(
                "stream.poll_interval",
                "poll interval must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_user_agent() -> String {
    format!("downtube-client/{}", env!("CARGO_PKG_VERSION"))
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
