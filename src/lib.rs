//! # downtube-client
//!
//! Client library for the Downtube video download service.
//!
//! ## Design Philosophy
//!
//! downtube-client is designed to be:
//! - **Library-first** - No UI, purely a Rust crate for embedding in a front-end
//! - **Event-driven** - Consumers observe a job's status as the backend pushes it
//! - **Transport-agnostic** - Status arrives over server-sent events or polling
//!   behind one state machine
//! - **Leak-free** - Every status subscription is released exactly once
//!
//! ## Quick Start
//!
//! ```no_run
//! use downtube_client::{ClientConfig, DowntubeClient, MediaKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DowntubeClient::new(ClientConfig::with_base_url("http://localhost:8000"))?;
//!
//!     let job_id = client.submit("https://youtu.be/abc", MediaKind::Audio).await?;
//!
//!     let mut status = client.open_status(job_id);
//!     while let Some(snapshot) = status.changed().await {
//!         println!("{}", client.view(&snapshot).message);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Artifact retrieval
pub mod artifact;
/// Client facade
pub mod client;
/// Configuration types
pub mod config;
/// Backend endpoint addresses
pub mod endpoints;
/// Error types
pub mod error;
/// Submission form controller
pub mod form;
/// Client-facing views
pub mod routes;
/// Live status observation
pub mod status;
/// Job submission
pub mod submission;
/// Core types
pub mod types;
/// Result view model
pub mod view;

// Re-export commonly used types
pub use artifact::ArtifactClient;
pub use client::DowntubeClient;
pub use config::{ClientConfig, StreamConfig, StreamErrorPolicy, StreamTransport};
pub use endpoints::Endpoints;
pub use error::{Error, Result, StatusParseError, StreamError, SubmissionError};
pub use form::{FormCallbacks, FormOutcome, SubmitForm};
pub use routes::Route;
pub use status::{StatusHandle, StatusSource, StatusStream, StatusTracker};
pub use submission::SubmissionClient;
pub use types::{CloseReason, JobId, JobSnapshot, JobStatus, MediaKind, StatusUpdate};
pub use view::{ResultView, RetrievalLink};
