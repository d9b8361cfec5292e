//! Live job status observation.
//!
//! - [`machine`] - the transport-independent state machine
//! - [`source`] - the transport seam
//! - [`sse`] - server-sent events transport
//! - [`polling`] - JSON polling transport
//! - [`stream`] - the subscription driver and consumer handle

pub mod machine;
pub mod polling;
pub mod source;
pub mod sse;
pub mod stream;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use machine::{StatusTracker, Transition};
pub use polling::PollingSource;
pub use source::{StatusEvents, StatusSource};
pub use sse::{SseDecoder, SseEvent, SseSource};
pub use stream::{StatusHandle, StatusStream};
