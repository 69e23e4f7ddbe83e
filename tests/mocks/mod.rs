//! Recording mocks for pipeline tests
//!
//! Each mock stands in for one seam of the pipeline and records what the
//! pipeline asked of it, so tests can assert on the exact traffic.

pub mod recording;

pub use recording::{RecordingObserver, RecordingRelay, RecordingTransport, RelayedFile, Sent, StubResolver};
