//! Download pipeline: resolve, fetch, route, clean up

pub mod artifact;
pub mod delivery;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod request;
pub mod resolver;
pub mod serializer;
pub mod status;
pub mod transport;

// Re-exports for convenience
pub use artifact::LocalArtifact;
pub use delivery::{DeliveryOutcome, DeliveryRouter, FallbackStrategy, RelayFallback, StaticLinkFallback};
pub use error::{DeliveryError, DownloadError, PipelineError, ResolveError, TransportError};
pub use fetch::Fetcher;
pub use pipeline::{LogObserver, Pipeline, PipelineStage, RunReport, StageObserver};
pub use request::{ConversationKey, DownloadRequest};
pub use resolver::{LinkResolver, ResolvedDownload, StreamtapeResolver};
pub use serializer::ConversationSerializer;
pub use transport::{ChatTransport, MessageRef};
