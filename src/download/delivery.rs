//! Delivery router — inline reply for small artifacts, a fallback for the rest.
//!
//! The fallback is chosen once at startup from configuration:
//! - [`RelayFallback`] pushes the file through the MTProto relay session to a
//!   fixed channel.
//! - [`StaticLinkFallback`] publishes a copy on the static file endpoint and
//!   replies with its URL.
//!
//! A given artifact is delivered one way only; the router never tries inline
//! after choosing a fallback or vice versa.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::config::validation::INLINE_LIMIT_BYTES;
use crate::core::web_server::{published_path, PUBLISHED_FILE_NAME};
use crate::download::artifact::LocalArtifact;
use crate::download::error::{DeliveryError, PipelineError};
use crate::download::request::DownloadRequest;
use crate::download::transport::ChatTransport;
use crate::relay::FileRelay;

/// Notice sent before an oversized video goes through the relay.
pub const LARGE_VIDEO_NOTICE: &str =
    "<b>Video is larger than 50MB, it will be posted to the channel instead.</b>";

/// How a run ended.
#[derive(Debug)]
pub enum DeliveryOutcome {
    InlineDelivered,
    RelayedViaFallback,
    ServedAsStaticLink { url: String },
    Failed(PipelineError),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DeliveryOutcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::InlineDelivered => "inline",
            DeliveryOutcome::RelayedViaFallback => "relay",
            DeliveryOutcome::ServedAsStaticLink { .. } => "static_link",
            DeliveryOutcome::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Failed(e) => write!(f, "failed ({}: {})", e.kind(), e),
            other => f.write_str(other.label()),
        }
    }
}

/// Delivers artifacts at or above the inline limit.
#[async_trait]
pub trait FallbackStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(
        &self,
        artifact: &LocalArtifact,
        request: &DownloadRequest,
        transport: &dyn ChatTransport,
    ) -> Result<DeliveryOutcome, DeliveryError>;
}

/// Sends oversized videos to a fixed channel through the relay session.
pub struct RelayFallback {
    relay: Arc<dyn FileRelay>,
    destination: i64,
}

impl RelayFallback {
    pub fn new(relay: Arc<dyn FileRelay>, destination: i64) -> Self {
        Self { relay, destination }
    }
}

#[async_trait]
impl FallbackStrategy for RelayFallback {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn deliver(
        &self,
        artifact: &LocalArtifact,
        request: &DownloadRequest,
        transport: &dyn ChatTransport,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        transport.reply_text(request.message_id, LARGE_VIDEO_NOTICE).await?;

        self.relay
            .send_file(self.destination, artifact.path(), &request.source_text)
            .await?;

        log::info!(
            "Relayed {} to channel {} for chat {}",
            artifact.path().display(),
            self.destination,
            request.conversation
        );
        Ok(DeliveryOutcome::RelayedViaFallback)
    }
}

/// Publishes oversized videos on the static endpoint and replies with a link.
///
/// There is a single published slot; each publish replaces the previous file
/// atomically (copy to a temp name, then rename).
pub struct StaticLinkFallback {
    publish_dir: PathBuf,
    public_url: String,
}

impl StaticLinkFallback {
    pub fn new(publish_dir: PathBuf, public_url: impl Into<String>) -> Self {
        Self {
            publish_dir,
            public_url: public_url.into(),
        }
    }

    pub fn link(&self) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), PUBLISHED_FILE_NAME)
    }

    async fn publish(&self, artifact: &LocalArtifact) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.publish_dir).await?;

        let staging = self.publish_dir.join(format!(".{}.partial", Uuid::new_v4().simple()));
        let result = async {
            tokio::fs::copy(artifact.path(), &staging).await?;
            tokio::fs::rename(&staging, published_path(&self.publish_dir)).await
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&staging).await;
        }
        result
    }
}

#[async_trait]
impl FallbackStrategy for StaticLinkFallback {
    fn name(&self) -> &'static str {
        "static_link"
    }

    async fn deliver(
        &self,
        artifact: &LocalArtifact,
        request: &DownloadRequest,
        transport: &dyn ChatTransport,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        self.publish(artifact).await.map_err(DeliveryError::Publish)?;

        let url = self.link();
        let reply = format!(
            "<b>As file size is over 50MB, please download file from <a href=\"{}\">here</a></b>",
            url
        );
        transport.reply_text(request.message_id, &reply).await?;

        Ok(DeliveryOutcome::ServedAsStaticLink { url })
    }
}

/// Picks inline or fallback delivery from the measured artifact size.
pub struct DeliveryRouter {
    inline_limit: u64,
    fallback: Arc<dyn FallbackStrategy>,
}

impl DeliveryRouter {
    pub fn new(fallback: Arc<dyn FallbackStrategy>) -> Self {
        Self {
            inline_limit: INLINE_LIMIT_BYTES,
            fallback,
        }
    }

    /// Overrides the inline ceiling (defaults to 50 MiB).
    pub fn with_inline_limit(mut self, inline_limit: u64) -> Self {
        self.inline_limit = inline_limit;
        self
    }

    pub fn inline_limit(&self) -> u64 {
        self.inline_limit
    }

    pub fn fallback_name(&self) -> &'static str {
        self.fallback.name()
    }

    /// Delivers `artifact` to the requester.
    ///
    /// The size is the one measured after download; if the artifact was never
    /// measured it is read from the filesystem here, before any branch is taken.
    pub async fn route(
        &self,
        artifact: &LocalArtifact,
        request: &DownloadRequest,
        transport: &dyn ChatTransport,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let size = match artifact.size_bytes() {
            Some(size) => size,
            None => tokio::fs::metadata(artifact.path())
                .await
                .map_err(DeliveryError::Measure)?
                .len(),
        };

        if size < self.inline_limit {
            log::info!(
                "Routing {} ({} bytes) inline to chat {}",
                artifact.path().display(),
                size,
                request.conversation
            );
            transport.reply_video(request.message_id, artifact.path()).await?;
            return Ok(DeliveryOutcome::InlineDelivered);
        }

        log::info!(
            "Routing {} ({} bytes ≥ {}) via {} for chat {}",
            artifact.path().display(),
            size,
            self.inline_limit,
            self.fallback.name(),
            request.conversation
        );
        self.fallback.deliver(artifact, request, transport).await
    }
}
