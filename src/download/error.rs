//! Classified errors for each pipeline stage.
//!
//! Every stage fails with its own error type; the pipeline driver folds them
//! into [`PipelineError`], which decides the single reply the requester sees.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::validation::ValidationError;
use crate::relay::RelayError;

/// The resolver API rejected the request or could not be reached.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// API answered with a non-200 status (bad credentials, unknown file, ...)
    #[error("resolver rejected request ({status}): {msg}")]
    Rejected { status: u16, msg: String },

    /// Network failure talking to the API. Built with [`ResolveError::transport`]
    /// so the request URL (which carries the API key) never reaches a log line.
    #[error("resolver unreachable: {0}")]
    Transport(reqwest::Error),

    /// API answered 200 but the payload lacked required fields
    #[error("malformed resolver response: {0}")]
    Malformed(String),
}

/// Fetching the resolved URL into the local artifact failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Media host answered with a non-success status
    #[error("media host returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Read side of the stream failed (URL stripped, see [`DownloadError::transport`])
    #[error("download stream failed: {0}")]
    Transport(reqwest::Error),

    /// Write side (or size measurement) failed
    #[error("writing artifact failed: {0}")]
    Io(#[from] std::io::Error),

    /// Create-or-fail found the artifact path already taken
    #[error("artifact path already exists: {}", .0.display())]
    Collision(PathBuf),
}

impl ResolveError {
    /// Wraps a client error with its request URL removed.
    pub fn transport(err: reqwest::Error) -> Self {
        ResolveError::Transport(err.without_url())
    }
}

impl DownloadError {
    /// Wraps a client error with its request URL removed; direct URLs are single-use tokens.
    pub fn transport(err: reqwest::Error) -> Self {
        DownloadError::Transport(err.without_url())
    }

    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::Status(_) => "status",
            DownloadError::Transport(_) => "transport",
            DownloadError::Io(_) => "io",
            DownloadError::Collision(_) => "collision",
        }
    }
}

/// The chat platform rejected or never received a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The user blocked the bot; nothing can be delivered to this chat
    #[error("bot was blocked by the user")]
    Blocked,

    /// The platform could not be contacted
    #[error("could not contact Telegram: {0}")]
    Unreachable(String),

    /// The platform answered with an error
    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Handing the artifact to the requester failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Inline reply (or large-file notice) failed
    #[error("inline delivery failed: {0}")]
    Inline(#[from] TransportError),

    /// Fallback relay session failed to upload or send
    #[error("fallback relay failed: {0}")]
    Relay(#[from] RelayError),

    /// Copying the artifact into the static slot failed
    #[error("publishing static copy failed: {0}")]
    Publish(std::io::Error),

    /// The artifact size could not be read before routing
    #[error("measuring artifact failed: {0}")]
    Measure(std::io::Error),
}

/// Terminal failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Status or reply traffic to the chat failed outside delivery
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The run's own bookkeeping broke (a stage ran without its input)
    #[error("internal pipeline error: {0}")]
    Internal(String),
}

/// Reply shown when the message is not a Streamtape link.
pub const INVALID_LINK_REPLY: &str = "<b>Send a Streamtape link!</b>";

/// Reply shown when resolving, downloading or delivering failed.
pub const FAILED_REPLY: &str = "<b>Failed to download file.</b>";

impl PipelineError {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Resolution(_) => "resolution",
            PipelineError::Download(_) => "download",
            PipelineError::Delivery(_) => "delivery",
            PipelineError::Transport(_) => "transport",
            PipelineError::Internal(_) => "internal",
        }
    }

    /// The single message the requester sees for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => INVALID_LINK_REPLY,
            _ => FAILED_REPLY,
        }
    }

    /// False when no reply can reach the requester (blocked bot).
    pub fn is_reportable(&self) -> bool {
        !matches!(
            self,
            PipelineError::Transport(TransportError::Blocked)
                | PipelineError::Delivery(DeliveryError::Inline(TransportError::Blocked))
        )
    }
}
