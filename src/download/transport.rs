//! Chat transport seam used by the pipeline.
//!
//! One instance is bound to one conversation. The Telegram implementation
//! lives in `telegram::transport`; tests use recording mocks.

use async_trait::async_trait;
use std::path::Path;

use crate::download::error::TransportError;

/// Message id inside the bound conversation.
pub type MessageRef = i32;

/// Outbound operations the pipeline needs from the chat platform.
///
/// Text is HTML-formatted.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends `text` threaded off `reply_to`; returns the new message id.
    async fn reply_text(&self, reply_to: MessageRef, text: &str) -> Result<MessageRef, TransportError>;

    /// Replaces the text of a message the bot sent earlier.
    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError>;

    /// Deletes a message the bot sent earlier.
    async fn delete(&self, message: MessageRef) -> Result<(), TransportError>;

    /// Uploads a video file threaded off `reply_to`, with progressive playback enabled.
    async fn reply_video(&self, reply_to: MessageRef, path: &Path) -> Result<(), TransportError>;
}
