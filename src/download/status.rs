//! Editable "in progress" status message.
//!
//! A [`StatusMessage`] can only be finished by consuming it, so every run
//! ends with the message either deleted (success) or turned into the failure
//! notice.

use crate::download::error::TransportError;
use crate::download::transport::{ChatTransport, MessageRef};

pub const DOWNLOADING: &str = "<b>Downloading</b>";
pub const FETCHING: &str = "<b>Downloading video…</b>";
pub const UPLOADING: &str = "<b>Uploading…</b>";

/// The bot's in-progress message for one run.
#[derive(Debug)]
pub struct StatusMessage {
    id: MessageRef,
    reply_to: MessageRef,
    text: String,
}

impl StatusMessage {
    /// Posts the initial status as a reply to the request.
    pub async fn post(
        transport: &dyn ChatTransport,
        reply_to: MessageRef,
        text: &str,
    ) -> Result<Self, TransportError> {
        let id = transport.reply_text(reply_to, text).await?;
        Ok(Self {
            id,
            reply_to,
            text: text.to_string(),
        })
    }

    pub fn id(&self) -> MessageRef {
        self.id
    }

    /// Updates the status at a stage boundary. Failures are logged, not fatal.
    pub async fn update(&mut self, transport: &dyn ChatTransport, text: &str) {
        if self.text == text {
            return;
        }
        match transport.edit_text(self.id, text).await {
            Ok(()) => self.text = text.to_string(),
            Err(e) => log::warn!("Failed to update status message {}: {}", self.id, e),
        }
    }

    /// Success: the status message disappears.
    pub async fn finish_ok(self, transport: &dyn ChatTransport) {
        if let Err(e) = transport.delete(self.id).await {
            log::warn!("Failed to delete status message {}: {}", self.id, e);
        }
    }

    /// Failure: the status message becomes the failure notice.
    ///
    /// If the edit is rejected the notice is sent as a fresh reply and the
    /// stale status is deleted instead.
    pub async fn finish_err(self, transport: &dyn ChatTransport, notice: &str) {
        if transport.edit_text(self.id, notice).await.is_ok() {
            return;
        }
        log::warn!("Could not edit status {} into failure notice, replying instead", self.id);
        if let Err(e) = transport.reply_text(self.reply_to, notice).await {
            log::error!("Failed to deliver failure notice: {}", e);
        }
        if let Err(e) = transport.delete(self.id).await {
            log::warn!("Failed to delete status message {}: {}", self.id, e);
        }
    }
}
