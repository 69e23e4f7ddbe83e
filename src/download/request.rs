//! Per-request data carried through one pipeline run.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::download::transport::MessageRef;

/// Identifies the conversation a run belongs to (the chat id).
///
/// Runs sharing a key are serialized; the key lives only for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationKey(pub i64);

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inbound message that asked for a video.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Raw message text, also used as the relay caption
    pub source_text: String,
    /// Sender's user id, if the platform exposed one
    pub requester_id: Option<u64>,
    pub conversation: ConversationKey,
    /// Id of the inbound message; replies are threaded off it
    pub message_id: MessageRef,
    pub requested_at: DateTime<Utc>,
}

impl DownloadRequest {
    pub fn new(conversation: ConversationKey, message_id: MessageRef, source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            requester_id: None,
            conversation,
            message_id,
            requested_at: Utc::now(),
        }
    }

    pub fn with_requester(mut self, requester_id: u64) -> Self {
        self.requester_id = Some(requester_id);
        self
    }
}
