//! Conversation serializer — one pipeline run per conversation at a time.
//!
//! Each active conversation owns a slot (`tokio::sync::Mutex<()>`). Tokio's
//! mutex hands the lock out in FIFO order, so queued runs for the same chat
//! execute in arrival order, while different chats never contend. Slots are
//! evicted once nobody holds or waits on them.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::download::request::ConversationKey;

#[derive(Default)]
pub struct ConversationSerializer {
    slots: DashMap<ConversationKey, Arc<Mutex<()>>>,
}

impl ConversationSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `fut` once every earlier run for `key` has finished.
    ///
    /// The slot is released when `fut` completes or is dropped, so a failed or
    /// abandoned run never keeps the conversation blocked.
    pub async fn run<F, T>(&self, key: ConversationKey, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let output = {
            let _guard = slot.lock().await;
            fut.await
        };

        // Map + our clone = 2 references: nobody else holds or awaits the slot.
        self.slots.remove_if(&key, |_, s| Arc::strong_count(s) <= 2);
        output
    }

    /// Number of conversations with a run in flight or queued.
    pub fn active_conversations(&self) -> usize {
        self.slots.len()
    }
}
