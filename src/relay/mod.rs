//! Fallback relay: posts oversized videos through a second, user-level
//! MTProto session that is not bound by the Bot API upload ceiling.

pub mod client;
pub mod error;

use async_trait::async_trait;
use std::path::Path;

pub use client::MtProtoRelay;
pub use error::RelayError;

/// Sends a local file to a chat through the relay session.
#[async_trait]
pub trait FileRelay: Send + Sync {
    async fn send_file(&self, destination: i64, path: &Path, caption: &str) -> Result<(), RelayError>;
}

/// Converts a Bot API channel id (`-100xxxxxxxxxx`) into the bare MTProto id.
///
/// Ids without the channel prefix are returned unchanged.
pub fn normalize_channel_id(id: i64) -> i64 {
    const CHANNEL_OFFSET: i64 = 1_000_000_000_000;
    if id < -CHANNEL_OFFSET {
        -id - CHANNEL_OFFSET
    } else {
        id
    }
}
