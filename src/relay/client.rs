//! MTProto relay client wrapper around grammers

use super::error::RelayError;
use super::{normalize_channel_id, FileRelay};
use async_trait::async_trait;
use dashmap::DashMap;
use grammers_client::types::InputMessage;
use grammers_client::{Client, Config, InitParams};
use grammers_session::{PackedChat, Session};
use std::path::Path;
use tokio::sync::Mutex;

/// Relay session logged in as a regular account
pub struct MtProtoRelay {
    client: Client,
    /// Resolved destinations, keyed by bare MTProto id
    chats: DashMap<i64, PackedChat>,
    /// One upload at a time through the shared session
    upload_lock: Mutex<()>,
}

impl MtProtoRelay {
    /// Connects using an existing session file.
    ///
    /// # Arguments
    /// * `api_id` - Telegram API ID from my.telegram.org
    /// * `api_hash` - Telegram API hash from my.telegram.org
    /// * `session_path` - Session file produced by an earlier interactive login
    pub async fn connect(api_id: i32, api_hash: &str, session_path: &Path) -> Result<Self, RelayError> {
        log::info!("Initializing relay session from {:?}", session_path);

        let session = Session::load_file(session_path)
            .map_err(|e| RelayError::Session(format!("Failed to load session: {}", e)))?;

        let config = Config {
            session,
            api_id,
            api_hash: api_hash.to_string(),
            params: InitParams {
                device_model: "tapebot relay".to_string(),
                system_version: "1.0".to_string(),
                app_version: env!("CARGO_PKG_VERSION").to_string(),
                system_lang_code: "en".to_string(),
                lang_code: "en".to_string(),
                ..Default::default()
            },
        };

        let client = Client::connect(config)
            .await
            .map_err(|e| RelayError::Session(format!("Failed to connect: {}", e)))?;

        if !client.is_authorized().await? {
            return Err(RelayError::NotAuthorized);
        }

        // Persist refreshed auth keys and DC info
        client
            .session()
            .save_to_file(session_path)
            .map_err(|e| RelayError::Session(format!("Failed to save session: {}", e)))?;

        log::info!("Relay session authorized");

        Ok(Self {
            client,
            chats: DashMap::new(),
            upload_lock: Mutex::new(()),
        })
    }

    /// Finds `destination` among the session's dialogs.
    async fn resolve_chat(&self, destination: i64) -> Result<PackedChat, RelayError> {
        let id = normalize_channel_id(destination);
        if let Some(chat) = self.chats.get(&id) {
            return Ok(*chat);
        }

        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs.next().await? {
            let chat = dialog.chat();
            if chat.id() == id {
                let packed = chat.pack();
                self.chats.insert(id, packed);
                return Ok(packed);
            }
        }

        Err(RelayError::DestinationNotFound(destination))
    }
}

#[async_trait]
impl FileRelay for MtProtoRelay {
    async fn send_file(&self, destination: i64, path: &Path, caption: &str) -> Result<(), RelayError> {
        let chat = self.resolve_chat(destination).await?;

        let _guard = self.upload_lock.lock().await;
        log::info!("Uploading {} through relay session", path.display());

        let uploaded = self.client.upload_file(path).await?;
        self.client
            .send_message(chat, InputMessage::text(caption).document(uploaded))
            .await?;

        log::info!("Relay upload of {} finished", path.display());
        Ok(())
    }
}
