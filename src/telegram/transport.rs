//! Telegram implementation of the pipeline's chat transport

use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode, ReplyParameters};

use crate::download::error::TransportError;
use crate::download::transport::{ChatTransport, MessageRef};

/// Bot API transport bound to one chat.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramTransport {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

fn reply_to(message: MessageRef) -> ReplyParameters {
    ReplyParameters::new(MessageId(message))
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn reply_text(&self, reply_to_id: MessageRef, text: &str) -> Result<MessageRef, TransportError> {
        let sent = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_parameters(reply_to(reply_to_id))
            .await?;
        Ok(sent.id.0)
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        self.bot
            .edit_message_text(self.chat_id, MessageId(message), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<(), TransportError> {
        self.bot.delete_message(self.chat_id, MessageId(message)).await?;
        Ok(())
    }

    async fn reply_video(&self, reply_to_id: MessageRef, path: &Path) -> Result<(), TransportError> {
        self.bot
            .send_video(self.chat_id, InputFile::file(path.to_path_buf()))
            .supports_streaming(true)
            .reply_parameters(reply_to(reply_to_id))
            .await?;
        Ok(())
    }
}
