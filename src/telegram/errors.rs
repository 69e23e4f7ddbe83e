//! Classification of Telegram request failures

use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};

use crate::download::error::TransportError;

/// Reply sent when a request failed for a reason the user can't act on.
pub const GENERIC_ERROR_REPLY: &str = "An error occurred";

/// Coarse class of a failed Bot API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The user blocked the bot; nothing can be sent to this chat
    Blocked,
    /// Telegram could not be contacted
    Network,
    /// Telegram answered with an error
    Api,
}

pub fn classify(err: &RequestError) -> ErrorClass {
    match err {
        RequestError::Api(ApiError::BotBlocked) => ErrorClass::Blocked,
        RequestError::Network(_) | RequestError::Io(_) => ErrorClass::Network,
        _ => ErrorClass::Api,
    }
}

impl From<RequestError> for TransportError {
    fn from(err: RequestError) -> Self {
        match classify(&err) {
            ErrorClass::Blocked => TransportError::Blocked,
            ErrorClass::Network => TransportError::Unreachable(err.to_string()),
            ErrorClass::Api => TransportError::Api(err.to_string()),
        }
    }
}

/// Logs a failed request made while handling `msg` and, for plain API
/// errors, tells the user something went wrong.
pub async fn handle_request_error(bot: &Bot, msg: &Message, err: &RequestError) {
    log::error!(
        "Error while handling message {} in chat {}, query: {:?}",
        msg.id.0,
        msg.chat.id.0,
        msg.text()
    );

    match classify(err) {
        ErrorClass::Blocked => log::info!("Bot was blocked by the user in chat {}", msg.chat.id.0),
        ErrorClass::Network => log::error!("Could not contact Telegram: {}", err),
        ErrorClass::Api => {
            log::error!("Error in request: {}", err);
            if let Err(e) = bot.send_message(msg.chat.id, GENERIC_ERROR_REPLY).await {
                log::error!("Failed to send error reply to chat {}: {}", msg.chat.id.0, e);
            }
        }
    }
}
