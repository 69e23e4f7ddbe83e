//! Dispatcher schema and handler chain builders

use std::time::Instant;

use lazy_regex::regex_is_match;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Message, MessageEntity, MessageEntityKind, ParseMode};

use super::types::{HandlerDeps, HandlerError};
use crate::core::validation::SourceLink;
use crate::download::request::{ConversationKey, DownloadRequest};
use crate::telegram::bot::{Command, NO_LINK_TEXT};
use crate::telegram::errors::handle_request_error;
use crate::telegram::notifications::{copy_to_admin, sender_name, should_copy_to_admin};
use crate::telegram::transport::TelegramTransport;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Order matters: commands first, then messages carrying a URL, then
/// everything else.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_links = deps.clone();
    let deps_other = deps;

    Update::filter_message()
        .branch(command_handler(deps_commands))
        .branch(link_handler(deps_links))
        .branch(other_message_handler(deps_other))
}

/// True when `text` contains something that looks like a web link.
pub fn looks_like_url(text: &str) -> bool {
    regex_is_match!(r"(?i)\bhttps?://\S+", text)
}

/// Where a non-command message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRoute {
    /// Source text handed to the download pipeline
    Link(String),
    /// Gets the "send a valid link" reply
    Other,
}

/// Picks the branch for a message that is not a known command.
///
/// Visible text wins when it already holds a Streamtape link. Otherwise a
/// text link whose hidden target is a Streamtape link is used, since the
/// visible label is just a caption. Any other URL still goes to the pipeline
/// so the sender gets the invalid-link reply.
pub fn route_message(text: Option<&str>, entities: &[MessageEntity]) -> MessageRoute {
    let Some(text) = text else {
        return MessageRoute::Other;
    };

    if SourceLink::parse(text).is_ok() {
        return MessageRoute::Link(text.to_string());
    }

    let hidden_link = entities.iter().find_map(|e| match &e.kind {
        MessageEntityKind::TextLink { url } if SourceLink::parse(url.as_str()).is_ok() => Some(url.to_string()),
        _ => None,
    });
    if let Some(url) = hidden_link {
        return MessageRoute::Link(url);
    }

    let has_entity = entities
        .iter()
        .any(|e| matches!(e.kind, MessageEntityKind::Url | MessageEntityKind::TextLink { .. }));
    if has_entity || looks_like_url(text) {
        MessageRoute::Link(text.to_string())
    } else {
        MessageRoute::Other
    }
}

/// Source text picked by [`route_message`] for the link branch.
#[derive(Debug, Clone)]
struct LinkText(String);

/// Logs the sender and sends the admin copy. Runs for every message.
fn observe(bot: &Bot, msg: &Message, deps: &HandlerDeps) {
    if let Some(user) = msg.from.as_ref() {
        log::info!(
            "From: {} (@{}) ID: {} Message: {}",
            sender_name(user),
            user.username.as_deref().unwrap_or("-"),
            user.id.0,
            msg.text().unwrap_or("<non-text>")
        );
    }

    let chat_is_admin = deps.config.is_admin(msg.chat.id.0);
    if let Some(admin) = deps.config.primary_admin() {
        if should_copy_to_admin(msg.text(), chat_is_admin) {
            tokio::spawn(copy_to_admin(bot.clone(), ChatId(admin), msg.clone()));
        }
    }
}

fn log_response_time(started: Instant) {
    log::info!("Response time: {} ms", started.elapsed().as_millis());
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let started = Instant::now();
                observe(&bot, &msg, &deps);
                log::info!("Received command {:?} from chat {}", cmd, msg.chat.id.0);

                if let Err(e) = bot
                    .send_message(msg.chat.id, cmd.reply_text())
                    .parse_mode(ParseMode::Html)
                    .await
                {
                    handle_request_error(&bot, &msg, &e).await;
                }

                log_response_time(started);
                Ok(())
            }
        },
    )
}

fn link_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::filter_map(|msg: Message| match route_message(msg.text(), msg.entities().unwrap_or_default()) {
        MessageRoute::Link(text) => Some(LinkText(text)),
        MessageRoute::Other => None,
    })
    .endpoint(move |bot: Bot, msg: Message, link: LinkText| {
        let deps = deps.clone();
        async move {
            let started = Instant::now();
            observe(&bot, &msg, &deps);

            let key = ConversationKey(msg.chat.id.0);
            let mut request = DownloadRequest::new(key, msg.id.0, link.0);
            if let Some(user) = msg.from.as_ref() {
                request = request.with_requester(user.id.0);
            }

            let transport = TelegramTransport::new(bot.clone(), msg.chat.id);
            let report = deps
                .serializer
                .run(key, deps.pipeline.run(&request, &transport))
                .await;

            log::info!("Chat {} run outcome: {}", key, report.outcome);
            log_response_time(started);
            Ok(())
        }
    })
}

fn other_message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move {
            let started = Instant::now();
            observe(&bot, &msg, &deps);

            if let Err(e) = bot
                .send_message(msg.chat.id, NO_LINK_TEXT)
                .parse_mode(ParseMode::Html)
                .await
            {
                handle_request_error(&bot, &msg, &e).await;
            }

            log_response_time(started);
            Ok(())
        }
    })
}
