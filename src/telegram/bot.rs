//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command texts shown to users

use indoc::indoc;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config::{self, Config};

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "welcome message")]
    Start,
    #[command(description = "about this bot")]
    Help,
}

pub const START_TEXT: &str = indoc! {"
    <b>Welcome!</b> ✨ Send a Streamtape link.
    <i>Videos over 50MB can't be sent directly due to Telegram restrictions, you will get them another way.</i>"};

pub const HELP_TEXT: &str = indoc! {"
    <b>@anzubo Project.</b>

    This bot uses the Streamtape API to download videos. You are required to follow Streamtape's TOS.
    <i>You will not download anything of an illegal and/or adult nature.</i>"};

impl Command {
    /// Text sent back for this command.
    pub fn reply_text(&self) -> &'static str {
        match self {
            Command::Start => START_TEXT,
            Command::Help => HELP_TEXT,
        }
    }
}

/// Reply for messages that carry no link at all.
pub const NO_LINK_TEXT: &str = "<b>Send a valid Streamtape link.</b>";

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to build the HTTP client
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new()
        .timeout(config::network::timeout())
        .connect_timeout(config::network::connect_timeout())
        .build()?;
    let bot = Bot::with_client(config.bot_token.expose_secret(), client);

    Ok(match &config.bot_api_url {
        Some(url) => {
            log::info!("Using custom Bot API URL: {}", url);
            bot.set_api_url(url.clone())
        }
        None => bot,
    })
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "tapebot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help", "tapebot").unwrap(), Command::Help);
        assert!(Command::parse("/download", "tapebot").is_err());
    }

    #[test]
    fn test_texts_are_html() {
        assert!(START_TEXT.starts_with("<b>Welcome!</b>"));
        assert!(HELP_TEXT.contains("\n\nThis bot uses the Streamtape API"));
        assert!(!START_TEXT.contains('*'));
    }
}
