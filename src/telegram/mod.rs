//! Telegram surface: bot setup, handler tree, chat transport

pub mod bot;
pub mod errors;
pub mod handlers;
pub mod notifications;
pub mod transport;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use transport::TelegramTransport;
