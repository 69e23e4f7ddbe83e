//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! The same tree is used by `main` and can be driven directly in tests.

mod schema;
mod types;

pub use schema::{looks_like_url, route_message, schema, MessageRoute};
pub use types::{HandlerDeps, HandlerError};
