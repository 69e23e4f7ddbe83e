//! Tapebot - Telegram bot that relays Streamtape videos
//!
//! A user sends a Streamtape share link; the bot resolves it to a direct
//! download URL, streams the video to disk and hands it back, either inline
//! or, when it is too large for the Bot API, through a fallback.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, link validation, static endpoint
//! - `download`: The per-request pipeline and its stages
//! - `relay`: MTProto session used for oversized videos
//! - `telegram`: Bot setup, handler tree, chat transport

pub mod cli;
pub mod core;
pub mod download;
pub mod relay;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult, Config};
pub use download::{DownloadRequest, Pipeline};
