use thiserror::Error;

use crate::core::config::ConfigError;
use crate::download::error::PipelineError;
use crate::relay::RelayError;

/// Top-level error type for bootstrap and CLI code
///
/// Pipeline stages use their own classified errors (see `download::error`);
/// those surface here only when something outside a pipeline run fails.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Fallback relay session errors
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    /// A pipeline stage failed outside the chat flow (CLI)
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
