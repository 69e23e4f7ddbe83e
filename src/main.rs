use anyhow::Result;
use dotenvy::dotenv;
use secrecy::ExposeSecret;
use std::sync::Arc;
use teloxide::prelude::*;

use tapebot::cli::{Cli, Commands};
use tapebot::core::config::{Config, FallbackPolicy};
use tapebot::core::validation::SourceLink;
use tapebot::core::web_server::start_static_server;
use tapebot::core::{init_logger, install_panic_hook, AppResult};
use tapebot::download::{
    ConversationSerializer, DeliveryRouter, FallbackStrategy, Fetcher, LinkResolver, Pipeline, PipelineError,
    RelayFallback, StaticLinkFallback, StreamtapeResolver,
};
use tapebot::relay::MtProtoRelay;
use tapebot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (configuration, logging, relay session).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    install_panic_hook();

    // Load environment variables from .env if present
    let _ = dotenv();
    if let Some(Commands::Run { profile: Some(profile) }) = &cli.command {
        let file = format!(".env.{}", profile);
        if let Err(e) = dotenvy::from_filename(&file) {
            eprintln!("Failed to load {}: {}", file, e);
        }
    }

    let config = Config::from_env()?;
    init_logger(&config.log_file)?;

    match cli.command {
        Some(Commands::Resolve { link }) => Ok(run_resolve(&config, &link).await?),
        Some(Commands::Run { profile }) => {
            log::info!("Running bot (profile: {})", profile.as_deref().unwrap_or("default"));
            run_bot(config).await
        }
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(config).await
        }
    }
}

/// Validates and resolves one link, printing the direct URL.
async fn run_resolve(config: &Config, link: &str) -> AppResult<()> {
    let link = SourceLink::parse(link).map_err(PipelineError::from)?;
    let resolver = StreamtapeResolver::new(config.resolver.clone()).map_err(PipelineError::from)?;
    let resolved = resolver.resolve(&link).await.map_err(PipelineError::from)?;

    println!("{}", resolved.direct_url);
    if let Some(name) = &resolved.name {
        println!("name: {}", name);
    }
    if let Some(size) = resolved.reported_size {
        println!("size: {} bytes", size);
    }
    Ok(())
}

/// Builds the fallback chosen by configuration, starting whatever it needs.
async fn build_fallback(config: &Config) -> Result<Arc<dyn FallbackStrategy>> {
    match &config.fallback {
        FallbackPolicy::Relay(relay) => {
            let session =
                MtProtoRelay::connect(relay.api_id, relay.api_hash.expose_secret(), &relay.session_file).await?;
            log::info!("Oversized videos go to channel {} via relay", relay.channel_id);
            Ok(Arc::new(RelayFallback::new(Arc::new(session), relay.channel_id)))
        }
        FallbackPolicy::StaticLink(static_link) => {
            let port = static_link.port;
            let publish_dir = static_link.publish_dir.clone();
            tokio::spawn(async move {
                if let Err(e) = start_static_server(port, publish_dir).await {
                    log::error!("Static file server stopped: {}", e);
                }
            });
            log::info!("Oversized videos are served at {}", static_link.public_url);
            Ok(Arc::new(StaticLinkFallback::new(
                static_link.publish_dir.clone(),
                static_link.public_url.clone(),
            )))
        }
    }
}

async fn run_bot(config: Config) -> Result<()> {
    log::info!("Starting tapebot v{}", env!("CARGO_PKG_VERSION"));

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let resolver = Arc::new(StreamtapeResolver::new(config.resolver.clone())?);
    let fetcher = Fetcher::new()?;
    let router = DeliveryRouter::new(build_fallback(&config).await?);
    log::info!(
        "Delivery: inline below {} bytes, otherwise {}",
        router.inline_limit(),
        router.fallback_name()
    );

    let pipeline = Arc::new(Pipeline::new(resolver, fetcher, router, config.download_dir.clone()));
    let deps = HandlerDeps::new(Arc::new(config), pipeline, Arc::new(ConversationSerializer::new()));

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
