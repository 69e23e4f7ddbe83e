//! Logging initialization
//!
//! Console + file output through `simplelog`, plus a panic hook that routes
//! panics into the same log instead of only stderr.

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use std::path::Path;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &Path) -> Result<()> {
    let log_file = File::create(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to create log file {}: {}", log_file_path.display(), e))?;

    let config = ConfigBuilder::new()
        .add_filter_allow_str("tapebot")
        .set_time_format_rfc3339()
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Debug, config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs panics (with location) instead of letting them vanish with a worker task.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));
}
