//! reelvault CLI
//!
//! Compatibility transcoding and lossless segment export for a video library.
//!
//! # Usage
//!
//! ```bash
//! reelvault transcode --in "holiday.mov" "party.avi"
//! reelvault keyframes --in "holiday.mp4"
//! reelvault plan --in "holiday.mp4" --start 00:03 --end 00:12
//! reelvault export --in "holiday.mp4" --range 00:03-00:12 --range 01:00-01:30
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use reelvault_cli::adapters::{init_logging, AppConfig};
use reelvault_cli::app::DefaultAppContainer;
use reelvault_cli::cli::{commands, Cli};

/// Main entry point for the reelvault CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging(&config.log)?;
    info!(staged_path = %config.staged_path.display(), "Starting reelvault");

    let container = DefaultAppContainer::new(&config)?;
    commands::run(cli.command, &container).await
}
