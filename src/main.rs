//! ScreenComp CLI
//!
//! Picks comparable screenshots across several encodes of the same video and
//! publishes them to an image host as a comparison block.
//!
//! # Usage
//!
//! ```bash
//! screencomp sample -s "remux.mkv;name=Remux;tonemap" -s "encode.mkv;name=Encode" --output
//! PTPIMG_API=... screencomp publish --dir Screenshots --source-name Remux --source-name Encode
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use screencomp_cli::cli::{commands, Cli, Commands};
use screencomp_cli::utils::init_logging;

/// Main entry point for the ScreenComp CLI
fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_json)?;

    info!("Starting ScreenComp");

    match cli.command {
        Commands::Sample(args) => {
            info!("Executing sample command");
            commands::sample(args)?;
        }
        Commands::Publish(args) => {
            info!("Executing publish command");
            commands::publish(args)?;
        }
    }

    info!("ScreenComp completed successfully");
    Ok(())
}
