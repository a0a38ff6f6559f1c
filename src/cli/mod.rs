//! CLI module for ScreenComp
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{PublishArgs, SampleArgs};

/// ScreenComp
///
/// Picks comparable B-frame screenshots across several encodes of the same
/// video and publishes them as a comparison block.
#[derive(Parser, Debug)]
#[command(name = "screencomp")]
#[command(about = "ScreenComp - comparison screenshots made simple")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pick comparison frames and optionally render screenshots
    Sample(SampleArgs),
    /// Upload screenshots and print the comparison block
    Publish(PublishArgs),
}
