//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use friendcal_providers::BirthdaySource;

/// friendcal - Facebook friends' birthdays as an iCalendar feed
#[derive(Debug, Parser)]
#[command(name = "friendcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "FRIENDCAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Write the calendar to this file instead of the configured path
    #[arg(long, short, conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Print the calendar to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Birthday source: graphql or async
    #[arg(long)]
    pub source: Option<BirthdaySource>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in, fetch birthdays and write the calendar (default)
    Run,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
