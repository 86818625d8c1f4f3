//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Concierge - travel-support dialog orchestrator
#[derive(Parser)]
#[command(
    name = "concierge",
    about = "Multi-assistant travel support with delegation and approval gating",
    version,
    after_help = "Logs are written to: ~/.local/share/concierge/logs/concierge.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Start an interactive support chat
    Chat {
        /// Passenger id to pin to the conversation
        #[arg(short, long)]
        passenger_id: Option<String>,

        /// Thread id to resume; a fresh one is generated when omitted
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Print the effective configuration
    Config,
}
