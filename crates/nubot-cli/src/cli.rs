//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "NUBOT_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute. Defaults to `ask` reading from stdin.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a question. Reads one line from stdin when QUERY is absent.
    Ask {
        /// The question to answer.
        query: Option<String>,
    },

    /// Start the HTTP query service.
    Serve {
        /// Port to listen on (overrides the configured port).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print version information.
    Version,
}

// ============================================================================
// Tests
// ============================================================================
