//! CLI module for toolrelay.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::ToolCallMode;
use clap::{Parser, Subcommand};

/// toolrelay - a tool-calling chat agent
///
/// Talks to a local or remote chat model and lets it call a calculator,
/// a weather lookup and an encyclopedia search while answering.
#[derive(Parser, Debug)]
#[command(name = "toolrelay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// How tool calls are requested (structured, text, auto)
        #[arg(long)]
        mode: Option<ToolCallMode>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// How tool calls are requested (structured, text, auto)
        #[arg(long)]
        mode: Option<ToolCallMode>,
    },

    /// List the available tools
    Tools {
        /// Print the function-calling schema as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check configuration, model endpoint and tools
    Doctor,

    /// Create the default configuration and data directory
    Init,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
