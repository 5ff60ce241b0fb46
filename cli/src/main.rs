//! # concierge CLI
//!
//! Command-line interface for concierge - the tool-calling pipeline of a
//! streaming LLM concierge backend.
//!
//! ## Usage
//!
//! - `concierge tools` - Show registered tools
//! - `concierge call <tool> --args '<json>'` - Execute a single tool call
//! - `concierge replay <file.jsonl>` - Normalize a recorded chunk transcript

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::{call_command, replay_command, tools_command};
use config::CliConfigLoader;

/// concierge - Tool-calling pipeline for a streaming LLM concierge
#[derive(Parser)]
#[command(name = "concierge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect tools, run sandboxed queries and replay chunk transcripts")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the CSV data files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show available tools
    Tools,

    /// Execute one tool call and print its result
    Call {
        /// Registered tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },

    /// Replay a JSON-lines chunk transcript
    Replay {
        /// Transcript file, one raw chunk per line
        file: PathBuf,

        /// Print envelopes as JSON lines
        #[arg(long)]
        json: bool,
    },
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(data_dir) = &cli.data_dir {
        loader = loader.with_data_dir_override(data_dir.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    concierge_core::init_tracing_with_debug(cli.verbose);

    let config_loader = build_config_loader(&cli);

    match cli.command {
        Commands::Tools => tools_command(config_loader).await,
        Commands::Call { tool, args } => call_command(config_loader, tool, args).await,
        Commands::Replay { file, json } => replay_command(config_loader, file, json).await,
    }
}
