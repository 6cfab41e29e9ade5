//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for parley
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about = "Tool-routing chat assistant for local LLMs")]
#[command(long_about = r#"
Parley is a chat assistant that routes each message either to a built-in tool
(math, tasks, date and time, weather) or to plain conversation with a local
Ollama model.

Each message goes through up to three model calls:
1. Routing: the model picks a tool, or none
2. Extraction: the model fills in the tool's arguments
3. Finalize: the model phrases the tool's result as a reply

Configuration files are loaded from (in priority order):
1. PARLEY_* environment variables    (e.g. PARLEY_BACKEND__MODEL=llama3.1)
2. --config <path>                   Explicit config file
3. ./parley.toml or ./.parley.toml   Project-level config
4. ~/.config/parley/config.toml      Global config

Example:
  parley "What is 12 times 7?"
  parley -c work "add a task: send the invoice"
  parley --model llama3.1:8b
"#)]
pub struct Cli {
    /// Message to send; starts the interactive chat when omitted
    pub message: Option<String>,

    /// Conversation id (defaults to the configured REPL conversation)
    #[arg(short, long, value_name = "ID")]
    pub conversation: Option<String>,

    /// Ollama model to use instead of the configured one
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Print the whole reply at once instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
