use clap::Parser;

use crate::config::DEFAULT_MODEL;

/// Use Google's Gemini models from the command line.
#[derive(Debug, Parser)]
#[command(
    name = "gemcli",
    version,
    about,
    after_help = "Examples:\n  \
        gemcli --interactive                    # Start interactive chat mode\n  \
        gemcli --query \"What is Rust?\"          # Single query\n  \
        gemcli -q \"Explain AI\" -m gemini-pro    # Query with a specific model"
)]
pub struct Cli {
    /// Start interactive chat mode
    #[arg(short, long)]
    pub interactive: bool,

    /// Send a single query and exit
    #[arg(short, long, value_name = "MSG")]
    pub query: Option<String>,

    /// Gemini model to use
    #[arg(short, long, value_name = "NAME", help = format!("Gemini model to use (default: {DEFAULT_MODEL})"))]
    pub model: Option<String>,

    /// API key (overrides the GEMINI_API_KEY environment variable)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
}
