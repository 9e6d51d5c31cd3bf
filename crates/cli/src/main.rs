//! Verbatim CLI — the main entry point.
//!
//! Commands:
//! - `serve` — Load the transcript and start the HTTP gateway
//! - `ask`   — Answer a single question from the command line

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "verbatim",
    about = "Verbatim — verbatim question answering over a chat transcript",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "verbatim.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer one question and exit
    Ask {
        /// The question to answer
        question: String,

        /// Print the full answer as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(&cli.config, port).await?,
        Commands::Ask { question, json } => commands::ask::run(&cli.config, &question, json).await?,
    }

    Ok(())
}
