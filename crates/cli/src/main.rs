//! Lariat CLI entry point.
//!
//! Commands:
//! - `init`    : Write a default config file
//! - `ask`     : Send a single prompt and print the answer
//! - `chat`    : Interactive conversation mode
//! - `status`  : Show the effective configuration

use clap::{Parser, Subcommand};

mod commands;
mod history;
mod runtime;
mod sink;

#[derive(Parser)]
#[command(
    name = "lariat",
    about = "Lariat, an agentic chat client",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file to ~/.lariat/config.toml
    Init,

    /// Send a single prompt and print the final answer
    Ask {
        /// The prompt text
        prompt: String,

        /// Model target name from the config (defaults to [model].default)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start an interactive conversation
    Chat {
        /// Model target name from the config (defaults to [model].default)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with streamed answers.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Ask { prompt, model } => commands::ask::run(prompt, model).await?,
        Commands::Chat { model } => commands::chat::run(model).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
