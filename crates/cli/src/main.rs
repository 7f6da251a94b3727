//! contextchat CLI entry point.
//!
//! Asks one question twice, once bare and once with context rows packed from
//! a local CSV file, and prints both answers with the prompt's token count.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod ask;

#[derive(Parser)]
#[command(
    name = "contextchat",
    about = "Ask a completion model a question with and without local CSV context",
    version,
    author
)]
struct Cli {
    /// The question to ask (e.g. "What size bags are fashionable in 2023?")
    question: String,

    /// CSV file holding the context rows
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Column of the CSV file to read rows from
    #[arg(short, long)]
    column: Option<String>,

    /// Completion model identifier
    #[arg(short, long)]
    model: Option<String>,

    /// Config file (defaults to ./contextchat.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the assembled prompt before the answers
    #[arg(long)]
    show_prompt: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries answers
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    ask::run(ask::AskArgs {
        question: cli.question,
        data: cli.data,
        column: cli.column,
        model: cli.model,
        config: cli.config,
        show_prompt: cli.show_prompt,
        json: cli.json,
    })
    .await
}
