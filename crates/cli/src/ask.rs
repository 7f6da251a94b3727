//! `contextchat <QUESTION>`: answer one question with and without context.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use contextchat_agent::{QueryResult, Session};
use contextchat_config::{API_KEY_ENV, AppConfig};
use contextchat_core::completion::CompletionClient;
use contextchat_core::error::Error;
use contextchat_providers::OpenAiCompletionClient;
use tracing::debug;

/// Parsed command-line options for one run.
pub struct AskArgs {
    pub question: String,
    pub data: Option<PathBuf>,
    pub column: Option<String>,
    pub model: Option<String>,
    pub config: Option<PathBuf>,
    pub show_prompt: bool,
    pub json: bool,
}

/// Run one question end to end.
///
/// Every failure is reported on stderr before returning, so callers only
/// need the exit code.
pub async fn run(args: AskArgs) -> ExitCode {
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            print_startup_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let session = match Session::start(&config, |cfg, key| {
        let client = OpenAiCompletionClient::from_config(cfg, key)?;
        Ok(Arc::new(client) as Arc<dyn CompletionClient>)
    }) {
        Ok(session) => session,
        Err(e) => {
            print_startup_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let orchestrator = session.orchestrator();
    if args.show_prompt && !args.json {
        let prepared = orchestrator.prepare(&args.question);
        println!(
            "\n--- Prompt ({} tokens, {}/{} rows) ---",
            prepared.token_count, prepared.rows_included, prepared.rows_total
        );
        println!("{}", prepared.prompt);
        println!("--- End prompt ---");
    }

    let result = orchestrator.answer(&args.question).await;

    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("  Failed to encode result as JSON: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", render_report(&result));
    }

    if result.degraded {
        eprintln!("\n  The completion request failed. Run with --verbose for details.");
    }

    ExitCode::SUCCESS
}

/// Config file + environment, then command-line overrides on top.
fn load_config(args: &AskArgs) -> Result<AppConfig, Error> {
    let mut config = AppConfig::load(args.config.as_deref())?;

    if let Some(path) = &args.data {
        config.data.path = path.clone();
    }
    if let Some(column) = &args.column {
        config.data.column = column.clone();
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }

    config.validate()?;
    debug!(
        data = %config.data.path.display(),
        column = %config.data.column,
        model = %config.model,
        "Configuration loaded"
    );
    Ok(config)
}

fn print_startup_error(e: &Error) {
    eprintln!();
    if e.is_configuration() {
        eprintln!("  Initialization Error: {e}");
    } else {
        eprintln!("  An unexpected error occurred: {e}");
    }
    eprintln!();
    for line in remediation(e) {
        eprintln!("  {line}");
    }
    eprintln!();
}

/// What the user can do about a startup error.
fn remediation(e: &Error) -> Vec<String> {
    match e {
        Error::Config { message } if message.contains(API_KEY_ENV) => vec![
            format!("Set {API_KEY_ENV} in your environment, or add it to a .env file:"),
            format!("    {API_KEY_ENV}=sk-..."),
        ],
        Error::Config { .. } | Error::Template { .. } => vec![
            "Check contextchat.toml (or the file passed with --config).".into(),
        ],
        Error::Corpus { .. } => vec![
            "Point --data at a CSV file with a header row and pick the".into(),
            "text column with --column (default: Trends).".into(),
        ],
        Error::Provider(_) | Error::Tokenizer(_) => vec![
            "Please ensure your data file and API key are correctly configured.".into(),
        ],
    }
}

/// The human-readable answer block.
fn render_report(result: &QueryResult) -> String {
    format!(
        "\nUser Query: {}\n\nAnswer Without Context:\n {}\n\nAnswer With Context:\n {}\n\n[Tokens Used: {}]\n",
        result.question, result.bare_answer, result.augmented_answer, result.token_count
    )
}
