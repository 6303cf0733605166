//! # docchat
//!
//! Chat with your own documents from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! docchat --config ./docchat.toml report.pdf notes.md
//! ```
//!
//! Files given on the command line are ingested before the prompt opens.
//! Inside the prompt, type a question or one of the `/` commands listed by
//! `/help`. Set `RUST_LOG=docchat_rag=debug` (or pass `--verbose`) for
//! pipeline logs.

mod command;
mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use docchat_rag::openai::{OpenAIChatGenerator, OpenAIEmbeddingProvider};
use docchat_rag::{Answer, AnswerOutcome, ChatSession, InMemoryVectorStore, IngestReport, Upload};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::command::{Command, HELP};
use crate::config::{Config, load_config};

#[derive(Parser, Debug)]
#[command(name = "docchat", version, about = "Chat with your documents")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Override the chat model
    #[arg(long)]
    model: Option<String>,

    /// Log pipeline activity at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Files to ingest before the first prompt
    files: Vec<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docchat_rag=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

fn build_session(config: Config, api_key: &str, model: Option<String>) -> Result<ChatSession> {
    let timeout = Duration::from_secs(config.chat.request_timeout_secs);

    let embedder = OpenAIEmbeddingProvider::new(api_key)?
        .with_model(config.openai.embedding_model)
        .with_timeout(timeout)?;
    let generator = OpenAIChatGenerator::new(api_key)?
        .with_model(model.unwrap_or(config.openai.chat_model))
        .with_temperature(config.openai.temperature)
        .with_timeout(timeout)?;

    let session = ChatSession::builder()
        .config(config.chat)
        .embedding_provider(Arc::new(embedder))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .generation_service(Arc::new(generator))
        .build()?;
    Ok(session)
}

async fn read_uploads(paths: &[PathBuf]) -> Vec<Upload> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(bytes) => uploads.push(Upload::new(display_name(path), bytes)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file");
                println!("Could not read {}: {e}", path.display());
            }
        }
    }
    uploads
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn ingest(session: &ChatSession, paths: &[PathBuf]) {
    let uploads = read_uploads(paths).await;
    if uploads.is_empty() {
        return;
    }
    print_report(&session.ingest(&uploads).await);
}

fn print_report(report: &IngestReport) {
    if report.is_nothing_to_do() {
        println!("All of these documents have already been processed.");
        return;
    }
    for name in &report.skipped {
        println!("  skipped {name} (already processed)");
    }
    for (name, error) in &report.failed {
        println!("  failed  {name}: {error}");
    }
    if !report.ingested.is_empty() {
        println!(
            "Processed {} document(s) into {} chunk(s).",
            report.ingested.len(),
            report.chunk_count
        );
    }
    if let Some(index) = &report.index {
        for (batch, error) in index.failures() {
            println!("  batch {batch} was not indexed: {error}");
        }
    }
}

fn truncation_notice(answer: &Answer) -> Option<String> {
    answer
        .truncated_to
        .map(|used| format!("(context limit reached: only {used} passage(s) were used)"))
}

async fn ask(session: &ChatSession, question: &str) {
    let answer = session.answer(question).await;
    if let Some(notice) = truncation_notice(&answer) {
        println!("{notice}");
    }
    println!("\n{}\n", answer.text);
    if answer.outcome == AnswerOutcome::Generated && !answer.sources.is_empty() {
        println!("(from {})\n", answer.sources.join(", "));
    }
}

async fn run_repl(session: &ChatSession) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to initialise line editor")?;
    println!("Ask a question about your documents. Type /help for commands.");

    loop {
        let line = match editor.readline("docchat> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        let _ = editor.add_history_entry(line.as_str());

        match command {
            Command::Ask(question) => ask(session, &question).await,
            Command::Ingest(paths) => ingest(session, &paths).await,
            Command::Files => {
                let files = session.ingested_files().await;
                if files.is_empty() {
                    println!("No documents processed yet.");
                }
                for name in files {
                    println!("  {name}");
                }
            }
            Command::Status => {
                let status = session.status().await;
                println!(
                    "{} document(s), {} indexed chunk(s), {} message(s), {} turn(s) in memory",
                    status.ingested_files,
                    status.indexed_chunks,
                    status.chat_messages,
                    status.memory_turns
                );
            }
            Command::Reset => {
                session.reset().await;
                println!("Conversation cleared.");
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Invalid(message) => println!("{message}"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    let session = build_session(config, &cli.api_key, cli.model)?;

    if !cli.files.is_empty() {
        ingest(&session, &cli.files).await;
    }
    run_repl(&session).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(truncated_to: Option<usize>) -> Answer {
        Answer {
            text: "Paris.".to_string(),
            outcome: AnswerOutcome::Generated,
            truncated_to,
            sources: vec!["A.pdf".to_string()],
        }
    }

    #[test]
    fn truncated_answer_names_the_passages_used() {
        assert_eq!(
            truncation_notice(&answer(Some(1))).as_deref(),
            Some("(context limit reached: only 1 passage(s) were used)")
        );
    }

    #[test]
    fn full_context_has_no_notice() {
        assert_eq!(truncation_notice(&answer(None)), None);
    }
}
