//! CLI for the SMS cost-guard worker.

#![allow(missing_docs, reason = "CLI binary with self-explanatory functions")]
#![allow(clippy::print_stdout, reason = "CLI output")]
#![allow(clippy::print_stderr, reason = "CLI error output")]
#![allow(clippy::absolute_paths, reason = "Explicit paths for clarity")]
#![allow(clippy::missing_errors_doc, reason = "CLI functions")]
#![allow(clippy::unwrap_used, reason = "CLI panics are acceptable")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::missing_docs_in_private_items, reason = "CLI binary")]
#![allow(clippy::single_call_fn, reason = "CLI command functions are called once from main")]

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smsguard")]
#[command(about = "SMS cost-guard pipeline worker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Starts the main and DLQ consumer loops and runs until shutdown.
    Worker,
    /// Applies pending database migrations and exits.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Worker => commands::worker::run().await?,
        Commands::Migrate => commands::migrate::run().await?,
    }

    Ok(())
}
