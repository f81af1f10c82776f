//! matric CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP chat API
//! - `ask`     — Ask a single question from the terminal
//! - `ingest`  — Embed and upload study material to the index
//! - `doctor`  — Diagnose configuration and connectivity
//! - `config`  — Inspect or initialize configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "matric",
    about = "matric — curriculum tutoring for South African learners",
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
    /// Start the HTTP chat API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question text
        question: String,

        /// Also print the sources the answer drew on
        #[arg(short, long)]
        sources: bool,
    },

    /// Embed .txt study material and upsert it into the vector index
    Ingest {
        /// Directory to scan recursively for .txt files
        dir: std::path::PathBuf,

        /// Curriculum tag for every uploaded chunk
        #[arg(long, default_value = "caps")]
        curriculum: String,

        /// Grade tag for every uploaded chunk
        #[arg(long, default_value = "grade12")]
        grade: String,

        /// Subject tag for every uploaded chunk
        #[arg(long, default_value = "life-science")]
        subject: String,

        /// Maximum characters per chunk
        #[arg(long, default_value_t = 2000)]
        chunk_chars: usize,
    },

    /// Diagnose configuration and service connectivity
    Doctor,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init,
    /// Print the loaded configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
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
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask { question, sources } => commands::ask::run(&question, sources).await?,
        Commands::Ingest {
            dir,
            curriculum,
            grade,
            subject,
            chunk_chars,
        } => commands::ingest::run(&dir, &curriculum, &grade, &subject, chunk_chars).await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Init => commands::config_cmd::init().await?,
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
    }

    Ok(())
}
