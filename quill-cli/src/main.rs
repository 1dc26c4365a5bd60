//! quill — type study notes, summarize them through a local model, browse past sessions
//!
//! # Subcommands
//! - `summarize [TEXT] [--file PATH]` — new session from TEXT, a file, or stdin
//! - `list [--json]`                  — past sessions
//! - `show <SESSION> [--summary]`     — print a session's raw notes or summary
//! - `edit`                           — interactive editor with session preview

mod editor;

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use quill_core::config::DEFAULT_CONFIG_FILE;
use quill_core::{
    Artifact, ArtifactLoader, CommandDocumentReader, CommandPipeline, QuillConfig, Session,
    SessionStore, StoreLoader, Summarizer, SummaryOutcome,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "quill", version, about = "Study note summarizer with session history")]
struct Cli {
    /// Config file (TOML). Without it, ./quill.toml is used if present, else built-in defaults
    #[arg(short, long, env = "QUILL_CONFIG", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Save notes as a new session and summarize them
    Summarize {
        /// Notes text; read from stdin when neither TEXT nor --file is given
        text: Option<String>,

        /// Read notes from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// List past sessions
    List {
        /// Output as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print a session's raw notes, or its summary with --summary
    Show {
        /// Folder name or 1-based position from `list`
        session: String,

        #[arg(long)]
        summary: bool,
    },

    /// Interactive editor
    Edit,
}

// ============================================================================
// Wiring
// ============================================================================

pub(crate) struct App {
    pub summarizer: Summarizer,
    pub loader: StoreLoader,
}

impl App {
    pub(crate) fn from_config(config: &QuillConfig) -> anyhow::Result<Self> {
        let root = config.storage.resolve_root()?;
        tracing::debug!(root = %root.display(), "Sessions root");
        let store = SessionStore::new(root).with_order(config.storage.order);
        let summarizer = Summarizer::new(
            store.clone(),
            Arc::new(CommandPipeline::from_config(config)),
        );
        let loader = StoreLoader::new(
            store,
            Arc::new(CommandDocumentReader::new(config.converter.clone())),
        );
        Ok(Self { summarizer, loader })
    }

    pub fn store(&self) -> &SessionStore {
        self.summarizer.store()
    }

    /// Run summarization; Ctrl+C cancels the external commands.
    pub async fn summarize(&self, text: &str) -> quill_core::Result<SummaryOutcome> {
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling summarization");
                on_interrupt.cancel();
            }
        });

        let result = self.summarizer.summarize(text, &cancel).await;
        watcher.abort();
        result
    }
}

// ============================================================================
// Session listing
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct SessionRow {
    pub index: usize,
    pub folder: String,
    pub path: PathBuf,
    pub raw_notes: bool,
    pub summary: bool,
}

pub(crate) fn session_rows(sessions: &[Session]) -> Vec<SessionRow> {
    sessions
        .iter()
        .enumerate()
        .map(|(i, s)| SessionRow {
            index: i + 1,
            folder: s.folder_name.clone(),
            path: s.path.clone(),
            raw_notes: s.has(Artifact::RawNotes),
            summary: s.has(Artifact::Summary),
        })
        .collect()
}

pub(crate) fn write_sessions(out: &mut impl Write, sessions: &[Session]) -> std::io::Result<()> {
    if sessions.is_empty() {
        return writeln!(out, "No sessions yet.");
    }
    for row in session_rows(sessions) {
        let summary = if row.summary { "" } else { "  (no summary)" };
        writeln!(out, "{:>3}  {}{}", row.index, row.folder, summary)?;
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

async fn do_summarize(app: &App, text: Option<String>, file: Option<PathBuf>) -> anyhow::Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let outcome = app.summarize(&text).await?;
    println!("Summary saved to:\n{}", outcome.summary_path.display());
    Ok(())
}

fn do_list(app: &App, json: bool) -> anyhow::Result<()> {
    let sessions = app.store().list_sessions()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&session_rows(&sessions))?);
    } else {
        write_sessions(&mut std::io::stdout().lock(), &sessions)?;
    }
    Ok(())
}

async fn do_show(app: &App, selector: &str, summary: bool) -> anyhow::Result<()> {
    let session = app.store().select(selector)?;
    let artifact = if summary {
        Artifact::Summary
    } else {
        Artifact::RawNotes
    };
    let text = app.loader.load(&session, artifact).await?;
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match QuillConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            let path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
            eprintln!("quill: failed to load config from {}: {}", path, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let result = match App::from_config(&config) {
        Ok(app) => match cli.command {
            Commands::Summarize { text, file } => do_summarize(&app, text, file).await,
            Commands::List { json } => do_list(&app, json),
            Commands::Show { session, summary } => do_show(&app, &session, summary).await,
            Commands::Edit => editor::run(&app).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("quill: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
