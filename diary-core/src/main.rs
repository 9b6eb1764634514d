// Mood Diary - terminal front-end for the journaling client core
// Entry point and command dispatch

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mood_diary::app::AppState;
use mood_diary::config::{ClientConfig, DEFAULT_API_BASE};
use mood_diary::http::TracingNotifier;
use mood_diary::models::{trimmed_len, AnalysisRequestState, AnalysisView, MoodAnalysis};
use mood_diary::services::editor::image_markdown;
use mood_diary::services::MoodAnalyzer;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "mood-diary",
    version,
    about = "Write diary entries and see their mood as you type"
)]
struct Cli {
    /// Backend location
    #[arg(long, env = "DIARY_API_BASE", default_value = DEFAULT_API_BASE)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the entry from stdin line by line, analyzing after each pause
    Write,
    /// Analyze a single entry and print the result as JSON
    Analyze {
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Upload images one after another and print their Markdown references
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mood_diary=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting mood diary against {}", cli.base_url);

    let config = ClientConfig::default()
        .with_base_url(cli.base_url)
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let state = AppState::new(config, Arc::new(TracingNotifier))
        .context("Failed to initialize client")?;

    match cli.command {
        Command::Write => run_write(&state).await,
        Command::Analyze { text, file } => run_analyze(&state, text, file).await,
        Command::Upload { files } => run_upload(&state, &files).await,
    }
}

async fn run_write(state: &AppState) -> anyhow::Result<()> {
    let mut editor = state.editor();

    let mut views = editor.subscribe();
    let printer = tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            print_view(&view);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        editor.append(&format!("{}\n", line));
        if let Some(hint) = editor.hint() {
            tracing::debug!("{} chars, {}", editor.view().char_count, hint);
        }
    }

    let view = editor.settle().await;
    tracing::debug!("Settled with {} chars", view.char_count);

    // Closing the channel lets the printer drain the final view and exit
    drop(editor);
    printer.await.context("View printer failed")?;
    Ok(())
}

async fn run_analyze(
    state: &AppState,
    text: Option<String>,
    file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let content = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("Provide the entry text or --file"),
    };

    let min_chars = state.config.min_analysis_chars;
    if trimmed_len(&content) < min_chars {
        bail!("Entry needs at least {} characters to be analyzed", min_chars);
    }

    let analysis = state.analysis_service.analyze(&content).await?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn run_upload(state: &AppState, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut progress = state.upload_service.subscribe();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let upload = *progress.borrow_and_update();
            if upload.uploading {
                eprint!("\rUploading... {:>3}%", upload.progress);
                let _ = std::io::stderr().flush();
            }
        }
    });

    let mut failed = 0;
    for path in files {
        match state.upload_service.upload_file(path).await {
            Ok(url) => {
                eprintln!();
                let alt = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("{}", image_markdown(&alt, &url));
            }
            Err(e) => {
                eprintln!();
                tracing::error!("Upload of {} failed: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    printer.abort();

    if failed > 0 {
        bail!("{} of {} uploads failed", failed, files.len());
    }
    Ok(())
}

fn print_view(view: &AnalysisView) {
    match &view.state {
        AnalysisRequestState::InFlight => eprintln!("Analyzing your mood..."),
        AnalysisRequestState::Resolved(analysis) => println!("{}", format_analysis(analysis)),
        AnalysisRequestState::Failed => eprintln!("No analysis available"),
        AnalysisRequestState::Idle | AnalysisRequestState::PendingDebounce => {}
    }
}

fn format_analysis(analysis: &MoodAnalysis) -> String {
    let keywords = analysis
        .keywords
        .iter()
        .map(|k| format!("#{}", k))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{} {} ({}% confidence) {}",
        analysis.sentiment.emoji(),
        analysis.sentiment.label(),
        analysis.confidence_percent(),
        keywords
    )
}
