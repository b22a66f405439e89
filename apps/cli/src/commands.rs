//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::info;

use coursetrack_core::{
    ALL_COURSES, CalendarService, ProgressReporter, RecordPatch, Session, ensure_generated,
    ingest_documents, overviews, prepare_export, sync_matches,
};
use coursetrack_services::BackendClient;
use coursetrack_shared::{
    AppConfig, DocumentUpload, ExportRequest, RecordId, init_config, load_config, require_handle,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// CourseTrack — turn syllabus PDFs into calendars and study plans.
#[derive(Parser)]
#[command(
    name = "coursetrack",
    version,
    about = "Extract assignments from syllabus documents, export calendars, generate study plans.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract assignments from syllabus documents and print them for review.
    Extract {
        /// Syllabus files to process, in upload order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the extracted records as JSON (editable, feed back via --edits).
        #[arg(long)]
        json: bool,
    },

    /// Extract, apply edits, and export a calendar file.
    Export {
        /// Syllabus files to process, in upload order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output path (defaults to the calendar name with an .ics extension).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Calendar title (defaults to the configured calendar name).
        #[arg(long)]
        calendar_name: Option<String>,

        /// JSON file of record edits: [{"id": 1, "title": "...", "included": false}, ...].
        #[arg(long)]
        edits: Option<PathBuf>,
    },

    /// Extract, apply edits, and generate per-course study plans.
    Plan {
        /// Syllabus files to process, in upload order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// JSON file of record edits.
        #[arg(long)]
        edits: Option<PathBuf>,

        /// Ask the server to regenerate plans even if it has them cached.
        #[arg(long)]
        force_regenerate: bool,
    },

    /// Find other users who uploaded the same documents.
    Match {
        /// Syllabus files to process, in upload order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Social handle to publish (defaults to the configured profile handle).
        #[arg(long)]
        handle: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "coursetrack=info",
        1 => "coursetrack=debug",
        _ => "coursetrack=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract { files, json } => cmd_extract(&files, json).await,
        Command::Export {
            files,
            out,
            calendar_name,
            edits,
        } => cmd_export(&files, out, calendar_name.as_deref(), edits.as_deref()).await,
        Command::Plan {
            files,
            edits,
            force_regenerate,
        } => cmd_plan(&files, edits.as_deref(), force_regenerate).await,
        Command::Match { files, handle } => cmd_match(&files, handle.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Read syllabus files into uploads, preserving command-line order.
fn read_uploads(files: &[PathBuf]) -> Result<Vec<DocumentUpload>> {
    files
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .ok_or_else(|| eyre!("'{}' has no file name", path.display()))?
                .to_string_lossy()
                .to_string();
            let bytes = std::fs::read(path)
                .map_err(|e| eyre!("cannot read '{}': {e}", path.display()))?;
            Ok(DocumentUpload { name, bytes })
        })
        .collect()
}

/// One entry of an `--edits` file.
#[derive(Debug, Deserialize)]
struct RecordEdit {
    id: u64,
    #[serde(flatten)]
    patch: RecordPatch,
}

/// Apply an `--edits` JSON file to the session's records.
fn apply_edits(session: &mut Session, path: &Path) -> Result<usize> {
    let content =
        std::fs::read_to_string(path).map_err(|e| eyre!("cannot read '{}': {e}", path.display()))?;
    let edits: Vec<RecordEdit> = serde_json::from_str(&content)
        .map_err(|e| eyre!("invalid edits file '{}': {e}", path.display()))?;

    for edit in &edits {
        session
            .aggregator
            .apply_override(RecordId(edit.id), &edit.patch)?;
    }

    info!(edits = edits.len(), "record edits applied");
    Ok(edits.len())
}

/// Ingest uploads and apply optional edits — the common front half of
/// export/plan/match.
async fn ingest_and_edit(
    files: &[PathBuf],
    edits: Option<&Path>,
    client: &BackendClient,
    progress: &CliProgress,
) -> Result<Session> {
    let uploads = read_uploads(files)?;
    let mut session = Session::new();

    ingest_documents(&mut session, &uploads, client, progress).await?;

    if let Some(path) = edits {
        apply_edits(&mut session, path)?;
    }

    Ok(session)
}

fn print_record_table(session: &Session) {
    println!();
    println!("  {:>4}  {:<10}  {:<12}  {:<10}  {:>5}  TITLE", "ID", "COURSE", "TYPE", "DUE", "ACC");
    for entry in session.aggregator.entries() {
        let course = coursetrack_courses::resolve_or_general(&entry.source_document);
        let due = entry
            .effective_due_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        let marker = if entry.is_low_confidence() {
            "  (low confidence)"
        } else {
            ""
        };
        let excluded = if entry.included { "" } else { "  [excluded]" };
        println!(
            "  {:>4}  {:<10}  {:<12}  {:<10}  {:>4.0}%  {}{marker}{excluded}",
            entry.id,
            course,
            entry.effective_kind().to_string(),
            due,
            entry.record.accuracy,
            entry.effective_title(),
        );
    }
    println!();
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_extract(files: &[PathBuf], json: bool) -> Result<()> {
    let config = load_config()?;
    let client = BackendClient::new(&config.backend)?;
    let progress = CliProgress::new();

    let uploads = read_uploads(files)?;
    let mut session = Session::new();
    let report = ingest_documents(&mut session, &uploads, &client, &progress).await?;
    progress.finish();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(session.aggregator.entries())?
        );
        return Ok(());
    }

    print_record_table(&session);
    println!(
        "  {} records from {} documents ({} low confidence, {} pre-cached plans) in {:.1}s",
        report.records_added,
        report.documents_processed,
        report.low_confidence,
        report.precached_plans,
        report.elapsed.as_secs_f64(),
    );
    println!();

    Ok(())
}

async fn cmd_export(
    files: &[PathBuf],
    out: Option<PathBuf>,
    calendar_name: Option<&str>,
    edits: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;
    let client = BackendClient::new(&config.backend)?;
    let progress = CliProgress::new();

    let session = ingest_and_edit(files, edits, &client, &progress).await?;
    let committed = session.aggregator.commit();

    let calendar_name = calendar_name
        .map(String::from)
        .unwrap_or_else(|| config.defaults.calendar_name.clone());

    progress.phase("Serializing calendar");
    let records = prepare_export(&committed)?;
    let artifact = client
        .export(&ExportRequest {
            calendar_name: calendar_name.clone(),
            records,
        })
        .await?;
    progress.finish();

    let out = out.unwrap_or_else(|| {
        PathBuf::from(format!("{}.ics", calendar_name.replace(char::is_whitespace, "_")))
    });
    std::fs::write(&out, &artifact).map_err(|e| eyre!("cannot write '{}': {e}", out.display()))?;

    println!();
    println!("  Calendar exported!");
    println!("  Records: {}", committed.len());
    println!("  Path:    {}", out.display());
    println!();

    Ok(())
}

async fn cmd_plan(files: &[PathBuf], edits: Option<&Path>, force_regenerate: bool) -> Result<()> {
    let config = load_config()?;
    let client = BackendClient::new(&config.backend)?;
    let progress = CliProgress::new();

    let mut session = ingest_and_edit(files, edits, &client, &progress).await?;
    let committed = session.aggregator.commit();

    progress.phase("Generating study plans");
    let force = force_regenerate || config.backend.force_regenerate;
    let report =
        ensure_generated(&mut session.plans, &committed, &client, &progress, force).await?;
    progress.finish();

    for view in overviews(&session.plans, &committed) {
        println!();
        println!("== {} ==", view.code);

        if view.code == ALL_COURSES {
            for record in &view.records {
                let due = record
                    .due_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "no date".into());
                println!("  {:<12}  {:<12}  {}", due, record.kind.to_string(), record.title);
            }
            continue;
        }

        let Some(plan) = &view.plan else {
            println!("  (no study plan)");
            continue;
        };

        println!("{}", plan.overview);
        if !plan.weekly_schedule.is_empty() {
            println!();
            for (i, week) in plan.weekly_schedule.iter().enumerate() {
                println!("  Week {}: {week}", i + 1);
            }
        }
        if !plan.study_tips.is_empty() {
            println!();
            for tip in &plan.study_tips {
                println!("  - {tip}");
            }
        }
        if !plan.resource_recommendations.is_empty() {
            println!();
            println!("{}", plan.resource_recommendations);
        }
    }

    println!();
    println!(
        "  {} plans generated, {} already cached",
        report.generated.len(),
        report.skipped.len()
    );
    println!();

    Ok(())
}

async fn cmd_match(files: &[PathBuf], handle: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let client = BackendClient::new(&config.backend)?;
    let progress = CliProgress::new();

    let handle = match handle {
        Some(h) => h.to_string(),
        None => require_handle(&config)?,
    };

    let mut session = ingest_and_edit(files, None, &client, &progress).await?;

    progress.phase("Looking for matches");
    session.matches = sync_matches(
        &session.documents,
        &handle,
        config.profile.avatar_url.as_deref(),
        &client,
        &progress,
    )
    .await;
    progress.finish();

    println!();
    for (document, entries) in &session.matches {
        println!("== {document} ==");
        if entries.is_empty() {
            println!("  no matches");
            continue;
        }
        for entry in entries {
            let you = if entry.is_self { " (you)" } else { "" };
            println!("  @{}{you}", entry.handle);
        }
    }
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn step(&self, current: usize, total: usize, detail: &str) {
        self.spinner
            .set_message(format!("[{current}/{total}] {detail}"));
    }
}
