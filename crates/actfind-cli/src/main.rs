use actfind::core::{
    find, present, DocumentConfig, Error, Progress, Query, SearchConfig, DEFAULT_PDF_FILE_NAME,
    DEFAULT_PDF_URL,
};
use actfind::local::{prepare_document, DocumentCache, HttpFetcher};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod render;

use render::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "actfind")]
#[command(
    about = "Search the Income Tax Act PDF by keyword or section number",
    long_about = None
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    // Searching is the default when no subcommand is given.
    #[command(flatten)]
    search: SearchCmd,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the document and show each match with surrounding paragraphs.
    Search(SearchCmd),
    /// Download the document into the local cache if it is missing, then exit.
    Fetch(FetchCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug, Clone)]
struct DocumentArgs {
    /// Source PDF URL.
    #[arg(long, env = "ACTFIND_PDF_URL", default_value = DEFAULT_PDF_URL)]
    pdf_url: String,
    /// Local path of the cached PDF (default: <user cache dir>/actfind/income-tax-act-1961.pdf).
    #[arg(long, env = "ACTFIND_PDF_PATH")]
    pdf_path: Option<PathBuf>,
    /// Bounded wait for the download, in milliseconds.
    #[arg(long, env = "ACTFIND_TIMEOUT_MS", default_value_t = DocumentConfig::DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Downloads larger than this many bytes are rejected and never cached.
    #[arg(long, env = "ACTFIND_MAX_BYTES", default_value_t = DocumentConfig::DEFAULT_MAX_BYTES)]
    max_bytes: u64,
}

impl DocumentArgs {
    fn to_config(&self) -> DocumentConfig {
        let local_path = self.pdf_path.clone().unwrap_or_else(default_pdf_path);
        let mut doc = DocumentConfig::new(self.pdf_url.clone(), local_path);
        doc.timeout_ms = self.timeout_ms;
        doc.max_bytes = self.max_bytes;
        doc
    }
}

#[derive(clap::Args, Debug, Clone)]
struct SearchCmd {
    #[command(flatten)]
    doc: DocumentArgs,
    /// Keyword or section number (e.g. 80C, salary). Prompts on stdin when omitted.
    #[arg(long, short = 'q')]
    query: Option<String>,
    /// Paragraphs of context shown before and after each match.
    #[arg(long, env = "ACTFIND_CONTEXT", default_value_t = 1)]
    context: usize,
    /// Print a progress line every N extracted pages (0 disables).
    #[arg(long, default_value_t = 50)]
    progress_every: usize,
    /// Output format: text|json
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
}

impl SearchCmd {
    fn to_config(&self) -> SearchConfig {
        SearchConfig {
            document: self.doc.to_config(),
            context_radius: self.context,
        }
    }
}

#[derive(clap::Args, Debug)]
struct FetchCmd {
    #[command(flatten)]
    doc: DocumentArgs,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn default_pdf_path() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("actfind"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_PDF_FILE_NAME)
}

/// Progress lines on stderr; stdout is reserved for results.
struct ConsoleProgress {
    every: usize,
}

impl Progress for ConsoleProgress {
    fn already_cached(&self, path: &Path) {
        eprintln!("PDF already exists: {}", path.display());
    }

    fn download_started(&self, _url: &str) {
        eprintln!("Downloading PDF... This may take a little time.");
    }

    fn download_finished(&self, path: &Path, _bytes: usize) {
        eprintln!("Download complete: {}", path.display());
    }

    fn extraction_started(&self, _path: &Path) {
        eprintln!("Extracting text from PDF...");
    }

    fn page_extracted(&self, page_number: usize, _total_pages: usize) {
        if self.every > 0 && page_number % self.every == 0 {
            eprintln!("  Processed {page_number} pages...");
        }
    }

    fn extraction_finished(&self, _total_pages: usize) {
        eprintln!("Text extraction complete.");
    }
}

/// Load `KEY=VALUE` lines from `ACTFIND_ENV_FILE` (opt-in).
///
/// Never overrides variables already set in the process environment.
fn load_env_file() {
    let Ok(p) = std::env::var("ACTFIND_ENV_FILE") else {
        return;
    };
    let p = p.trim();
    if p.is_empty() {
        return;
    }
    let Ok(txt) = std::fs::read_to_string(p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v.trim());
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn prompt_query(format: OutputFormat) -> Result<String> {
    const PROMPT: &str =
        "\nEnter a keyword or section number to search (example: 80C, salary, deduction): ";
    // Keep stdout parseable in json mode.
    match format {
        OutputFormat::Text => {
            let mut out = std::io::stdout().lock();
            write!(out, "{PROMPT}")
                .and_then(|()| out.flush())
                .map_err(render::output_error)?;
        }
        OutputFormat::Json => {
            eprint!("{PROMPT}");
        }
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| Error::Io(format!("reading query from stdin: {e}")))?;
    Ok(line)
}

async fn run_search(args: SearchCmd) -> Result<()> {
    let format = OutputFormat::parse(&args.output)?;
    let cfg = args.to_config();
    // A query given up front is validated before any download work.
    let preset = args.query.as_deref().map(Query::parse).transpose()?;

    let fetcher = HttpFetcher::new()?;
    let progress = ConsoleProgress {
        every: args.progress_every,
    };
    let paragraphs = prepare_document(&cfg.document, &fetcher, &progress).await?;

    if paragraphs.is_empty() {
        let mut out = std::io::stdout().lock();
        match format {
            OutputFormat::Text => {
                render::write_line(&mut out, "Could not extract readable text from the PDF.")?
            }
            OutputFormat::Json => render::write_line(&mut out, render::no_content_json())?,
        }
        return Ok(());
    }

    let query = match preset {
        Some(q) => q,
        None => Query::parse(&prompt_query(format)?)?,
    };
    let hits = find(&paragraphs, &query);
    let shown = present(&paragraphs, &hits, cfg.context_radius);
    tracing::debug!(query = query.as_str(), matches = hits.len(), "search complete");

    let mut out = std::io::stdout().lock();
    match format {
        OutputFormat::Text => render::write_text(&mut out, &shown)?,
        OutputFormat::Json => render::write_line(
            &mut out,
            render::search_json(&query, paragraphs.len(), &hits, &shown),
        )?,
    }
    Ok(())
}

async fn run_fetch(args: FetchCmd) -> Result<()> {
    let doc = args.doc.to_config();
    let fetcher = HttpFetcher::new()?;
    let progress = ConsoleProgress { every: 0 };
    let outcome = DocumentCache::new(&fetcher, &progress).ensure(&doc).await?;
    tracing::debug!(?outcome, "fetch complete");
    render::write_line(&mut std::io::stdout().lock(), doc.local_path.display())?;
    Ok(())
}

fn run_version(args: VersionCmd) -> Result<()> {
    let v = serde_json::json!({
        "schema_version": 1,
        "kind": "version",
        "ok": true,
        "name": "actfind",
        "version": env!("CARGO_PKG_VERSION"),
    });
    let mut out = std::io::stdout().lock();
    match args.output.to_ascii_lowercase().as_str() {
        "text" => render::write_line(&mut out, format!("actfind {}", env!("CARGO_PKG_VERSION")))?,
        _ => render::write_line(&mut out, v)?,
    }
    Ok(())
}

/// Map any failure onto the closed error set; anything else is an internal error.
fn classify(e: anyhow::Error) -> Error {
    match e.downcast::<Error>() {
        Ok(known) => known,
        Err(other) => Error::Internal(format!("{other:#}")),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    load_env_file();
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Some(Commands::Search(args)) => run_search(args).await,
        Some(Commands::Fetch(args)) => run_fetch(args).await,
        Some(Commands::Version(args)) => run_version(args),
        None => run_search(cli.search).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let err = classify(e);
            tracing::debug!(kind = err.kind(), "run failed");
            eprintln!("{err}");
            match err {
                Error::Input(_) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}
