//! CLI binary for blockdiagram.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ClientConfig`, submits once and prints the result.

use anyhow::{Context, Result};
use blockdiagram::{
    generate, pipeline::input, write_output, ClientConfig, DiagramClient, DiagramError,
    DiagramKind, DiagramRequest, InputMode, ObserverHandle, OutputFormat, SubmissionObserver,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner shown while the backend works. The backend gives no progress of
/// its own, so all we can show is elapsed time.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        Arc::new(Self { bar })
    }
}

impl SubmissionObserver for CliObserver {
    fn on_submit_start(&self, _request_id: u64, mode: InputMode) {
        self.bar.set_prefix("Generating");
        self.bar.set_message(match mode {
            InputMode::Text => "summarising text and drawing the diagram…",
            InputMode::Pdf => "extracting the PDF and drawing the diagram…",
        });
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_rendered(&self, _request_id: u64, kind: DiagramKind, source_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&kind.to_string()),
            dim(&format!("{source_len} chars"))
        );
    }

    fn on_failed(&self, _request_id: u64, _error: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Diagram from a sentence (HTML page on stdout)
  blockdiagram --text "Alice meets Bob. Bob leaves town." > story.html

  # Diagram from a PDF, written to a file
  blockdiagram story.pdf -o story.html

  # PDF from a URL, Markdown output
  blockdiagram https://example.com/paper.pdf --format markdown -o paper.md

  # Text from stdin, raw Mermaid source
  cat notes.txt | blockdiagram --text-file - --format raw

  # Full backend response as JSON (summary + stats included)
  blockdiagram --text "A leads to B" --json

  # Is the backend up?
  blockdiagram --health

OUTPUT FORMATS:
  html      Standalone page; open it in a browser and Mermaid draws the diagram
  markdown  ```mermaid fenced block for Markdown viewers with Mermaid support
  raw       The Mermaid source only

ENVIRONMENT VARIABLES:
  BLOCKDIAGRAM_BACKEND_URL  Backend base URL (default http://localhost:5000)
  RUST_LOG                  Override the log filter (e.g. blockdiagram=debug)
"#;

/// Turn text or PDF documents into Mermaid diagrams.
#[derive(Parser, Debug)]
#[command(
    name = "blockdiagram",
    version,
    about = "Turn text or PDF documents into Mermaid diagrams",
    long_about = "Send text or a PDF to a diagram-generation backend and render the Mermaid \
diagram it returns as an HTML page, a Markdown block, or raw Mermaid source.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(conflicts_with_all = ["text", "text_file"])]
    input: Option<String>,

    /// Text to turn into a diagram.
    #[arg(short, long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Read the text from a file ("-" for stdin).
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Write the rendered output to this file instead of stdout.
    #[arg(short, long, env = "BLOCKDIAGRAM_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(long, env = "BLOCKDIAGRAM_FORMAT", value_enum, default_value = "html")]
    format: FormatArg,

    /// Backend base URL.
    #[arg(
        long,
        env = "BLOCKDIAGRAM_BACKEND_URL",
        default_value = blockdiagram::config::DEFAULT_BACKEND_URL
    )]
    backend_url: String,

    /// Mermaid ES module URL embedded in HTML output.
    #[arg(long, env = "BLOCKDIAGRAM_MERMAID_CDN", default_value = blockdiagram::config::DEFAULT_MERMAID_CDN)]
    mermaid_cdn: String,

    /// Request timeout in seconds.
    #[arg(long, env = "BLOCKDIAGRAM_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Connect timeout in seconds.
    #[arg(long, env = "BLOCKDIAGRAM_CONNECT_TIMEOUT", default_value_t = 10)]
    connect_timeout: u64,

    /// HTTP download timeout in seconds for PDF URLs.
    #[arg(long, env = "BLOCKDIAGRAM_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the full result (diagram, summary, stats) as JSON.
    #[arg(long, env = "BLOCKDIAGRAM_JSON")]
    json: bool,

    /// Check the backend's health endpoint and exit.
    #[arg(long, conflicts_with_all = ["input", "text", "text_file"])]
    health: bool,

    /// Disable the spinner.
    #[arg(long, env = "BLOCKDIAGRAM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BLOCKDIAGRAM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BLOCKDIAGRAM_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Html,
    Markdown,
    Raw,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Raw => OutputFormat::Raw,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers the only interesting wait; INFO logs would just
    // break its line.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.health;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let observer: Option<ObserverHandle> = if show_progress {
        Some(CliObserver::new() as Arc<dyn SubmissionObserver>)
    } else {
        None
    };
    let config = build_config(&cli, observer)?;

    // ── Health check ─────────────────────────────────────────────────────
    if cli.health {
        let client = DiagramClient::new(config)?;
        let health = client.health().await.context("Health check failed")?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&health)?);
        } else if health.is_healthy() {
            println!("{} backend is {}", green("✔"), health.status);
        } else {
            println!("{} backend reports '{}'", red("✘"), health.status);
        }
        if !health.is_healthy() {
            std::process::exit(1);
        }
        return Ok(());
    }

    // ── Submit ───────────────────────────────────────────────────────────
    let request = build_request(&cli, &config).await?;

    let output = match generate(&request, &config).await {
        Ok(output) => output,
        Err(e) => {
            report_error(&e);
            return Err(e).context("Diagram generation failed");
        }
    };

    // ── Output ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if let Some(ref path) = cli.output {
        write_output(&output.rendered, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  {}  {}ms  →  {}",
                green("✔"),
                output.rendered.kind,
                output.duration_ms,
                bold(&path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.rendered.content.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.rendered.content.ends_with('\n') {
            handle
                .write_all(b"\n")
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, observer: Option<ObserverHandle>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .base_url(&cli.backend_url)
        .request_timeout_secs(cli.timeout)
        .connect_timeout_secs(cli.connect_timeout)
        .download_timeout_secs(cli.download_timeout)
        .output_format(cli.format.clone().into())
        .mermaid_cdn(&cli.mermaid_cdn);

    if let Some(o) = observer {
        builder = builder.observer(o);
    }

    builder.build().context("Invalid configuration")
}

/// Turn the input flags into one request.
async fn build_request(cli: &Cli, config: &ClientConfig) -> Result<DiagramRequest> {
    if let Some(ref text) = cli.text {
        return Ok(DiagramRequest::Text(text.clone()));
    }

    if let Some(ref path) = cli.text_file {
        let text = if path.as_os_str() == "-" {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        } else {
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read text from {:?}", path))?
        };
        return Ok(DiagramRequest::Text(text));
    }

    if let Some(ref input_str) = cli.input {
        let upload = input::resolve_pdf(input_str, config.download_timeout_secs)
            .await
            .context("Failed to load PDF")?;
        return Ok(DiagramRequest::Pdf(upload));
    }

    anyhow::bail!("Nothing to submit: pass a PDF path/URL, --text or --text-file")
}

/// Extra context for errors the plain message does not cover.
fn report_error(e: &DiagramError) {
    if let Some(source) = e.source_code() {
        eprintln!("{}", red("The backend returned this diagram source:"));
        for line in source.lines() {
            eprintln!("  {}", dim(line));
        }
    }
}
