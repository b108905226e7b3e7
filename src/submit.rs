//! One-shot entry points: submit once, get a rendered diagram back.
//!
//! These wrap a fresh [`DiagramSession`] for a single submission. Long-lived
//! callers (a UI that lets the user resubmit) should keep their own session
//! instead, so late responses are discarded against the newest request.

use crate::config::ClientConfig;
use crate::error::DiagramError;
use crate::model::{DiagramRequest, DiagramStats, InputMode, RenderedDiagram};
use crate::pipeline::input;
use crate::session::{DiagramSession, SubmitOutcome};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Everything one submission produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramOutput {
    pub mode: InputMode,
    pub rendered: RenderedDiagram,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<DiagramStats>,
    /// Wall-clock time from request to rendered output.
    pub duration_ms: u64,
}

/// Submit a request and render the result.
pub async fn generate(
    request: &DiagramRequest,
    config: &ClientConfig,
) -> Result<DiagramOutput, DiagramError> {
    let start = Instant::now();
    let session = DiagramSession::from_config(config)?;

    let rendered = match session.submit(request).await? {
        SubmitOutcome::Rendered(rendered) => rendered,
        SubmitOutcome::Superseded { request_id, .. } => {
            return Err(DiagramError::Internal(format!(
                "request #{request_id} was superseded inside a one-shot session"
            )));
        }
    };

    let state = session.state();
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Generated a {} from {} input in {}ms",
        rendered.kind,
        request.mode(),
        duration_ms
    );

    Ok(DiagramOutput {
        mode: request.mode(),
        rendered,
        summary: state.summary,
        stats: state.stats,
        duration_ms,
    })
}

/// Submit text and render the result.
///
/// # Example
/// ```rust,no_run
/// use blockdiagram::{generate_from_text, ClientConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::from_env()?;
/// let output = generate_from_text("A leads to B", &config).await?;
/// println!("{}", output.rendered.source);
/// # Ok(())
/// # }
/// ```
pub async fn generate_from_text(
    text: impl AsRef<str>,
    config: &ClientConfig,
) -> Result<DiagramOutput, DiagramError> {
    let text = input::validate_text(text.as_ref())?;
    generate(&DiagramRequest::Text(text.to_string()), config).await
}

/// Load a PDF from a path or URL, submit it and render the result.
pub async fn generate_from_pdf(
    input_str: impl AsRef<str>,
    config: &ClientConfig,
) -> Result<DiagramOutput, DiagramError> {
    let upload = input::resolve_pdf(input_str.as_ref(), config.download_timeout_secs).await?;
    generate(&DiagramRequest::Pdf(upload), config).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    request: &DiagramRequest,
    config: &ClientConfig,
) -> Result<DiagramOutput, DiagramError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DiagramError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(request, config))
}

/// Write rendered content to `path`.
///
/// The content goes to a temp file in the same directory first and is then
/// renamed over the target, so readers never see a half-written file.
pub fn write_output(
    rendered: &RenderedDiagram,
    path: impl AsRef<Path>,
) -> Result<(), DiagramError> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| DiagramError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir().map_err(write_err)?,
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(rendered.content.as_bytes())
        .map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} to {}", rendered.kind, path.display());
    Ok(())
}
