//! Configuration types for talking to the diagram backend.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. One struct holds every knob so the same config can
//! be shared between the HTTP client, the renderer and the session.

use crate::error::DiagramError;
use crate::progress::ObserverHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Environment variable overriding [`ClientConfig::base_url`].
pub const BACKEND_URL_ENV: &str = "BLOCKDIAGRAM_BACKEND_URL";

/// Mermaid 11 ES module, the build the generated HTML pages load.
pub const DEFAULT_MERMAID_CDN: &str =
    "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.esm.min.mjs";

/// Configuration for a [`crate::DiagramClient`].
///
/// # Example
/// ```rust
/// use blockdiagram::{ClientConfig, OutputFormat};
///
/// let config = ClientConfig::builder()
///     .base_url("http://diagrams.internal:5000")
///     .request_timeout_secs(90)
///     .output_format(OutputFormat::Markdown)
///     .build()
///     .unwrap();
/// assert_eq!(config.text_url(), "http://diagrams.internal:5000/api/process-text");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash. Default: `http://localhost:5000`.
    pub base_url: String,

    /// Path of the text endpoint. Default: `/api/process-text`.
    pub text_endpoint: String,

    /// Path of the PDF endpoint. Default: `/api/process-pdf`.
    pub pdf_endpoint: String,

    /// Path of the health endpoint. Default: `/health`.
    pub health_endpoint: String,

    /// Multipart field name the PDF is uploaded under. Default: `file`.
    pub file_field: String,

    /// Whole-request timeout in seconds. Default: 300.
    ///
    /// The backend runs two model calls per submission (summary, then
    /// diagram), so answers routinely take tens of seconds.
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// What the renderer produces. Default: [`OutputFormat::Html`].
    pub output_format: OutputFormat,

    /// Mermaid module URL embedded in HTML output.
    pub mermaid_cdn: String,

    /// Optional submission observer (spinners, UI hooks).
    pub observer: Option<ObserverHandle>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            text_endpoint: "/api/process-text".to_string(),
            pdf_endpoint: "/api/process-pdf".to_string(),
            health_endpoint: "/health".to_string(),
            file_field: "file".to_string(),
            request_timeout_secs: 300,
            connect_timeout_secs: 10,
            download_timeout_secs: 120,
            output_format: OutputFormat::default(),
            mermaid_cdn: DEFAULT_MERMAID_CDN.to_string(),
            observer: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("text_endpoint", &self.text_endpoint)
            .field("pdf_endpoint", &self.pdf_endpoint)
            .field("health_endpoint", &self.health_endpoint)
            .field("file_field", &self.file_field)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("output_format", &self.output_format)
            .field("mermaid_cdn", &self.mermaid_cdn)
            .field(
                "observer",
                &self.observer.as_ref().map(|_| "<dyn SubmissionObserver>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default config with the base URL taken from `BLOCKDIAGRAM_BACKEND_URL`
    /// when that variable is set and non-empty.
    pub fn from_env() -> Result<Self, DiagramError> {
        let mut builder = Self::builder();
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                builder = builder.base_url(url);
            }
        }
        builder.build()
    }

    /// Full URL of the text endpoint.
    pub fn text_url(&self) -> String {
        join_url(&self.base_url, &self.text_endpoint)
    }

    /// Full URL of the PDF endpoint.
    pub fn pdf_url(&self) -> String {
        join_url(&self.base_url, &self.pdf_endpoint)
    }

    /// Full URL of the health endpoint.
    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_endpoint)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.config.base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn text_endpoint(mut self, path: impl Into<String>) -> Self {
        self.config.text_endpoint = path.into();
        self
    }

    pub fn pdf_endpoint(mut self, path: impl Into<String>) -> Self {
        self.config.pdf_endpoint = path.into();
        self
    }

    pub fn health_endpoint(mut self, path: impl Into<String>) -> Self {
        self.config.health_endpoint = path.into();
        self
    }

    pub fn file_field(mut self, name: impl Into<String>) -> Self {
        self.config.file_field = name.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn mermaid_cdn(mut self, url: impl Into<String>) -> Self {
        self.config.mermaid_cdn = url.into();
        self
    }

    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, DiagramError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(DiagramError::InvalidConfig(format!(
                "backend URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if reqwest::Url::parse(&c.base_url).is_err() {
            return Err(DiagramError::InvalidConfig(format!(
                "backend URL '{}' is not a valid URL",
                c.base_url
            )));
        }
        if c.file_field.trim().is_empty() {
            return Err(DiagramError::InvalidConfig(
                "multipart field name must not be empty".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(DiagramError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the renderer produces from a diagram source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Standalone HTML page that renders the diagram with Mermaid in a browser. (default)
    #[default]
    Html,
    /// A fenced ```` ```mermaid ```` block, for Markdown viewers that render Mermaid.
    Markdown,
    /// The diagram source on its own.
    Raw,
}

impl OutputFormat {
    /// Conventional file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Raw => "mmd",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "raw" | "mmd" | "mermaid" => Ok(OutputFormat::Raw),
            other => Err(DiagramError::InvalidConfig(format!(
                "unknown output format '{other}' (expected html, markdown or raw)"
            ))),
        }
    }
}
