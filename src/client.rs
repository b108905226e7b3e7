//! HTTP client for the diagram backend.
//!
//! [`DiagramClient`] turns one user action into one request:
//!
//! | Input | Request |
//! |-------|---------|
//! | text  | `POST {base}/api/process-text`, JSON `{"text": ...}` |
//! | PDF   | `POST {base}/api/process-pdf`, multipart field `file` |
//!
//! and one response into a [`DiagramSource`]. Nothing is retried: a failed
//! submission is reported and the user decides whether to submit again.
//!
//! The raw exchange (request in, decoded [`DiagramResponse`] out) sits behind
//! the [`DiagramBackend`] trait so [`crate::session::DiagramSession`] can be
//! driven by a fake backend in tests.

use crate::config::ClientConfig;
use crate::error::DiagramError;
use crate::model::{
    DiagramResponse, DiagramSource, ErrorBody, HealthStatus, InputMode, PdfUpload,
    RenderedDiagram, TextPayload,
};
use crate::pipeline::render::{DiagramRenderer, MermaidRenderer};
use crate::pipeline::{extract, input};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest backend error text carried into a [`DiagramError::Server`].
const MAX_ERROR_TEXT: usize = 200;

/// One request/response exchange with a diagram backend.
#[async_trait]
pub trait DiagramBackend: Send + Sync {
    /// Submit text and return the decoded success body.
    async fn process_text(&self, text: &str) -> Result<DiagramResponse, DiagramError>;

    /// Upload a PDF and return the decoded success body.
    async fn process_pdf(&self, upload: &PdfUpload) -> Result<DiagramResponse, DiagramError>;
}

/// Client for the text and PDF endpoints.
#[derive(Debug, Clone)]
pub struct DiagramClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl DiagramClient {
    /// Build a client with its own connection pool and the configured timeouts.
    pub fn new(config: ClientConfig) -> Result<Self, DiagramError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("blockdiagram/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DiagramError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit text and return the diagram source the backend generated.
    pub async fn submit_text(&self, text: &str) -> Result<DiagramSource, DiagramError> {
        let response = self.process_text(text).await?;
        extract::display_source(&response)
    }

    /// Upload a PDF and return the diagram source the backend generated.
    pub async fn submit_file(&self, upload: &PdfUpload) -> Result<DiagramSource, DiagramError> {
        let response = self.process_pdf(upload).await?;
        extract::display_source(&response)
    }

    /// Load a PDF from a path or URL, then [`submit_file`](Self::submit_file) it.
    pub async fn submit_pdf(&self, input: &str) -> Result<DiagramSource, DiagramError> {
        let upload = input::resolve_pdf(input, self.config.download_timeout_secs).await?;
        self.submit_file(&upload).await
    }

    /// Render a source with the configured output format.
    pub fn render(&self, source: &DiagramSource) -> Result<RenderedDiagram, DiagramError> {
        MermaidRenderer::from_config(&self.config).render(source)
    }

    /// Query `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, DiagramError> {
        let url = self.config.health_url();
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        if !status.is_success() {
            return Err(DiagramError::Server {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_slice(&body).map_err(|e| DiagramError::MalformedResponse {
            detail: format!("health body is not {{\"status\": ...}} ({e})"),
        })
    }

    async fn send(
        &self,
        mode: InputMode,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<DiagramResponse, DiagramError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        debug!("{} endpoint answered HTTP {} ({} bytes)", mode, status, body.len());

        if !status.is_success() {
            let err = server_error(mode, status.as_u16(), &body);
            warn!("{} submission failed: {}", mode, err);
            return Err(err);
        }

        extract::decode_body(&body)
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> DiagramError {
        if e.is_timeout() {
            self.timeout_error(url, e.is_connect())
        } else {
            DiagramError::Network {
                endpoint: url.to_string(),
                reason: error_chain(&e),
            }
        }
    }

    /// Name the timeout that actually fired so the hint points at the right flag.
    fn timeout_error(&self, url: &str, during_connect: bool) -> DiagramError {
        let endpoint = url.to_string();
        if during_connect {
            DiagramError::ConnectTimeout {
                endpoint,
                secs: self.config.connect_timeout_secs,
            }
        } else {
            DiagramError::Timeout {
                endpoint,
                secs: self.config.request_timeout_secs,
            }
        }
    }
}

#[async_trait]
impl DiagramBackend for DiagramClient {
    async fn process_text(&self, text: &str) -> Result<DiagramResponse, DiagramError> {
        let text = input::validate_text(text)?;
        let url = self.config.text_url();
        info!("Submitting {} chars of text to {}", text.chars().count(), url);

        let request = self.http.post(&url).json(&TextPayload { text });
        self.send(InputMode::Text, &url, request).await
    }

    async fn process_pdf(&self, upload: &PdfUpload) -> Result<DiagramResponse, DiagramError> {
        let url = self.config.pdf_url();
        info!(
            "Uploading '{}' ({} bytes) to {}",
            upload.file_name,
            upload.len(),
            url
        );

        let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str("application/pdf")
            .map_err(|e| DiagramError::Internal(format!("Invalid multipart MIME type: {e}")))?;
        let form = reqwest::multipart::Form::new().part(self.config.file_field.clone(), part);

        let request = self.http.post(&url).multipart(form);
        self.send(InputMode::Pdf, &url, request).await
    }
}

/// Map a non-2xx answer to the error taxonomy.
///
/// The PDF endpoint answers a wrong file type with 400 and a message naming
/// PDF; 415 means the same thing from a stricter server.
fn server_error(mode: InputMode, status: u16, body: &[u8]) -> DiagramError {
    let message = error_message(body);
    let mentions_pdf = message
        .as_deref()
        .is_some_and(|m| m.to_lowercase().contains("pdf"));

    if mode == InputMode::Pdf && (status == 415 || (status == 400 && mentions_pdf)) {
        DiagramError::UnsupportedFile { status, message }
    } else {
        DiagramError::Server { status, message }
    }
}

/// Best human-readable message in an error body: the JSON `error` field,
/// then `message`, then the body text itself.
fn error_message(body: &[u8]) -> Option<String> {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        let non_blank = |m: Option<String>| m.filter(|m| !m.trim().is_empty());
        if let Some(m) = non_blank(parsed.error).or_else(|| non_blank(parsed.message)) {
            return Some(m.trim().to_string());
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() || text.starts_with('{') {
        return None;
    }
    if text.chars().count() > MAX_ERROR_TEXT {
        let cut: String = text.chars().take(MAX_ERROR_TEXT - 1).collect();
        Some(format!("{cut}\u{2026}"))
    } else {
        Some(text.to_string())
    }
}

/// `reqwest` puts the useful part ("connection refused") in the source chain.
fn error_chain(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        let s = inner.to_string();
        if !msg.contains(&s) {
            msg.push_str(": ");
            msg.push_str(&s);
        }
        source = std::error::Error::source(inner);
    }
    msg
}
