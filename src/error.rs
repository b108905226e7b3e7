//! Error types for the blockdiagram library.
//!
//! A single enum, [`DiagramError`], covers every way a submission can fail.
//! Callers that only care about the broad category (to pick a message style
//! or an exit code) use [`DiagramError::kind`]:
//!
//! * [`ErrorKind::Network`] — the request never got an HTTP answer.
//! * [`ErrorKind::Server`] — the backend answered with a non-2xx status.
//! * [`ErrorKind::MalformedResponse`] — 2xx, but no diagram source in the body.
//! * [`ErrorKind::Render`] — the returned source is not a recognisable diagram.
//!
//! Every error is terminal for the submission that produced it. Nothing in
//! this crate retries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the blockdiagram library.
#[derive(Debug, Error)]
pub enum DiagramError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Text submission was empty or whitespace-only.
    #[error("Nothing to submit: the text is empty")]
    EmptyText,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The backend could not be reached (connection refused, DNS, TLS, reset).
    #[error("Could not reach the backend at '{endpoint}': {reason}\nIs the backend running?")]
    Network { endpoint: String, reason: String },

    /// The backend did not answer within the request timeout.
    #[error("Request to '{endpoint}' timed out after {secs}s\nIncrease --timeout.")]
    Timeout { endpoint: String, secs: u64 },

    /// No connection could be set up within the connect timeout.
    #[error("Connecting to '{endpoint}' timed out after {secs}s\nIs the backend running? Otherwise increase --connect-timeout.")]
    ConnectTimeout { endpoint: String, secs: u64 },

    // ── Backend errors ────────────────────────────────────────────────────
    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}{}", display_message(.message))]
    Server { status: u16, message: Option<String> },

    /// The backend refused the uploaded file type.
    #[error("Backend rejected the file (HTTP {status}){}", display_message(.message))]
    UnsupportedFile { status: u16, message: Option<String> },

    /// A success response carried no usable diagram source.
    #[error("Unexpected response from the backend: {detail}")]
    MalformedResponse { detail: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The diagram source is not valid diagram syntax.
    ///
    /// `source_code` keeps the raw text the backend returned so it can be
    /// shown next to the message.
    #[error("Could not render diagram: {detail}")]
    Render { source_code: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_message(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {m}"),
        _ => String::new(),
    }
}

/// Broad category of a [`DiagramError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Input,
    Network,
    Server,
    MalformedResponse,
    Render,
    Output,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Input => "input error",
            ErrorKind::Network => "network error",
            ErrorKind::Server => "server error",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::Render => "render error",
            ErrorKind::Output => "output error",
            ErrorKind::Config => "configuration error",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(s)
    }
}

impl DiagramError {
    /// The broad category this error belongs to.
    ///
    /// `UnsupportedFile` is a flavour of server error: the backend answered,
    /// it just refused the payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiagramError::EmptyText
            | DiagramError::FileNotFound { .. }
            | DiagramError::PermissionDenied { .. }
            | DiagramError::InvalidInput { .. }
            | DiagramError::DownloadFailed { .. }
            | DiagramError::DownloadTimeout { .. }
            | DiagramError::NotAPdf { .. } => ErrorKind::Input,
            DiagramError::Network { .. }
            | DiagramError::Timeout { .. }
            | DiagramError::ConnectTimeout { .. } => ErrorKind::Network,
            DiagramError::Server { .. } | DiagramError::UnsupportedFile { .. } => {
                ErrorKind::Server
            }
            DiagramError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            DiagramError::Render { .. } => ErrorKind::Render,
            DiagramError::OutputWriteFailed { .. } => ErrorKind::Output,
            DiagramError::InvalidConfig(_) => ErrorKind::Config,
            DiagramError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status for backend errors, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            DiagramError::Server { status, .. } | DiagramError::UnsupportedFile { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// The diagram source attached to a render error.
    pub fn source_code(&self) -> Option<&str> {
        match self {
            DiagramError::Render { source_code, .. } => Some(source_code),
            _ => None,
        }
    }
}
