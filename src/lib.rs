//! # blockdiagram
//!
//! Turn a piece of text or a PDF into a Mermaid diagram by way of a
//! diagram-generation backend, and get it back in a form you can look at.
//!
//! The backend does the heavy lifting (PDF text extraction, summarisation, a
//! model call that writes Mermaid). This crate is the client side: one request
//! per submission, one diagram source out of the JSON answer, one render call.
//!
//! ## Flow
//!
//! ```text
//! text / PDF
//!  │
//!  ├─ 1. Input    validate text; load the PDF from disk or a URL
//!  ├─ 2. Request  POST /api/process-text (JSON) or /api/process-pdf (multipart)
//!  ├─ 3. Extract  mermaid_code, else raw_mermaid
//!  ├─ 4. Detect   recognise the diagram type from its header line
//!  └─ 5. Render   HTML page / Markdown block / raw source
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockdiagram::{generate_from_text, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Backend URL from BLOCKDIAGRAM_BACKEND_URL, else http://localhost:5000
//!     let config = ClientConfig::from_env()?;
//!     let output = generate_from_text("Alice meets Bob. Bob leaves.", &config).await?;
//!     std::fs::write("diagram.html", &output.rendered.content)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Interactive use
//!
//! A UI that lets the user resubmit keeps one [`DiagramSession`]. Every
//! submission gets a request id and only the newest one may update the
//! displayed result, whatever order the responses come back in.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `blockdiagram` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod submit;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{DiagramBackend, DiagramClient};
pub use config::{ClientConfig, ClientConfigBuilder, OutputFormat};
pub use error::{DiagramError, ErrorKind};
pub use model::{
    DiagramKind, DiagramRequest, DiagramResponse, DiagramSource, DiagramStats, HealthStatus,
    InputMode, PdfUpload, RenderedDiagram,
};
pub use pipeline::render::{DiagramRenderer, MermaidRenderer};
pub use progress::{NoopObserver, ObserverHandle, SubmissionObserver};
pub use session::{
    DiagramSession, RequestToken, SessionFailure, SessionState, SessionStatus, SubmitOutcome,
};
pub use submit::{
    generate, generate_from_pdf, generate_from_text, generate_sync, write_output, DiagramOutput,
};
