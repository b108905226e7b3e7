//! Request and response types exchanged with the diagram backend.

use crate::config::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which endpoint a submission goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Text,
    Pdf,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Text => f.write_str("text"),
            InputMode::Pdf => f.write_str("pdf"),
        }
    }
}

/// A PDF ready to be uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfUpload {
    /// File name sent in the multipart part. Always ends in `.pdf`.
    pub file_name: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    /// Wrap in-memory PDF bytes. A name without a `.pdf` extension gets one
    /// appended, since the backend refuses anything else.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mut file_name: String = file_name.into();
        if file_name.trim().is_empty() {
            file_name = "document.pdf".to_string();
        } else if !file_name.to_lowercase().ends_with(".pdf") {
            file_name.push_str(".pdf");
        }
        Self { file_name, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for PdfUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// One submission: either text or a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramRequest {
    Text(String),
    Pdf(PdfUpload),
}

impl DiagramRequest {
    pub fn mode(&self) -> InputMode {
        match self {
            DiagramRequest::Text(_) => InputMode::Text,
            DiagramRequest::Pdf(_) => InputMode::Pdf,
        }
    }
}

/// JSON body of the text endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct TextPayload<'a> {
    pub text: &'a str,
}

/// Success body of both processing endpoints.
///
/// Only the two diagram keys matter; the rest is carried along for
/// `--json` output and is allowed to be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Display-ready source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mermaid_code: Option<String>,
    /// Source as produced by the model, before the backend's display cleanup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_mermaid: Option<String>,
    /// Structured summary the diagram was generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<DiagramStats>,
}

/// Length statistics reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramStats {
    #[serde(default)]
    pub text_length: Option<u64>,
    #[serde(default)]
    pub summary_length: Option<u64>,
    #[serde(default)]
    pub mermaid_length: Option<u64>,
}

/// Error body the backend sends with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Mermaid source extracted from a backend response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagramSource(String);

impl DiagramSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DiagramSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DiagramSource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Mermaid diagram families, keyed by their header keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    State,
    EntityRelationship,
    Gantt,
    Pie,
    Journey,
    GitGraph,
    Mindmap,
    Timeline,
    QuadrantChart,
    Requirement,
    C4,
    Sankey,
    XyChart,
    Block,
    Packet,
    Kanban,
    Architecture,
    Radar,
    Treemap,
    Info,
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Sequence => "sequence diagram",
            DiagramKind::Class => "class diagram",
            DiagramKind::State => "state diagram",
            DiagramKind::EntityRelationship => "ER diagram",
            DiagramKind::Gantt => "gantt chart",
            DiagramKind::Pie => "pie chart",
            DiagramKind::Journey => "user journey",
            DiagramKind::GitGraph => "git graph",
            DiagramKind::Mindmap => "mindmap",
            DiagramKind::Timeline => "timeline",
            DiagramKind::QuadrantChart => "quadrant chart",
            DiagramKind::Requirement => "requirement diagram",
            DiagramKind::C4 => "C4 diagram",
            DiagramKind::Sankey => "sankey diagram",
            DiagramKind::XyChart => "XY chart",
            DiagramKind::Block => "block diagram",
            DiagramKind::Packet => "packet diagram",
            DiagramKind::Kanban => "kanban board",
            DiagramKind::Architecture => "architecture diagram",
            DiagramKind::Radar => "radar chart",
            DiagramKind::Treemap => "treemap",
            DiagramKind::Info => "info",
        };
        f.write_str(s)
    }
}

/// A diagram ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDiagram {
    pub kind: DiagramKind,
    pub format: OutputFormat,
    /// The source that was rendered.
    pub source: DiagramSource,
    /// Rendered artefact (HTML page, Markdown block or raw source).
    pub content: String,
}
