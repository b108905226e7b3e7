//! Diagram type detection.
//!
//! Mermaid picks a parser from the first meaningful line of the source. We do
//! the same lookup before handing the source to the renderer, so text that no
//! Mermaid parser would accept (a model apology, an HTML error page, prose)
//! fails here with the source attached instead of as a blank page later.
//!
//! Front matter, `%%{init: ...}%%` directives and `%%` comments are stripped
//! first, the way Mermaid's own detector does.

use crate::error::DiagramError;
use crate::model::DiagramKind;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_FRONTMATTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^-{3}\s*[\n\r](.*?)[\n\r]-{3}\s*[\n\r]+").unwrap());

static RE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)%%\{.*?\}%%").unwrap());

static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*%%.*$").unwrap());

/// Header patterns, checked in order. The order matters where one keyword is
/// a prefix of another.
static DETECTORS: Lazy<Vec<(Regex, DiagramKind)>> = Lazy::new(|| {
    [
        (r"^(?:flowchart-elk|flowchart|graph)\b", DiagramKind::Flowchart),
        (r"^sequenceDiagram\b", DiagramKind::Sequence),
        (r"^classDiagram(?:-v2)?\b", DiagramKind::Class),
        (r"^stateDiagram(?:-v2)?\b", DiagramKind::State),
        (r"^erDiagram\b", DiagramKind::EntityRelationship),
        (r"^gantt\b", DiagramKind::Gantt),
        (r"^pie\b", DiagramKind::Pie),
        (r"^journey\b", DiagramKind::Journey),
        (r"^gitGraph\b", DiagramKind::GitGraph),
        (r"^mindmap\b", DiagramKind::Mindmap),
        (r"^timeline\b", DiagramKind::Timeline),
        (r"^quadrantChart\b", DiagramKind::QuadrantChart),
        (r"^requirementDiagram\b", DiagramKind::Requirement),
        (
            r"^C4(?:Context|Container|Component|Dynamic|Deployment)\b",
            DiagramKind::C4,
        ),
        (r"^sankey(?:-beta)?\b", DiagramKind::Sankey),
        (r"^xychart(?:-beta)?\b", DiagramKind::XyChart),
        (r"^block(?:-beta)?\b", DiagramKind::Block),
        (r"^packet(?:-beta)?\b", DiagramKind::Packet),
        (r"^kanban\b", DiagramKind::Kanban),
        (r"^architecture(?:-beta)?\b", DiagramKind::Architecture),
        (r"^radar(?:-beta)?\b", DiagramKind::Radar),
        (r"^treemap(?:-beta)?\b", DiagramKind::Treemap),
        (r"^info\b", DiagramKind::Info),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(pattern).unwrap(), kind))
    .collect()
});

/// Remove front matter, directives and comments.
pub fn strip_preamble(source: &str) -> String {
    let s = RE_FRONTMATTER.replace(source, "");
    let s = RE_DIRECTIVE.replace_all(&s, "");
    RE_COMMENT.replace_all(&s, "").into_owned()
}

/// First non-blank line after the preamble, trimmed.
pub fn header_line(source: &str) -> Option<String> {
    strip_preamble(source)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(String::from)
}

/// Detect the diagram type, or fail with a render error carrying the source.
pub fn detect_kind(source: &str) -> Result<DiagramKind, DiagramError> {
    let Some(header) = header_line(source) else {
        return Err(DiagramError::Render {
            source_code: source.to_string(),
            detail: "diagram source is empty".into(),
        });
    };

    DETECTORS
        .iter()
        .find(|(re, _)| re.is_match(&header))
        .map(|(_, kind)| *kind)
        .ok_or_else(|| DiagramError::Render {
            source_code: source.to_string(),
            detail: format!("no diagram type detected in first line {header:?}"),
        })
}
