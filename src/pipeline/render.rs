//! Rendering: turn a diagram source into something a user can look at.
//!
//! Layout and drawing belong to Mermaid itself, which runs in the browser.
//! This stage checks that the source names a diagram type Mermaid knows,
//! then wraps it in the requested [`OutputFormat`]:
//!
//! * `html` — a standalone page with a `<pre class="mermaid">` block and a
//!   module script that loads Mermaid 11 and renders on load
//! * `markdown` — a fenced block for viewers with Mermaid support
//! * `raw` — the source itself
//!
//! The [`DiagramRenderer`] trait is the seam: the session only needs
//! `render(&source)`, so a UI can plug in its own display target.

use crate::config::{ClientConfig, OutputFormat, DEFAULT_MERMAID_CDN};
use crate::error::DiagramError;
use crate::model::{DiagramSource, RenderedDiagram};
use crate::pipeline::detect;
use tracing::debug;

/// Something that can display a diagram source.
pub trait DiagramRenderer: Send + Sync {
    /// Render the source, or fail with [`DiagramError::Render`].
    fn render(&self, source: &DiagramSource) -> Result<RenderedDiagram, DiagramError>;
}

/// Mermaid renderer producing HTML, Markdown or raw output.
#[derive(Debug, Clone)]
pub struct MermaidRenderer {
    format: OutputFormat,
    mermaid_cdn: String,
    title: String,
}

impl Default for MermaidRenderer {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

impl MermaidRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            mermaid_cdn: DEFAULT_MERMAID_CDN.to_string(),
            title: "Diagram".to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            format: config.output_format,
            mermaid_cdn: config.mermaid_cdn.clone(),
            title: "Diagram".to_string(),
        }
    }

    /// Page title used by HTML output.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

impl DiagramRenderer for MermaidRenderer {
    fn render(&self, source: &DiagramSource) -> Result<RenderedDiagram, DiagramError> {
        let kind = detect::detect_kind(source.as_str())?;
        debug!("Rendering {} ({} chars) as {:?}", kind, source.len(), self.format);

        let content = match self.format {
            OutputFormat::Html => html_page(source.as_str(), &self.title, &self.mermaid_cdn),
            OutputFormat::Markdown => markdown_block(source.as_str()),
            OutputFormat::Raw => raw_source(source.as_str()),
        };

        Ok(RenderedDiagram {
            kind,
            format: self.format,
            source: source.clone(),
            content,
        })
    }
}

fn html_page(source: &str, title: &str, mermaid_cdn: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
</head>
<body>
  <pre class="mermaid">
{source}
  </pre>

  <script type="module">
    import mermaid from '{cdn}';
    mermaid.initialize({{ startOnLoad: true }});
  </script>
</body>
</html>
"#,
        title = escape_html(title),
        source = escape_html(source.trim_end()),
        cdn = mermaid_cdn.replace('\'', "%27"),
    )
}

fn markdown_block(source: &str) -> String {
    format!("```mermaid\n{}\n```\n", source.trim_end())
}

fn raw_source(source: &str) -> String {
    if source.ends_with('\n') {
        source.to_string()
    } else {
        format!("{source}\n")
    }
}

/// Escape text for an HTML text node. Mermaid reads the `<pre>` block's
/// `textContent`, so entities come back as the original characters.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
