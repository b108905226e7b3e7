//! Pull the diagram source out of a backend response.
//!
//! The backend sends the diagram twice: `mermaid_code` (what its own HTML
//! page displayed) and `raw_mermaid` (the model output before that step).
//! Either one is enough. When both are present `mermaid_code` wins.
//!
//! A key only counts as present when it holds a string with something other
//! than whitespace or zero-width characters in it; `null` and `""` fall
//! through to the next key.

use crate::error::DiagramError;
use crate::model::{DiagramResponse, DiagramSource};
use crate::pipeline::postprocess;
use tracing::debug;

/// Keys checked in order.
pub const SOURCE_KEYS: [&str; 2] = ["mermaid_code", "raw_mermaid"];

/// Extract the authoritative diagram source.
pub fn extract_source(response: &DiagramResponse) -> Result<DiagramSource, DiagramError> {
    [&response.mermaid_code, &response.raw_mermaid]
        .into_iter()
        .flatten()
        .find(|s| !postprocess::is_blank(s))
        .map(|s| DiagramSource::new(s.as_str()))
        .ok_or_else(|| DiagramError::MalformedResponse {
            detail: format!("neither {} is present", SOURCE_KEYS.join(" nor ")),
        })
}

/// Extract the source and strip wrapper artefacts, ready for the renderer.
pub fn display_source(response: &DiagramResponse) -> Result<DiagramSource, DiagramError> {
    let source = extract_source(response)?;
    let cleaned = postprocess::clean_source(source.as_str());
    if cleaned.len() != source.len() {
        debug!(
            "Post-processing trimmed diagram source from {} to {} bytes",
            source.len(),
            cleaned.len()
        );
    }
    Ok(DiagramSource::new(cleaned))
}

/// Decode a success body without looking for the diagram keys yet.
pub fn decode_body(body: &[u8]) -> Result<DiagramResponse, DiagramError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| DiagramError::MalformedResponse {
            detail: format!("body is not JSON ({e})"),
        })?;
    if !value.is_object() {
        return Err(DiagramError::MalformedResponse {
            detail: "body is not a JSON object".into(),
        });
    }
    serde_json::from_value(value).map_err(|e| DiagramError::MalformedResponse {
        detail: format!("unexpected field type ({e})"),
    })
}
