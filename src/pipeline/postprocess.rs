//! Post-processing: strip wrapper artefacts from the diagram source.
//!
//! The backend already removes Markdown fences from the model output, but
//! nothing stops an older backend (or a different model) from leaking a
//! ```` ```mermaid ```` wrapper, or a BOM or zero-width characters in front of
//! the header that make the Mermaid parser choke on an otherwise valid first
//! line. These rules only ever remove wrappers; a source without them comes
//! back byte-for-byte. Invisible characters after the first visible one are
//! content (emoji use U+200D as a joiner) and are never touched.
//!
//! ## Rule Order
//!
//! Leading invisible characters go first so a BOM in front of the fence does
//! not hide it from rule 2.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to a diagram source.
///
/// Rules (applied in order):
/// 1. Strip invisible Unicode (BOM, zero-width spaces/joiners, word joiner)
///    in front of the first visible character
/// 2. Strip an outer ```` ``` ```` / ```` ```mermaid ```` fence
pub fn clean_source(input: &str) -> String {
    let s = strip_leading_invisible(input);
    strip_outer_fence(&s)
}

/// True when nothing but whitespace is left after cleaning.
pub fn is_blank(input: &str) -> bool {
    input
        .chars()
        .all(|c| c.is_whitespace() || INVISIBLE.contains(&c))
}

// ── Rule 1: Strip leading invisible Unicode ──────────────────────────────────

const INVISIBLE: [char; 5] = ['\u{FEFF}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}'];

fn strip_leading_invisible(input: &str) -> String {
    let body_start = input
        .char_indices()
        .find(|(_, c)| !c.is_whitespace() && !INVISIBLE.contains(c))
        .map_or(input.len(), |(i, _)| i);
    let (head, body) = input.split_at(body_start);
    if !head.contains(INVISIBLE) {
        return input.to_string();
    }

    let mut out: String = head.chars().filter(|c| !INVISIBLE.contains(c)).collect();
    out.push_str(body);
    out
}

// ── Rule 2: Strip outer fence ────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[ \t]*(?:mermaid)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCE.captures(input.trim()) {
        caps[1].trim().to_string()
    } else {
        input.to_string()
    }
}
