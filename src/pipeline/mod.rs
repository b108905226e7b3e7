//! Pipeline stages between user input and a displayed diagram.
//!
//! Each submodule implements exactly one step, so each is testable on its own
//! and the HTTP layer in [`crate::client`] stays free of parsing details.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ (backend) ──▶ extract ──▶ postprocess ──▶ detect ──▶ render
//! (text/PDF)  (HTTP)       (JSON)      (fences)        (header)   (html/md)
//! ```
//!
//! 1. [`input`]       — validate text; load a PDF from disk or a URL
//! 2. [`extract`]     — pick `mermaid_code`, else `raw_mermaid`, from the body
//! 3. [`postprocess`] — strip wrapper artefacts the model may have left
//! 4. [`detect`]      — recognise the Mermaid diagram type from its header
//! 5. [`render`]      — wrap the source for display

pub mod detect;
pub mod extract;
pub mod input;
pub mod postprocess;
pub mod render;
