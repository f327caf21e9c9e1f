//! PDF overlay engine.
//!
//! Fills fixed-layout templates by drawing text and signature images on top
//! of the existing page content:
//! - `sanitize` - maps text onto the WinAnsi repertoire
//! - `font` - Helvetica metrics and encoding
//! - `canvas` - lopdf document wrapper collecting per-page overlays
//! - `wrap` - greedy multi-line renderer
//! - `labeled` - "Label: Value" pairs, stacked or inline
//! - `stamp` - PNG signature stamping
//! - `layout` / `values` - placement tables and the values they consume
//! - `engine` - the render orchestrator
//! - `templates` - template byte sources

pub mod canvas;
pub mod engine;
pub mod font;
pub mod labeled;
pub mod layout;
pub mod sanitize;
pub mod stamp;
pub mod templates;
pub mod values;
pub mod wrap;

pub use canvas::OverlayDocument;
pub use engine::FormRenderer;
pub use font::FontWeight;
pub use layout::{
    FieldKind, FieldPlacement, FormLayout, Highlight, LabelLayout, LabeledBlock, LabeledEntry, Rect, Rgb,
    SignaturePlacement,
};
pub use sanitize::sanitize_for_win_ansi;
pub use templates::{FsTemplateSource, TemplateSource};
pub use values::{FieldValue, FormValues, SignatureSet, SignatureSlot};

use thiserror::Error;

/// Errors raised while turning a template into a filled document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load template: {0}")]
    TemplateLoad(String),
    #[error("failed to decode signature image: {0}")]
    ImageDecode(String),
    #[error("page {page} is out of range, template has {pages} page(s)")]
    PageOutOfRange { page: usize, pages: usize },
    #[error("failed to serialize document: {0}")]
    Serialize(String),
}

/// A filled PDF ready to be previewed, downloaded or attached.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: String,
    pub pdf: Vec<u8>,
}
