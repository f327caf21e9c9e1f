//! Placement tables describing where each value goes on a template.
//!
//! Layouts are plain data so they can be recalibrated against a new
//! template revision without touching code (see `forms::registry`).

use serde::{Deserialize, Serialize};

use super::font::FontWeight;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Fill color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Single,
    Multiline { max_width: f32, line_height: f32 },
    /// Boolean field drawn as one of two words. `default` is drawn when the
    /// value is missing; without it nothing is drawn.
    Flag {
        yes: String,
        no: String,
        #[serde(default)]
        default: Option<bool>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPlacement {
    pub name: String,
    #[serde(default)]
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    #[serde(default)]
    pub weight: FontWeight,
    #[serde(default)]
    pub kind: FieldKind,
}

impl FieldPlacement {
    pub fn single(name: &str, page: usize, x: f32, y: f32, size: f32) -> Self {
        Self {
            name: name.to_string(),
            page,
            x,
            y,
            size,
            weight: FontWeight::Regular,
            kind: FieldKind::Single,
        }
    }

    pub fn multiline(
        name: &str,
        page: usize,
        x: f32,
        y: f32,
        size: f32,
        max_width: f32,
        line_height: f32,
    ) -> Self {
        Self {
            kind: FieldKind::Multiline { max_width, line_height },
            ..Self::single(name, page, x, y, size)
        }
    }

    pub fn flag(name: &str, page: usize, x: f32, y: f32, size: f32, yes: &str, no: &str) -> Self {
        Self {
            kind: FieldKind::Flag {
                yes: yes.to_string(),
                no: no.to_string(),
                default: None,
            },
            ..Self::single(name, page, x, y, size)
        }
    }

    /// Value a flag falls back to when the form leaves it unset.
    pub fn defaulting_to(mut self, value: bool) -> Self {
        if let FieldKind::Flag { default, .. } = &mut self.kind {
            *default = Some(value);
        }
        self
    }

    pub fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignaturePlacement {
    pub slot: String,
    #[serde(default)]
    pub page: usize,
    pub rect: Rect,
}

impl SignaturePlacement {
    pub fn new(slot: &str, page: usize, rect: Rect) -> Self {
        Self {
            slot: slot.to_string(),
            page,
            rect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LabelLayout {
    #[default]
    Stacked,
    /// Pairs flow left to right and wrap at `x + max_width`.
    Inline { gap: f32, max_width: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledEntry {
    pub label: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub keyword: String,
    pub color: Rgb,
}

/// A group of "Label: Value" pairs fed from form values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledBlock {
    #[serde(default)]
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub line_height: f32,
    #[serde(default)]
    pub layout: LabelLayout,
    pub entries: Vec<LabeledEntry>,
    #[serde(default)]
    pub background: Option<Rgb>,
    #[serde(default)]
    pub highlight: Option<Highlight>,
    #[serde(default = "default_padding")]
    pub padding: f32,
}

fn default_padding() -> f32 {
    2.0
}

/// Everything the renderer needs to fill one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormLayout {
    pub template: String,
    pub page_count: usize,
    #[serde(default)]
    pub fields: Vec<FieldPlacement>,
    #[serde(default)]
    pub blocks: Vec<LabeledBlock>,
    #[serde(default)]
    pub signatures: Vec<SignaturePlacement>,
}

impl FormLayout {
    pub fn field(&self, name: &str) -> Option<&FieldPlacement> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn signature_slots(&self) -> impl Iterator<Item = &str> {
        self.signatures.iter().map(|s| s.slot.as_str())
    }

    /// Pages referenced by any placement that do not exist in the layout's
    /// own page count.
    pub fn check_pages(&self) -> Result<(), (usize, usize)> {
        let pages = self
            .fields
            .iter()
            .map(|f| f.page)
            .chain(self.blocks.iter().map(|b| b.page))
            .chain(self.signatures.iter().map(|s| s.page));
        for page in pages {
            if page >= self.page_count {
                return Err((page, self.page_count));
            }
        }
        Ok(())
    }
}
