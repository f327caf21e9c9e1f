//! In-memory overlay on top of a loaded template.
//!
//! Drawing calls only queue content operations per page. `into_bytes` wires
//! fonts and images into each touched page's resources, appends the queued
//! operations as a new content stream and serializes the whole document.
//! The original page content is wrapped in `q`/`Q` so its graphics state
//! cannot leak into the overlay.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::font::{encode_win_ansi, FontWeight};
use super::layout::{Rect, Rgb};
use super::sanitize::sanitize_for_win_ansi;
use super::RenderError;

const MAX_INHERITANCE_DEPTH: usize = 32;

/// An image XObject registered in the document, drawable on any page.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    name: String,
    id: ObjectId,
}

#[derive(Default)]
struct PageOverlay {
    operations: Vec<Operation>,
    images: Vec<ImageHandle>,
}

pub struct OverlayDocument {
    doc: Document,
    pages: Vec<ObjectId>,
    overlays: Vec<PageOverlay>,
    image_count: usize,
}

impl OverlayDocument {
    /// Parses template bytes and checks the page count the layout expects.
    pub fn load(bytes: &[u8], expected_pages: usize) -> Result<Self, RenderError> {
        let doc = Document::load_mem(bytes).map_err(|e| RenderError::TemplateLoad(e.to_string()))?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.len() != expected_pages {
            return Err(RenderError::TemplateLoad(format!(
                "expected {} page(s), found {}",
                expected_pages,
                pages.len()
            )));
        }
        let overlays = pages.iter().map(|_| PageOverlay::default()).collect();
        Ok(Self {
            doc,
            pages,
            overlays,
            image_count: 0,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn overlay_mut(&mut self, page: usize) -> Result<&mut PageOverlay, RenderError> {
        let pages = self.pages.len();
        self.overlays
            .get_mut(page)
            .ok_or(RenderError::PageOutOfRange { page, pages })
    }

    /// Draws one run of text with its baseline starting at (x, y).
    pub fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
    ) -> Result<(), RenderError> {
        let overlay = self.overlay_mut(page)?;
        let clean = sanitize_for_win_ansi(text);
        if clean.is_empty() {
            return Ok(());
        }
        overlay.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(weight.resource_name().as_bytes().to_vec()), size.into()],
            ),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(&clean), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
        Ok(())
    }

    pub fn fill_rect(&mut self, page: usize, rect: Rect, color: Rgb) -> Result<(), RenderError> {
        let overlay = self.overlay_mut(page)?;
        overlay.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![color.r.into(), color.g.into(), color.b.into()]),
            Operation::new(
                "re",
                vec![rect.x.into(), rect.y.into(), rect.width.into(), rect.height.into()],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    /// Registers an 8-bit RGB image with an optional soft mask. Both sample
    /// buffers must already be zlib compressed.
    pub fn add_image(
        &mut self,
        width: u32,
        height: u32,
        rgb_deflated: Vec<u8>,
        alpha_deflated: Option<Vec<u8>>,
    ) -> ImageHandle {
        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        if let Some(alpha) = alpha_deflated {
            let smask_id = self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                alpha,
            ));
            image_dict.set("SMask", Object::Reference(smask_id));
        }
        let id = self.doc.add_object(Stream::new(image_dict, rgb_deflated));
        let name = format!("DfImg{}", self.image_count);
        self.image_count += 1;
        ImageHandle { name, id }
    }

    /// Draws a registered image stretched to fill `rect`.
    pub fn draw_image(&mut self, page: usize, image: &ImageHandle, rect: Rect) -> Result<(), RenderError> {
        let overlay = self.overlay_mut(page)?;
        overlay.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    rect.width.into(),
                    0.into(),
                    0.into(),
                    rect.height.into(),
                    rect.x.into(),
                    rect.y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image.name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        if !overlay.images.iter().any(|i| i.name == image.name) {
            overlay.images.push(image.clone());
        }
        Ok(())
    }

    /// Number of operations queued for a page, mostly useful to callers
    /// that want to know whether anything will be drawn.
    pub fn queued_operations(&self, page: usize) -> usize {
        self.overlays.get(page).map_or(0, |o| o.operations.len())
    }

    pub fn into_bytes(mut self) -> Result<Vec<u8>, RenderError> {
        let touched: Vec<usize> = (0..self.pages.len())
            .filter(|&i| !self.overlays[i].operations.is_empty())
            .collect();

        if !touched.is_empty() {
            let regular = self.add_font(FontWeight::Regular);
            let bold = self.add_font(FontWeight::Bold);
            for index in touched {
                let overlay = std::mem::take(&mut self.overlays[index]);
                self.apply_overlay(self.pages[index], overlay, regular, bold)?;
            }
        }

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| RenderError::Serialize(e.to_string()))?;
        Ok(out)
    }

    fn add_font(&mut self, weight: FontWeight) -> ObjectId {
        self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => weight.base_font(),
            "Encoding" => "WinAnsiEncoding",
        })
    }

    fn apply_overlay(
        &mut self,
        page_id: ObjectId,
        overlay: PageOverlay,
        regular: ObjectId,
        bold: ObjectId,
    ) -> Result<(), RenderError> {
        let mut resources = self.inherited_resources(page_id);

        let mut fonts = self.sub_dictionary(&resources, b"Font");
        fonts.set(FontWeight::Regular.resource_name(), Object::Reference(regular));
        fonts.set(FontWeight::Bold.resource_name(), Object::Reference(bold));
        resources.set("Font", Object::Dictionary(fonts));

        if !overlay.images.is_empty() {
            let mut xobjects = self.sub_dictionary(&resources, b"XObject");
            for image in &overlay.images {
                xobjects.set(image.name.as_bytes().to_vec(), Object::Reference(image.id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
        }

        let existing = self.existing_contents(page_id);
        let mut operations = Vec::with_capacity(overlay.operations.len() + 2);
        if !existing.is_empty() {
            operations.push(Operation::new("Q", vec![]));
        }
        operations.push(Operation::new("g", vec![0.into()]));
        operations.extend(overlay.operations);

        let encoded = Content { operations }
            .encode()
            .map_err(|e| RenderError::Serialize(e.to_string()))?;
        let overlay_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        if !existing.is_empty() {
            let save_id = self.doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
            contents.push(Object::Reference(save_id));
            contents.extend(existing);
        }
        contents.push(Object::Reference(overlay_id));

        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| RenderError::Serialize(e.to_string()))?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Resources of a page, following `Parent` links when the page inherits
    /// them. Always returns a detached copy.
    fn inherited_resources(&self, page_id: ObjectId) -> Dictionary {
        let mut current = Some(page_id);
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let Some(id) = current else { break };
            let Ok(node) = self.doc.get_dictionary(id) else { break };
            if let Ok(resources) = node.get(b"Resources") {
                return self.resolve_dictionary(resources).unwrap_or_default();
            }
            current = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
        Dictionary::new()
    }

    fn sub_dictionary(&self, resources: &Dictionary, key: &[u8]) -> Dictionary {
        resources
            .get(key)
            .ok()
            .and_then(|obj| self.resolve_dictionary(obj))
            .unwrap_or_default()
    }

    fn resolve_dictionary(&self, obj: &Object) -> Option<Dictionary> {
        match obj {
            Object::Dictionary(dict) => Some(dict.clone()),
            Object::Reference(id) => self.doc.get_dictionary(*id).ok().cloned(),
            _ => None,
        }
    }

    fn existing_contents(&self, page_id: ObjectId) -> Vec<Object> {
        let Ok(page) = self.doc.get_dictionary(page_id) else {
            return Vec::new();
        };
        match page.get(b"Contents") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                Ok(_) => vec![Object::Reference(*id)],
                Err(_) => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}
