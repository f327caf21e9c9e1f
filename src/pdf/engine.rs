//! Render orchestrator.
//!
//! One generic pass over a `FormLayout`: every field placement, then every
//! labeled block, then every signature slot. Variants differ only in the
//! layout they pass in.

use super::canvas::OverlayDocument;
use super::labeled::draw_labeled_block;
use super::layout::{FieldKind, FieldPlacement, FormLayout};
use super::stamp::stamp_png;
use super::values::{FormValues, SignatureSet};
use super::wrap::draw_wrapped;
use super::RenderError;

/// Stateless renderer for placement tables.
pub struct FormRenderer;

impl FormRenderer {
    /// Fills `template` according to `layout` and returns the new document.
    ///
    /// Missing values draw nothing. An absent signature leaves its rectangle
    /// untouched.
    pub fn render(
        template: &[u8],
        layout: &FormLayout,
        values: &FormValues,
        signatures: &SignatureSet,
    ) -> Result<Vec<u8>, RenderError> {
        layout.check_pages().map_err(|(page, pages)| {
            RenderError::TemplateLoad(format!(
                "layout for {} places content on page {} but declares {} page(s)",
                layout.template, page, pages
            ))
        })?;

        let mut canvas = OverlayDocument::load(template, layout.page_count)?;

        for field in &layout.fields {
            Self::draw_field(&mut canvas, field, values)?;
        }

        for block in &layout.blocks {
            draw_labeled_block(&mut canvas, block, values)?;
        }

        for placement in &layout.signatures {
            stamp_png(
                &mut canvas,
                placement.page,
                signatures.get(&placement.slot).png(),
                placement.rect,
            )?;
        }

        for slot in signatures.captured_slots() {
            if !layout.signatures.iter().any(|p| p.slot == slot) {
                log::warn!("signature '{}' has no placement in {}", slot, layout.template);
            }
        }

        let pdf = canvas.into_bytes()?;
        log::debug!(
            "rendered {} ({} values, {} bytes)",
            layout.template,
            values.len(),
            pdf.len()
        );
        Ok(pdf)
    }

    fn draw_field(
        canvas: &mut OverlayDocument,
        field: &FieldPlacement,
        values: &FormValues,
    ) -> Result<(), RenderError> {
        match &field.kind {
            FieldKind::Single => {
                let text = values.text(&field.name);
                if text.trim().is_empty() {
                    return Ok(());
                }
                canvas.draw_text(field.page, &text, field.x, field.y, field.size, field.weight)
            }
            FieldKind::Multiline { max_width, line_height } => {
                let text = values.text(&field.name);
                if text.trim().is_empty() {
                    return Ok(());
                }
                draw_wrapped(
                    canvas,
                    field.page,
                    &text,
                    field.x,
                    field.y,
                    field.size,
                    field.weight,
                    *max_width,
                    *line_height,
                )
                .map(|_| ())
            }
            FieldKind::Flag { yes, no, default } => match values.flag(&field.name).or(*default) {
                Some(true) => canvas.draw_text(field.page, yes, field.x, field.y, field.size, field.weight),
                Some(false) => canvas.draw_text(field.page, no, field.x, field.y, field.size, field.weight),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::layout::{FieldPlacement, Rect, SignaturePlacement};
    use lopdf::content::Content;
    use lopdf::{dictionary, Document, Object, Stream};

    fn template(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET\n".to_vec()));
                Object::Reference(doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                    "Contents" => content_id,
                }))
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn shown_strings(pdf: &[u8], page: usize) -> Vec<Vec<u8>> {
        let doc = Document::load_mem(pdf).unwrap();
        let page_id = *doc.get_pages().values().nth(page).unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        content
            .operations
            .into_iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands.first().and_then(|o| o.as_str().ok()).map(|s| s.to_vec()))
            .collect()
    }

    fn layout() -> FormLayout {
        FormLayout {
            template: "test.pdf".into(),
            page_count: 1,
            fields: vec![
                FieldPlacement::single("nome", 0, 10.0, 800.0, 11.0),
                FieldPlacement::multiline("note", 0, 10.0, 700.0, 11.0, 100.0, 13.0),
                FieldPlacement::flag("lead", 0, 10.0, 600.0, 11.0, "SI", "NO"),
            ],
            blocks: vec![],
            signatures: vec![SignaturePlacement::new("firma", 0, Rect::new(0.0, 0.0, 10.0, 10.0))],
        }
    }

    #[test]
    fn test_empty_values_draw_nothing() {
        let pdf = FormRenderer::render(&template(1), &layout(), &FormValues::new(), &SignatureSet::new())
            .unwrap();
        assert!(shown_strings(&pdf, 0).is_empty());
    }

    #[test]
    fn test_unset_flag_uses_default() {
        let mut layout = layout();
        layout.fields[2] = FieldPlacement::flag("lead", 0, 10.0, 600.0, 11.0, "SI", "NO").defaulting_to(false);
        let pdf = FormRenderer::render(&template(1), &layout, &FormValues::new(), &SignatureSet::new()).unwrap();
        assert_eq!(shown_strings(&pdf, 0), vec![b"NO".to_vec()]);

        let mut values = FormValues::new();
        values.insert_flag("lead", true);
        let pdf = FormRenderer::render(&template(1), &layout, &values, &SignatureSet::new()).unwrap();
        assert_eq!(shown_strings(&pdf, 0), vec![b"SI".to_vec()]);
    }

    #[test]
    fn test_fields_and_flags() {
        let mut values = FormValues::new();
        values.insert_text("nome", "Acme Srl");
        values.insert_text("note", "one two three four five six seven eight nine ten");
        values.insert_flag("lead", false);
        let pdf = FormRenderer::render(&template(1), &layout(), &values, &SignatureSet::new()).unwrap();
        let strings = shown_strings(&pdf, 0);
        assert_eq!(
            strings,
            vec![
                b"Acme Srl".to_vec(),
                b"one two three four".to_vec(),
                b"five six seven eight".to_vec(),
                b"nine ten".to_vec(),
                b"NO".to_vec(),
            ]
        );
    }

    #[test]
    fn test_layout_page_beyond_count_is_template_error() {
        let mut bad = layout();
        bad.fields.push(FieldPlacement::single("x", 3, 0.0, 0.0, 9.0));
        let err = FormRenderer::render(&template(1), &bad, &FormValues::new(), &SignatureSet::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::TemplateLoad(_)));
    }

    #[test]
    fn test_invalid_signature_fails() {
        let mut signatures = SignatureSet::new();
        signatures.capture("firma", b"garbage".to_vec());
        let err = FormRenderer::render(&template(1), &layout(), &FormValues::new(), &signatures)
            .unwrap_err();
        assert!(matches!(err, RenderError::ImageDecode(_)));
    }
}
